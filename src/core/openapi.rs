use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::auth::{self, dtos as auth_dtos};
use crate::features::files::{dtos as files_dtos, handlers as files_handlers};
use crate::shared::types::ErrorBody;

#[derive(OpenApi)]
#[openapi(
    paths(
        // Auth
        auth::handlers::save_code,
        auth::handlers::get_code,
        auth::handlers::login,
        auth::handlers::info,
        // Files
        files_handlers::upload_file,
        files_handlers::get_files,
        files_handlers::download_file,
        files_handlers::fill_queue,
        // Calendar drill-down
        files_handlers::get_calendar,
    ),
    components(
        schemas(
            // Shared
            ErrorBody,
            // Auth
            auth::model::TokenClaims,
            auth_dtos::UserLoginDto,
            auth_dtos::UserIdDto,
            auth_dtos::TokenResponseDto,
            auth_dtos::CodeResponseDto,
            auth_dtos::MessageResponseDto,
            // Files
            files_dtos::UploadFileDto,
            files_dtos::FileResponseDto,
            files_dtos::FillQueueResponseDto,
        )
    ),
    tags(
        (name = "auth", description = "Pairing codes, login, and token introspection"),
        (name = "file", description = "Photo upload, listing, and download"),
        (name = "filter", description = "Upload calendar drill-down"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "PhotoVault API",
        version = "0.1.0",
        description = "API documentation for PhotoVault",
    )
)]
pub struct ApiDoc;

/// Adds Bearer JWT security scheme to OpenAPI spec
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
