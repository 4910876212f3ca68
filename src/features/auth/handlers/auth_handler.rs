use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::auth::dtos::{
    CodeResponseDto, MessageResponseDto, TokenResponseDto, UserIdDto, UserLoginDto,
};
use crate::features::auth::model::TokenClaims;
use crate::features::auth::services::AuthService;
use crate::shared::types::ErrorBody;
use axum::{extract::State, Json};
use std::sync::Arc;
use validator::Validate;

/// Store the pairing code for an account
///
/// Creates the user on first contact and declares their notification queue.
#[utoipa::path(
    post,
    path = "/save_code",
    request_body = UserLoginDto,
    responses(
        (status = 200, description = "Code saved successfully", body = MessageResponseDto),
        (status = 400, description = "Validation error", body = ErrorBody)
    ),
    tag = "auth"
)]
pub async fn save_code(
    State(service): State<Arc<AuthService>>,
    AppJson(dto): AppJson<UserLoginDto>,
) -> Result<Json<MessageResponseDto>> {
    dto.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    service.save_code(dto.username, &dto.code).await?;
    Ok(Json(MessageResponseDto {
        message: "Code saved successfully".to_string(),
    }))
}

/// Look up the pairing code for an account
#[utoipa::path(
    post,
    path = "/get_code",
    request_body = UserIdDto,
    responses(
        (status = 200, description = "Pairing code, empty when the account is unknown", body = CodeResponseDto)
    ),
    tag = "auth"
)]
pub async fn get_code(
    State(service): State<Arc<AuthService>>,
    AppJson(dto): AppJson<UserIdDto>,
) -> Result<Json<CodeResponseDto>> {
    let code = service.get_code(dto.username).await?;
    Ok(Json(CodeResponseDto { code }))
}

/// Exchange account id and pairing code for an access token
#[utoipa::path(
    post,
    path = "/login",
    request_body = UserLoginDto,
    responses(
        (status = 200, description = "Login successful", body = TokenResponseDto),
        (status = 400, description = "Validation error", body = ErrorBody),
        (status = 401, description = "Invalid credentials", body = ErrorBody)
    ),
    tag = "auth"
)]
pub async fn login(
    State(service): State<Arc<AuthService>>,
    AppJson(dto): AppJson<UserLoginDto>,
) -> Result<Json<TokenResponseDto>> {
    dto.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let access_token = service.login(dto.username, &dto.code).await?;
    Ok(Json(TokenResponseDto { access_token }))
}

/// Echo the claims of the presented token
#[utoipa::path(
    post,
    path = "/info",
    responses(
        (status = 200, description = "Decoded token claims", body = TokenClaims),
        (status = 401, description = "Authentication required", body = ErrorBody)
    ),
    tag = "auth",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn info(claims: TokenClaims) -> Json<TokenClaims> {
    Json(claims)
}
