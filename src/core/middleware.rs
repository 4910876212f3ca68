use crate::core::error::AppError;
use crate::features::auth::JwtAuth;
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::request_id::{MakeRequestId, RequestId};
use tracing::Span;
use uuid::Uuid;

/// Request ID generator using UUID v7 (time-ordered)
#[derive(Clone, Copy)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string();
        Some(RequestId::new(HeaderValue::from_str(&id).unwrap()))
    }
}

/// Custom MakeSpan that includes request_id in the tracing span
#[derive(Clone, Debug)]
pub struct MakeSpanWithRequestId;

impl<B> tower_http::trace::MakeSpan<B> for MakeSpanWithRequestId {
    fn make_span(&mut self, request: &axum::http::Request<B>) -> Span {
        let request_id = request
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-");

        tracing::info_span!(
            "request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = %request_id,
        )
    }
}

pub fn cors_layer(allowed_origins: Vec<String>) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    // If origins list contains "*", allow any origin
    if allowed_origins.iter().any(|o| o == "*") {
        cors.allow_origin(Any)
    } else {
        // Parse origins into HeaderValue
        let origins: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        cors.allow_origin(AllowOrigin::list(origins))
    }
}

pub async fn auth_middleware(
    State(jwt): State<Arc<JwtAuth>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    // Extract Authorization header
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing authorization header".to_string()))?;

    // Validate Bearer format
    if !auth_header.starts_with("Bearer ") {
        return Err(AppError::Unauthorized(
            "Invalid authorization header format".to_string(),
        ));
    }

    let token = &auth_header[7..]; // Skip "Bearer "

    // Decode and verify signature and expiry
    let claims = jwt.validate_token(token)?;

    // Insert token claims into request extensions for handlers to read
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::auth::model::TokenClaims;
    use axum::{http::StatusCode, routing::get, Router};
    use axum_test::TestServer;
    use std::time::Duration;

    async fn whoami(claims: TokenClaims) -> String {
        claims.user_id.to_string()
    }

    fn protected_router(jwt: Arc<JwtAuth>) -> Router {
        Router::new()
            .route("/whoami", get(whoami))
            .route_layer(axum::middleware::from_fn_with_state(jwt, auth_middleware))
    }

    fn test_jwt() -> Arc<JwtAuth> {
        Arc::new(JwtAuth::new(
            "test-secret",
            Duration::from_secs(3600),
            Duration::from_secs(0),
        ))
    }

    #[tokio::test]
    async fn request_without_token_is_unauthorized() {
        let server = TestServer::new(protected_router(test_jwt())).unwrap();

        let response = server.get("/whoami").await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        let body: serde_json::Value = response.json();
        assert_eq!(body["detail"], "Missing authorization header");
    }

    #[tokio::test]
    async fn request_with_malformed_header_is_unauthorized() {
        let server = TestServer::new(protected_router(test_jwt())).unwrap();

        let response = server
            .get("/whoami")
            .add_header(header::AUTHORIZATION, "Token abc")
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        let body: serde_json::Value = response.json();
        assert_eq!(body["detail"], "Invalid authorization header format");
    }

    #[tokio::test]
    async fn request_with_garbage_token_is_unauthorized() {
        let server = TestServer::new(protected_router(test_jwt())).unwrap();

        let response = server
            .get("/whoami")
            .authorization_bearer("not-a-jwt")
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn request_with_valid_token_reaches_handler() {
        let jwt = test_jwt();
        let token = jwt.create_token(7).unwrap();
        let server = TestServer::new(protected_router(jwt)).unwrap();

        let response = server.get("/whoami").authorization_bearer(&token).await;

        response.assert_status_ok();
        response.assert_text("7");
    }

    #[tokio::test]
    async fn request_with_expired_token_is_unauthorized() {
        let jwt = test_jwt();
        let claims = TokenClaims {
            uid: "test-uid".to_string(),
            exp: chrono::Utc::now().timestamp() - 7200,
            user_id: 7,
        };
        let token = jsonwebtoken::encode(
            &jsonwebtoken::Header::new(jsonwebtoken::Algorithm::HS256),
            &claims,
            &jsonwebtoken::EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();
        let server = TestServer::new(protected_router(jwt)).unwrap();

        let response = server.get("/whoami").authorization_bearer(&token).await;

        response.assert_status(StatusCode::UNAUTHORIZED);
    }
}
