use axum::{
    body::Body,
    extract::{
        rejection::{JsonRejection, QueryRejection},
        FromRequest, FromRequestParts, Query, Request,
    },
    http::request::Parts,
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;

use crate::core::error::AppError;
use crate::features::auth::model::TokenClaims;

/// Custom JSON extractor that provides consistent error responses
pub struct AppJson<T>(pub T);

impl<T, S> FromRequest<S> for AppJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppJsonRejection;

    async fn from_request(req: Request<Body>, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(value) => Ok(Self(value.0)),
            Err(rejection) => Err(AppJsonRejection(rejection)),
        }
    }
}

pub struct AppJsonRejection(JsonRejection);

impl IntoResponse for AppJsonRejection {
    fn into_response(self) -> Response {
        let message = match self.0 {
            JsonRejection::JsonDataError(err) => format!("Invalid JSON data: {}", err),
            JsonRejection::JsonSyntaxError(err) => format!("Invalid JSON syntax: {}", err),
            JsonRejection::MissingJsonContentType(err) => {
                format!("Missing JSON content type: {}", err)
            }
            _ => "Failed to parse JSON body".to_string(),
        };

        AppError::BadRequest(message).into_response()
    }
}

/// Custom query-string extractor matching the AppJson error shape
pub struct AppQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for AppQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppQueryRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(value) => Ok(Self(value.0)),
            Err(rejection) => Err(AppQueryRejection(rejection)),
        }
    }
}

pub struct AppQueryRejection(QueryRejection);

impl IntoResponse for AppQueryRejection {
    fn into_response(self) -> Response {
        let message = match self.0 {
            QueryRejection::FailedToDeserializeQueryString(err) => {
                format!("Invalid query parameters: {}", err)
            }
            _ => "Failed to parse query parameters".to_string(),
        };

        AppError::BadRequest(message).into_response()
    }
}

impl<S> FromRequestParts<S> for TokenClaims
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<TokenClaims>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::with_test_auth;
    use axum::{http::StatusCode, routing::get, Router};
    use axum_test::TestServer;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Paging {
        page: u32,
    }

    async fn read_page(AppQuery(paging): AppQuery<Paging>) -> String {
        paging.page.to_string()
    }

    async fn whoami(claims: TokenClaims) -> String {
        claims.user_id.to_string()
    }

    #[tokio::test]
    async fn app_query_parses_valid_values() {
        let server = TestServer::new(Router::new().route("/page", get(read_page))).unwrap();

        let response = server.get("/page").add_query_param("page", 3).await;

        response.assert_status_ok();
        response.assert_text("3");
    }

    #[tokio::test]
    async fn app_query_rejects_bad_values_with_detail() {
        let server = TestServer::new(Router::new().route("/page", get(read_page))).unwrap();

        let response = server.get("/page").add_query_param("page", "abc").await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        let detail = body["detail"].as_str().unwrap_or_default();
        assert!(detail.starts_with("Invalid query parameters"));
    }

    #[tokio::test]
    async fn claims_extractor_reads_injected_extension() {
        let router = with_test_auth(Router::new().route("/whoami", get(whoami)), 5);
        let server = TestServer::new(router).unwrap();

        let response = server.get("/whoami").await;

        response.assert_status_ok();
        response.assert_text("5");
    }

    #[tokio::test]
    async fn claims_extractor_without_middleware_is_unauthorized() {
        let server = TestServer::new(Router::new().route("/whoami", get(whoami))).unwrap();

        let response = server.get("/whoami").await;

        response.assert_status(StatusCode::UNAUTHORIZED);
    }
}
