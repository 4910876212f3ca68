#[cfg(test)]
use crate::features::auth::model::TokenClaims;

#[cfg(test)]
use axum::{extract::Request, middleware::Next, Router};

#[cfg(test)]
#[allow(dead_code)]
pub fn create_test_claims(user_id: i32) -> TokenClaims {
    TokenClaims {
        uid: "test-uid".to_string(),
        exp: chrono::Utc::now().timestamp() + 3600,
        user_id,
    }
}

/// Wraps a router with a middleware that injects token claims for `user_id`,
/// standing in for the bearer-auth middleware in router tests.
#[cfg(test)]
#[allow(dead_code)]
pub fn with_test_auth(router: Router, user_id: i32) -> Router {
    router.layer(axum::middleware::from_fn(
        move |mut request: Request, next: Next| async move {
            request.extensions_mut().insert(create_test_claims(user_id));
            next.run(request).await
        },
    ))
}
