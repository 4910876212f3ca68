use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Claims carried by an access token
///
/// Inserted into request extensions by the auth middleware and read back
/// by handlers through the `FromRequestParts` impl in `core::extractor`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TokenClaims {
    /// Opaque token identity, a hex-encoded random UUID
    pub uid: String,
    /// Expiry as seconds since the Unix epoch
    pub exp: i64,
    /// Internal id of the authenticated user
    pub user_id: i32,
}
