use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Request DTO carrying account credentials, used by save_code and login
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct UserLoginDto {
    /// Numeric account id of the user
    #[schema(example = 123456789i64)]
    pub username: i64,

    #[validate(length(min = 1, message = "Code is required"))]
    pub code: String,
}

/// Request DTO identifying a user by account id
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserIdDto {
    /// Numeric account id of the user
    #[schema(example = 123456789i64)]
    pub username: i64,
}

/// Response DTO for a successful login
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenResponseDto {
    /// JWT access token
    pub access_token: String,
}

/// Response DTO for a pairing code lookup
///
/// The code is an empty string when no user exists for the account id.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CodeResponseDto {
    pub code: String,
}

/// Confirmation message returned by save_code
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponseDto {
    pub message: String,
}
