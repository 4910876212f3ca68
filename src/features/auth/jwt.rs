use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use super::model::TokenClaims;
use crate::core::error::AppError;

/// Signs and validates HS256 access tokens
pub struct JwtAuth {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_ttl: Duration,
    leeway: u64,
}

impl JwtAuth {
    pub fn new(secret: &str, token_ttl: Duration, leeway: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            token_ttl,
            leeway: leeway.as_secs(),
        }
    }

    /// Issue a fresh token for the given user
    pub fn create_token(&self, user_id: i32) -> Result<String, AppError> {
        let claims = TokenClaims {
            uid: Uuid::new_v4().simple().to_string(),
            exp: Utc::now().timestamp() + self.token_ttl.as_secs() as i64,
            user_id,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to sign token: {}", e)))
    }

    /// Decode a token, checking signature and expiry
    pub fn validate_token(&self, token: &str) -> Result<TokenClaims, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = self.leeway;

        let token_data = decode::<TokenClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fake::Fake;

    fn auth() -> JwtAuth {
        JwtAuth::new(
            "test-secret",
            Duration::from_secs(3600),
            Duration::from_secs(0),
        )
    }

    #[test]
    fn token_round_trips_claims() {
        let jwt = auth();
        let user_id: i32 = (1..100_000).fake();
        let token = jwt.create_token(user_id).expect("token should be signed");
        let claims = jwt.validate_token(&token).expect("token should validate");

        assert_eq!(claims.user_id, user_id);
        assert_eq!(claims.uid.len(), 32);
        assert!(claims.exp > Utc::now().timestamp());
    }

    #[test]
    fn expired_token_is_rejected() {
        let jwt = auth();
        let claims = TokenClaims {
            uid: "0".repeat(32),
            exp: Utc::now().timestamp() - 7200,
            user_id: 1,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .expect("token should be signed");

        assert!(jwt.validate_token(&token).is_err());
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let jwt = auth();
        let other = JwtAuth::new(
            "other-secret",
            Duration::from_secs(3600),
            Duration::from_secs(0),
        );
        let token = other.create_token(1).expect("token should be signed");

        assert!(jwt.validate_token(&token).is_err());
    }

    #[test]
    fn garbage_token_is_rejected() {
        assert!(auth().validate_token("not-a-token").is_err());
    }
}
