use crate::core::error::{AppError, Result};
use crate::core::metrics::Metrics;
use crate::features::auth::models::User;
use crate::features::auth::JwtAuth;
use crate::modules::queue::RabbitClient;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::info;

/// Service for account pairing and login
pub struct AuthService {
    pool: PgPool,
    jwt: Arc<JwtAuth>,
    rabbit: Arc<RabbitClient>,
    metrics: Arc<Metrics>,
}

impl AuthService {
    pub fn new(
        pool: PgPool,
        jwt: Arc<JwtAuth>,
        rabbit: Arc<RabbitClient>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            pool,
            jwt,
            rabbit,
            metrics,
        }
    }

    /// Store the pairing code, creating the user row on first contact
    ///
    /// A repeated save for the same account overwrites the previous code.
    /// The user's notification queue is declared here so the fanout exchange
    /// reaches them from the first published message on.
    pub async fn save_code(&self, username: i64, code: &str) -> Result<()> {
        let user = self
            .metrics
            .time_integration(
                "db_upsert_user",
                sqlx::query_as::<_, User>(
                    "INSERT INTO users (username, code) VALUES ($1, $2) \
                     ON CONFLICT (username) DO UPDATE SET code = EXCLUDED.code \
                     RETURNING id, username, code",
                )
                .bind(username)
                .bind(code)
                .fetch_one(&self.pool),
            )
            .await?;

        self.metrics
            .time_integration(
                "rabbit_declare_queue",
                self.rabbit.declare_user_queue(user.id),
            )
            .await?;

        info!("Pairing code saved for user {}", user.id);
        Ok(())
    }

    /// Look up the pairing code; unknown accounts yield an empty string
    pub async fn get_code(&self, username: i64) -> Result<String> {
        let user = self.find_by_username(username).await?;

        Ok(user.map(|u| u.code).unwrap_or_default())
    }

    /// Verify the pairing code and issue an access token
    pub async fn login(&self, username: i64, code: &str) -> Result<String> {
        let user = self
            .find_by_username(username)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Invalid username or code".to_string()))?;

        if user.code != code {
            return Err(AppError::Unauthorized(
                "Invalid username or code".to_string(),
            ));
        }

        self.jwt.create_token(user.id)
    }

    async fn find_by_username(&self, username: i64) -> Result<Option<User>> {
        let user = self
            .metrics
            .time_integration(
                "db_select_user",
                sqlx::query_as::<_, User>(
                    "SELECT id, username, code FROM users WHERE username = $1",
                )
                .bind(username)
                .fetch_optional(&self.pool),
            )
            .await?;

        Ok(user)
    }
}
