use sqlx::FromRow;

/// Database model for users
#[derive(Debug, FromRow)]
pub struct User {
    pub id: i32,
    /// Numeric account id the companion client authenticates with
    pub username: i64,
    /// Pairing code issued to that account
    pub code: String,
}
