use chrono::NaiveDate;
use sqlx::FromRow;

/// Database model for file metadata
///
/// Rows are immutable after creation; the binary content lives in the
/// owner's bucket under `file_path`.
#[derive(Debug, FromRow)]
pub struct File {
    pub id: i32,
    pub user_id: i32,
    pub file_name: String,
    /// Object key inside the user's bucket, `{YYYY-MM-DD}/{filename}`
    pub file_path: String,
    /// MIME type declared at upload
    pub file_type: String,
    pub file_size: i64,
    pub upload_date: NaiveDate,
}
