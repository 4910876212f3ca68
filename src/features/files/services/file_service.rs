use chrono::Utc;
use futures::TryStreamExt;
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::sync::Arc;
use tracing::info;

use crate::core::error::{AppError, Result};
use crate::core::metrics::Metrics;
use crate::features::files::dtos::{CalendarFilterQuery, FileFilterQuery, FileResponseDto};
use crate::features::files::models::File;
use crate::modules::queue::RabbitClient;
use crate::modules::storage::MinIOClient;

const SELECT_FILE_COLUMNS: &str =
    "SELECT id, user_id, file_name, file_path, file_type, file_size, upload_date FROM files";

/// Service for file operations
pub struct FileService {
    pool: PgPool,
    storage: Arc<MinIOClient>,
    rabbit: Arc<RabbitClient>,
    metrics: Arc<Metrics>,
}

impl FileService {
    pub fn new(
        pool: PgPool,
        storage: Arc<MinIOClient>,
        rabbit: Arc<RabbitClient>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            pool,
            storage,
            rabbit,
            metrics,
        }
    }

    /// Upload a file to the user's bucket and record its metadata
    ///
    /// The object is written before the row is inserted; a crash in between
    /// leaves an orphaned object with no row, which is accepted. Re-uploading
    /// the same filename on the same day overwrites the object
    /// (last-write-wins) and still inserts a second row.
    ///
    /// # Returns
    /// The created metadata record
    pub async fn upload_file(
        &self,
        user_id: i32,
        data: Vec<u8>,
        file_name: &str,
        content_type: &str,
    ) -> Result<FileResponseDto> {
        let file_name = sanitize_file_name(file_name)?;
        let file_size = data.len() as i64;
        let upload_date = Utc::now().date_naive();
        let file_path = MinIOClient::object_key(upload_date, file_name);

        self.metrics
            .time_integration("minio_create_bucket", self.storage.ensure_user_bucket(user_id))
            .await?;

        self.metrics
            .time_integration(
                "minio_put_object",
                self.storage.upload(user_id, &file_path, &data, content_type),
            )
            .await?;

        let file = self
            .metrics
            .time_integration(
                "db_insert_file",
                sqlx::query_as::<_, File>(
                    "INSERT INTO files (user_id, file_name, file_path, file_type, file_size, upload_date) \
                     VALUES ($1, $2, $3, $4, $5, $6) \
                     RETURNING id, user_id, file_name, file_path, file_type, file_size, upload_date",
                )
                .bind(user_id)
                .bind(file_name)
                .bind(&file_path)
                .bind(content_type)
                .bind(file_size)
                .bind(upload_date)
                .fetch_one(&self.pool),
            )
            .await?;

        info!(
            "File metadata saved: id={}, path={}, size={}",
            file.id, file.file_path, file.file_size
        );

        Ok(file.into())
    }

    /// List the user's files matching the supplied filters
    ///
    /// Zero matches is reported as `NotFound`, never as an empty list.
    pub async fn find_files(
        &self,
        user_id: i32,
        filter: &FileFilterQuery,
    ) -> Result<Vec<FileResponseDto>> {
        let mut query = files_query(user_id, filter);

        let files: Vec<File> = self
            .metrics
            .time_integration("db_select_files", query.build_query_as().fetch_all(&self.pool))
            .await?;

        if files.is_empty() {
            return Err(AppError::NotFound(
                "No files found for the given filters".to_string(),
            ));
        }

        Ok(files.into_iter().map(Into::into).collect())
    }

    /// Fetch a file row scoped to its owner together with its content
    ///
    /// A file id belonging to another user is indistinguishable from a
    /// missing one.
    pub async fn download_file(&self, user_id: i32, file_id: i32) -> Result<(File, Vec<u8>)> {
        let file = self
            .metrics
            .time_integration(
                "db_select_file",
                sqlx::query_as::<_, File>(&format!(
                    "{} WHERE user_id = $1 AND id = $2",
                    SELECT_FILE_COLUMNS
                ))
                .bind(user_id)
                .bind(file_id)
                .fetch_optional(&self.pool),
            )
            .await?
            .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

        let data = self
            .metrics
            .time_integration(
                "minio_get_object",
                self.storage.download(user_id, &file.file_path),
            )
            .await?;

        Ok((file, data))
    }

    /// Publish one notification per file row, in randomized order
    pub async fn fill_queue(&self) -> Result<()> {
        let mut ids = sqlx::query_scalar::<_, i32>("SELECT id FROM files ORDER BY RANDOM()")
            .fetch(&self.pool);

        let mut published = 0u64;
        while let Some(file_id) = ids.try_next().await? {
            self.metrics
                .time_integration("rabbit_publish", self.rabbit.publish_file_notification(file_id))
                .await?;
            published += 1;
        }

        info!("Published {} file notifications", published);
        Ok(())
    }

    /// Calendar drill-down over the user's upload dates
    ///
    /// No params lists distinct years, `year` lists months within it,
    /// `year`+`month` lists days. Empty results are reported as `NotFound`.
    pub async fn calendar(&self, user_id: i32, filter: &CalendarFilterQuery) -> Result<Vec<i32>> {
        let values: Vec<i32> = match (filter.year, filter.month) {
            (None, Some(_)) => {
                return Err(AppError::BadRequest(
                    "year is required when month is provided".to_string(),
                ))
            }
            (None, None) => {
                self.metrics
                    .time_integration(
                        "db_select_years",
                        sqlx::query_scalar::<_, i32>(
                            "SELECT DISTINCT EXTRACT(YEAR FROM upload_date)::int4 FROM files \
                             WHERE user_id = $1 ORDER BY 1",
                        )
                        .bind(user_id)
                        .fetch_all(&self.pool),
                    )
                    .await?
            }
            (Some(year), None) => {
                self.metrics
                    .time_integration(
                        "db_select_months",
                        sqlx::query_scalar::<_, i32>(
                            "SELECT DISTINCT EXTRACT(MONTH FROM upload_date)::int4 FROM files \
                             WHERE user_id = $1 AND EXTRACT(YEAR FROM upload_date) = $2 ORDER BY 1",
                        )
                        .bind(user_id)
                        .bind(year)
                        .fetch_all(&self.pool),
                    )
                    .await?
            }
            (Some(year), Some(month)) => {
                self.metrics
                    .time_integration(
                        "db_select_days",
                        sqlx::query_scalar::<_, i32>(
                            "SELECT DISTINCT EXTRACT(DAY FROM upload_date)::int4 FROM files \
                             WHERE user_id = $1 AND EXTRACT(YEAR FROM upload_date) = $2 \
                             AND EXTRACT(MONTH FROM upload_date) = $3 ORDER BY 1",
                        )
                        .bind(user_id)
                        .bind(year)
                        .bind(month as i32)
                        .fetch_all(&self.pool),
                    )
                    .await?
            }
        };

        if values.is_empty() {
            return Err(AppError::NotFound("Nothing found".to_string()));
        }

        Ok(values)
    }
}

/// Build the filtered SELECT for the user's files
///
/// Calendar fields match by EXTRACT on `upload_date`, not by range.
fn files_query(user_id: i32, filter: &FileFilterQuery) -> QueryBuilder<'static, Postgres> {
    let mut builder =
        QueryBuilder::<Postgres>::new(format!("{} WHERE user_id = ", SELECT_FILE_COLUMNS));
    builder.push_bind(user_id);

    if let Some(year) = filter.year {
        builder.push(" AND EXTRACT(YEAR FROM upload_date) = ");
        builder.push_bind(year);
    }
    if let Some(month) = filter.month {
        builder.push(" AND EXTRACT(MONTH FROM upload_date) = ");
        builder.push_bind(month as i32);
    }
    if let Some(day) = filter.day {
        builder.push(" AND EXTRACT(DAY FROM upload_date) = ");
        builder.push_bind(day as i32);
    }
    if let Some(file_id) = filter.file_id {
        builder.push(" AND id = ");
        builder.push_bind(file_id);
    }
    if let Some(file_name) = &filter.file_name {
        builder.push(" AND file_name = ");
        builder.push_bind(file_name.clone());
    }

    builder
}

/// Reject filenames that would escape the date prefix inside the bucket
fn sanitize_file_name(name: &str) -> Result<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("Filename is required".to_string()));
    }
    if name.contains('/') || name.contains('\\') || name.contains("..") {
        return Err(AppError::BadRequest("Invalid filename".to_string()));
    }
    if name.bytes().any(|b| b.is_ascii_control()) {
        return Err(AppError::BadRequest("Invalid filename".to_string()));
    }

    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_filter() -> FileFilterQuery {
        FileFilterQuery {
            year: None,
            month: None,
            day: None,
            file_id: None,
            file_name: None,
        }
    }

    #[test]
    fn files_query_without_filters_only_scopes_by_user() {
        let query = files_query(7, &empty_filter());
        let sql = query.sql();

        assert!(sql.contains("WHERE user_id = $1"));
        assert!(!sql.contains("EXTRACT"));
        assert!(!sql.contains("file_name ="));
    }

    #[test]
    fn files_query_adds_one_clause_per_supplied_filter() {
        let filter = FileFilterQuery {
            year: Some(2024),
            month: Some(3),
            day: Some(7),
            file_id: None,
            file_name: None,
        };
        let query = files_query(1, &filter);
        let sql = query.sql();

        assert!(sql.contains("EXTRACT(YEAR FROM upload_date) = $2"));
        assert!(sql.contains("EXTRACT(MONTH FROM upload_date) = $3"));
        assert!(sql.contains("EXTRACT(DAY FROM upload_date) = $4"));
        assert!(!sql.contains("id = $5"));
    }

    #[test]
    fn files_query_filters_by_id_and_name() {
        let filter = FileFilterQuery {
            file_id: Some(10),
            file_name: Some("image1.jpg".to_string()),
            ..empty_filter()
        };
        let query = files_query(1, &filter);
        let sql = query.sql();

        assert!(sql.contains("AND id = $2"));
        assert!(sql.contains("AND file_name = $3"));
    }

    #[test]
    fn sanitize_rejects_path_escapes() {
        assert!(sanitize_file_name("../../etc/passwd").is_err());
        assert!(sanitize_file_name("a/b.jpg").is_err());
        assert!(sanitize_file_name("a\\b.jpg").is_err());
        assert!(sanitize_file_name("").is_err());
        assert!(sanitize_file_name("   ").is_err());
    }

    #[test]
    fn sanitize_keeps_plain_names() {
        assert_eq!(
            sanitize_file_name("photo.jpg").expect("name should pass"),
            "photo.jpg"
        );
        assert_eq!(
            sanitize_file_name(" фото.jpg ").expect("name should pass"),
            "фото.jpg"
        );
    }
}
