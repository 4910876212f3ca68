use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::features::files::models::File;

/// Upload file request DTO for OpenAPI documentation
/// Note: This struct is for Swagger UI documentation only.
/// The actual handler uses axum's Multipart extractor directly.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct UploadFileDto {
    /// The photo to upload
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub file: String,
}

/// Response DTO for file metadata
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FileResponseDto {
    /// Unique identifier for the file
    pub id: i32,
    /// Owner of the file
    pub user_id: i32,
    /// Original filename as uploaded
    pub file_name: String,
    /// Object key inside the owner's bucket
    pub file_path: String,
    /// MIME type of the file
    pub file_type: String,
    /// Size of the file in bytes
    pub file_size: i64,
    /// Date the file was uploaded
    pub upload_date: NaiveDate,
}

impl From<File> for FileResponseDto {
    fn from(file: File) -> Self {
        Self {
            id: file.id,
            user_id: file.user_id,
            file_name: file.file_name,
            file_path: file.file_path,
            file_type: file.file_type,
            file_size: file.file_size,
            upload_date: file.upload_date,
        }
    }
}

/// Query params for listing files
///
/// All supplied filters are AND-ed; absent filters are not applied.
#[derive(Debug, Clone, Deserialize, Validate, IntoParams)]
pub struct FileFilterQuery {
    /// Filter by upload year
    pub year: Option<i32>,
    /// Filter by upload month (1-12)
    #[validate(range(min = 1, max = 12, message = "month must be between 1 and 12"))]
    #[param(minimum = 1, maximum = 12)]
    pub month: Option<u32>,
    /// Filter by upload day (1-31)
    #[validate(range(min = 1, max = 31, message = "day must be between 1 and 31"))]
    #[param(minimum = 1, maximum = 31)]
    pub day: Option<u32>,
    /// Filter by file id
    pub file_id: Option<i32>,
    /// Filter by exact filename
    pub file_name: Option<String>,
}

/// Query params for the calendar drill-down
///
/// No params lists years, `year` lists months, `year`+`month` lists days.
#[derive(Debug, Clone, Deserialize, Validate, IntoParams)]
pub struct CalendarFilterQuery {
    /// Year to drill into
    pub year: Option<i32>,
    /// Month to drill into (1-12), requires `year`
    #[validate(range(min = 1, max = 12, message = "month must be between 1 and 12"))]
    #[param(minimum = 1, maximum = 12)]
    pub month: Option<u32>,
}

/// Response DTO for the queue fill operation
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FillQueueResponseDto {
    #[schema(example = "success")]
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_accepts_in_range_calendar_fields() {
        let filter = FileFilterQuery {
            year: Some(2024),
            month: Some(12),
            day: Some(31),
            file_id: None,
            file_name: None,
        };
        assert!(filter.validate().is_ok());
    }

    #[test]
    fn filter_rejects_out_of_range_month_and_day() {
        let filter = FileFilterQuery {
            year: Some(2024),
            month: Some(13),
            day: None,
            file_id: None,
            file_name: None,
        };
        assert!(filter.validate().is_err());

        let filter = FileFilterQuery {
            year: Some(2024),
            month: None,
            day: Some(32),
            file_id: None,
            file_name: None,
        };
        assert!(filter.validate().is_err());
    }

    #[test]
    fn calendar_filter_rejects_out_of_range_month() {
        let filter = CalendarFilterQuery {
            year: Some(2024),
            month: Some(0),
        };
        assert!(filter.validate().is_err());
    }
}
