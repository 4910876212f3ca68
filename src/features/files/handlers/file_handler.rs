use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tracing::debug;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::AppQuery;
use crate::features::auth::model::TokenClaims;
use crate::features::files::dtos::{
    CalendarFilterQuery, FileFilterQuery, FileResponseDto, FillQueueResponseDto, UploadFileDto,
};
use crate::features::files::services::FileService;
use crate::shared::types::ErrorBody;

/// Upload a photo
///
/// Accepts multipart/form-data with the binary content under the `file`
/// field. The object lands in the caller's bucket keyed by today's date
/// and the original filename.
#[utoipa::path(
    post,
    path = "/upload",
    tag = "file",
    request_body(
        content = UploadFileDto,
        content_type = "multipart/form-data",
        description = "Multipart form carrying the photo in the `file` field",
    ),
    responses(
        (status = 201, description = "File uploaded successfully", body = FileResponseDto),
        (status = 400, description = "Empty or malformed upload", body = ErrorBody),
        (status = 401, description = "Authentication required", body = ErrorBody),
        (status = 500, description = "Storage error", body = ErrorBody)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn upload_file(
    claims: TokenClaims,
    State(service): State<Arc<FileService>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<FileResponseDto>)> {
    let mut file_data: Option<Vec<u8>> = None;
    let mut file_name: Option<String> = None;
    let mut content_type: Option<String> = None;

    // Process multipart fields
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        debug!("Failed to read multipart field: {}", e);
        AppError::BadRequest(format!("Failed to read multipart data: {}", e))
    })? {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "file" => {
                let ct = field
                    .content_type()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "application/octet-stream".to_string());

                let fname = field
                    .file_name()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "unnamed".to_string());

                let data = field.bytes().await.map_err(|e| {
                    debug!("Failed to read file bytes: {}", e);
                    AppError::BadRequest(format!("Failed to read file data: {}", e))
                })?;

                file_data = Some(data.to_vec());
                file_name = Some(fname);
                content_type = Some(ct);
            }
            _ => {
                // Ignore unknown fields
                debug!("Ignoring unknown field: {}", field_name);
            }
        }
    }

    let file_data =
        file_data.ok_or_else(|| AppError::BadRequest("File is required".to_string()))?;
    let file_name =
        file_name.ok_or_else(|| AppError::BadRequest("Filename is required".to_string()))?;
    let content_type =
        content_type.ok_or_else(|| AppError::BadRequest("Content type is required".to_string()))?;

    // Empty payloads never reach the object store
    if file_data.is_empty() {
        return Err(AppError::BadRequest("Uploaded file is empty".to_string()));
    }

    let response = service
        .upload_file(claims.user_id, file_data, &file_name, &content_type)
        .await?;

    Ok((StatusCode::CREATED, Json(response)))
}

/// List the caller's files matching the supplied filters
#[utoipa::path(
    get,
    path = "/file",
    tag = "file",
    params(FileFilterQuery),
    responses(
        (status = 200, description = "Matching file records", body = [FileResponseDto]),
        (status = 400, description = "Malformed filter values", body = ErrorBody),
        (status = 401, description = "Authentication required", body = ErrorBody),
        (status = 404, description = "No files matched the filters", body = ErrorBody)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_files(
    claims: TokenClaims,
    State(service): State<Arc<FileService>>,
    AppQuery(filter): AppQuery<FileFilterQuery>,
) -> Result<Json<Vec<FileResponseDto>>> {
    filter
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let files = service.find_files(claims.user_id, &filter).await?;
    Ok(Json(files))
}

/// Download a file by id
///
/// The lookup is scoped to the caller, so another user's file id yields 404.
#[utoipa::path(
    get,
    path = "/download/{file_id}",
    tag = "file",
    params(
        ("file_id" = i32, Path, description = "Id of the file to download")
    ),
    responses(
        (status = 200, description = "File content", content_type = "application/octet-stream"),
        (status = 401, description = "Authentication required", body = ErrorBody),
        (status = 404, description = "File not found", body = ErrorBody),
        (status = 500, description = "Storage error", body = ErrorBody)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn download_file(
    claims: TokenClaims,
    State(service): State<Arc<FileService>>,
    Path(file_id): Path<i32>,
) -> Result<Response> {
    let (file, data) = service.download_file(claims.user_id, file_id).await?;

    let headers = [
        (header::CONTENT_TYPE, file.file_type),
        (header::CONTENT_DISPOSITION, content_disposition(&file.file_name)),
    ];

    Ok((headers, data).into_response())
}

/// Attachment header value with the filename percent-encoded, as non-ASCII
/// names are not valid in a raw header
fn content_disposition(file_name: &str) -> String {
    format!("attachment; filename=\"{}\"", urlencoding::encode(file_name))
}

/// Drill down the caller's upload calendar
///
/// Without params returns the years with uploads; with `year` the months;
/// with `year` and `month` the days.
#[utoipa::path(
    get,
    path = "/filter",
    tag = "filter",
    params(CalendarFilterQuery),
    responses(
        (status = 200, description = "Distinct years, months, or days", body = [i32]),
        (status = 400, description = "Malformed filter values", body = ErrorBody),
        (status = 401, description = "Authentication required", body = ErrorBody),
        (status = 404, description = "Nothing found", body = ErrorBody)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_calendar(
    claims: TokenClaims,
    State(service): State<Arc<FileService>>,
    AppQuery(filter): AppQuery<CalendarFilterQuery>,
) -> Result<Json<Vec<i32>>> {
    filter
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let values = service.calendar(claims.user_id, &filter).await?;
    Ok(Json(values))
}

/// Publish one notification per stored file
#[utoipa::path(
    post,
    path = "/fill_queue",
    tag = "file",
    responses(
        (status = 200, description = "All file notifications published", body = FillQueueResponseDto),
        (status = 500, description = "Queue error", body = ErrorBody)
    )
)]
pub async fn fill_queue(
    State(service): State<Arc<FileService>>,
) -> Result<Json<FillQueueResponseDto>> {
    service.fill_queue().await?;

    Ok(Json(FillQueueResponseDto {
        status: "success".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_disposition_keeps_ascii_names_readable() {
        assert_eq!(
            content_disposition("photo.jpg"),
            "attachment; filename=\"photo.jpg\""
        );
    }

    #[test]
    fn content_disposition_percent_encodes_non_ascii_names() {
        let value = content_disposition("фото.jpg");

        assert!(value.starts_with("attachment; filename=\""));
        assert!(!value.contains("фото"));
        assert!(value.contains("%D1%84%D0%BE%D1%82%D0%BE.jpg"));
        assert!(value.is_ascii());
    }
}
