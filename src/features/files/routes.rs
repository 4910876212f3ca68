use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::features::files::handlers::{
    download_file, fill_queue, get_calendar, get_files, upload_file,
};
use crate::features::files::services::FileService;

/// Create the file routes that sit behind the JWT middleware
pub fn routes(file_service: Arc<FileService>, max_body_size: usize) -> Router {
    Router::new()
        .route(
            "/upload",
            // Allow body size up to the configured limit + buffer for multipart overhead
            post(upload_file).layer(DefaultBodyLimit::max(max_body_size + 1024 * 1024)),
        )
        .route("/file", get(get_files))
        .route("/download/{file_id}", get(download_file))
        .route("/filter", get(get_calendar))
        .with_state(file_service)
}

/// Create the file routes reachable without authentication
pub fn public_routes(file_service: Arc<FileService>) -> Router {
    Router::new()
        .route("/fill_queue", post(fill_queue))
        .with_state(file_service)
}
