//! Storage module for file management
//!
//! Provides a MinIO/S3-compatible storage client for per-user
//! photo buckets.

mod minio_client;

pub use minio_client::MinIOClient;
