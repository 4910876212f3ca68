//! MinIO/S3-compatible storage client
//!
//! Each user owns a dedicated bucket named `user-{id}`; objects inside it
//! are keyed by upload date and original filename (`2024-03-07/photo.jpg`).
//!
//! Uses rust-s3 crate for lightweight S3 operations.

use chrono::NaiveDate;
use s3::creds::Credentials;
use s3::{Bucket, BucketConfiguration, Region};
use tracing::{debug, info, warn};

use crate::core::config::MinIOConfig;
use crate::core::error::AppError;

/// MinIO/S3-compatible storage client scoped to per-user buckets
pub struct MinIOClient {
    region: Region,
    credentials: Credentials,
}

impl MinIOClient {
    /// Create a new MinIO client from configuration
    ///
    /// No bucket is touched here; a user's bucket is created on first upload
    /// via [`MinIOClient::ensure_user_bucket`].
    pub fn new(config: MinIOConfig) -> Result<Self, AppError> {
        let credentials = Credentials::new(
            Some(&config.access_key),
            Some(&config.secret_key),
            None,
            None,
            None,
        )
        .map_err(|e| AppError::Internal(format!("Failed to create MinIO credentials: {}", e)))?;

        let region = Region::Custom {
            region: config.region.clone(),
            endpoint: config.endpoint.clone(),
        };

        info!("MinIO client initialized for endpoint: {}", config.endpoint);

        Ok(Self {
            region,
            credentials,
        })
    }

    /// Bucket name owned by the given user
    pub fn bucket_name(user_id: i32) -> String {
        format!("user-{}", user_id)
    }

    /// Object key for a file uploaded on the given date
    pub fn object_key(upload_date: NaiveDate, file_name: &str) -> String {
        format!("{}/{}", upload_date.format("%Y-%m-%d"), file_name)
    }

    /// Handle to the user's bucket
    fn user_bucket(&self, user_id: i32) -> Result<Box<Bucket>, AppError> {
        let mut bucket = Bucket::new(
            &Self::bucket_name(user_id),
            self.region.clone(),
            self.credentials.clone(),
        )
        .map_err(|e| {
            AppError::Storage(format!("Failed to open bucket for user {}: {}", user_id, e))
        })?;

        // Use path-style URLs for MinIO (http://endpoint/bucket instead of http://bucket.endpoint)
        bucket.set_path_style();

        Ok(bucket)
    }

    /// Create the user's bucket if it does not exist yet
    ///
    /// Creation is attempted unconditionally; an already-existing bucket
    /// counts as success. There is no existence check beforehand.
    pub async fn ensure_user_bucket(&self, user_id: i32) -> Result<(), AppError> {
        let name = Self::bucket_name(user_id);

        match Bucket::create_with_path_style(
            &name,
            self.region.clone(),
            self.credentials.clone(),
            BucketConfiguration::default(),
        )
        .await
        {
            Ok(_) => {
                info!("Bucket '{}' created", name);
                Ok(())
            }
            Err(e) => {
                let error_str = e.to_string();
                // Bucket already exists - this is fine
                if error_str.contains("BucketAlreadyOwnedByYou")
                    || error_str.contains("BucketAlreadyExists")
                    || error_str.contains("already own it")
                {
                    debug!("Bucket '{}' already exists", name);
                } else {
                    // Log warning but don't fail - bucket might exist with a different error
                    warn!("Could not create bucket '{}': {}. Assuming it exists.", name, e);
                }
                Ok(())
            }
        }
    }

    /// Upload a file into the user's bucket
    ///
    /// # Arguments
    /// * `user_id` - Owner of the target bucket
    /// * `key` - The object key (path) in the bucket
    /// * `data` - The file content as bytes
    /// * `content_type` - The MIME type of the file
    pub async fn upload(
        &self,
        user_id: i32,
        key: &str,
        data: &[u8],
        content_type: &str,
    ) -> Result<(), AppError> {
        let bucket = self.user_bucket(user_id)?;

        bucket
            .put_object_with_content_type(key, data, content_type)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to upload file '{}': {}", key, e)))?;

        debug!("Uploaded file '{}' to bucket '{}'", key, bucket.name());
        Ok(())
    }

    /// Download a file from the user's bucket
    ///
    /// # Returns
    /// The file content as bytes
    pub async fn download(&self, user_id: i32, key: &str) -> Result<Vec<u8>, AppError> {
        let bucket = self.user_bucket(user_id)?;

        let response = bucket
            .get_object(key)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to download file '{}': {}", key, e)))?;

        debug!("Downloaded file '{}' from bucket '{}'", key, bucket.name());
        Ok(response.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_name_is_prefixed_with_user_id() {
        assert_eq!(MinIOClient::bucket_name(42), "user-42");
        assert_eq!(MinIOClient::bucket_name(1), "user-1");
    }

    #[test]
    fn object_key_zero_pads_the_date() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(MinIOClient::object_key(date, "photo.jpg"), "2024-03-07/photo.jpg");
    }
}
