//! Photo storage seam. Uploaded photos live in an S3-compatible bucket; the
//! rest of the service only sees the `PhotoStore` trait.

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::resume::model::PendingPhoto;

/// Folder persisted photos are stored under.
pub const PHOTO_FOLDER: &str = "resume_photos";

/// Carried in `AppState` as `Arc<dyn PhotoStore>`.
#[async_trait]
pub trait PhotoStore: Send + Sync {
    /// Uploads the photo and returns its public URL.
    async fn upload(&self, photo: &PendingPhoto) -> Result<String, AppError>;

    /// Deletes a photo previously returned by `upload`.
    async fn delete(&self, url: &str) -> Result<(), AppError>;
}

pub struct S3PhotoStore {
    client: aws_sdk_s3::Client,
    bucket: String,
    public_base_url: String,
}

impl S3PhotoStore {
    pub fn new(client: aws_sdk_s3::Client, bucket: String, public_base_url: String) -> Self {
        Self {
            client,
            bucket,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl PhotoStore for S3PhotoStore {
    async fn upload(&self, photo: &PendingPhoto) -> Result<String, AppError> {
        let key = format!("{PHOTO_FOLDER}/{}.{}", Uuid::new_v4(), photo.extension());
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(photo.bytes.clone()))
            .content_type(&photo.content_type)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("S3 upload failed: {e}")))?;

        info!("Uploaded photo to s3://{}/{}", self.bucket, key);
        Ok(format!("{}/{}", self.public_base_url, key))
    }

    async fn delete(&self, url: &str) -> Result<(), AppError> {
        let key = photo_key_from_url(url)
            .ok_or_else(|| AppError::Storage(format!("Not a stored photo URL: {url}")))?;
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("S3 delete failed: {e}")))?;

        info!("Deleted photo s3://{}/{}", self.bucket, key);
        Ok(())
    }
}

/// Recovers the object key from a public photo URL: the last path segment
/// (query string dropped) under [`PHOTO_FOLDER`].
pub fn photo_key_from_url(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next()?;
    let file = path.rsplit('/').next()?;
    if file.is_empty() || !file.contains('.') {
        return None;
    }
    Some(format!("{PHOTO_FOLDER}/{file}"))
}
