use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use bytes::Bytes;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;

pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Product images in the S3-compatible storage bucket.
#[derive(Clone)]
pub struct ImageStore {
    s3: S3Client,
    bucket: String,
    public_base_url: String,
}

impl ImageStore {
    pub fn new(s3: S3Client, bucket: String, public_base_url: &str) -> Self {
        Self {
            s3,
            bucket,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Uploads one image and returns its public URL.
    pub async fn upload_product_image(
        &self,
        product_id: Uuid,
        content_type: &str,
        data: Bytes,
    ) -> Result<String, AppError> {
        let ext = extension_for(content_type).ok_or_else(|| {
            AppError::Validation(format!("unsupported image type '{content_type}'"))
        })?;
        if data.is_empty() {
            return Err(AppError::Validation("image is empty".into()));
        }
        if data.len() > MAX_IMAGE_BYTES {
            return Err(AppError::Validation(format!(
                "image exceeds {} MB",
                MAX_IMAGE_BYTES / (1024 * 1024)
            )));
        }

        let key = object_key(product_id, Uuid::new_v4(), ext);
        self.s3
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(data))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("upload of {key} failed: {e}")))?;

        info!("Uploaded product image to {}/{}", self.bucket, key);
        Ok(self.public_url(&key))
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}/{}", self.public_base_url, self.bucket, key)
    }
}

fn extension_for(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/png" => Some("png"),
        "image/jpeg" => Some("jpg"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        _ => None,
    }
}

fn object_key(product_id: Uuid, file_id: Uuid, ext: &str) -> String {
    format!("products/{product_id}/{file_id}.{ext}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_images_accepted() {
        assert_eq!(extension_for("image/jpeg"), Some("jpg"));
        assert_eq!(extension_for("image/webp"), Some("webp"));
        assert_eq!(extension_for("application/pdf"), None);
        assert_eq!(extension_for("image/svg+xml"), None);
    }

    #[test]
    fn test_object_key_groups_by_product() {
        let product = Uuid::nil();
        let file = Uuid::from_u128(1);
        assert_eq!(
            object_key(product, file, "png"),
            format!("products/{product}/{file}.png")
        );
    }
}
