use std::time::Duration;

use async_trait::async_trait;
use aws_config::{timeout::TimeoutConfig, Region};
use aws_sdk_s3::{config::Credentials, error::DisplayErrorContext, primitives::ByteStream};
use bytes::Bytes;
use tracing::debug;

use super::{ResumeStorage, StorageError};

/// S3-compatible backend for MinIO (local) or AWS (production).
/// Objects are addressed path-style: `{endpoint}/{bucket}/{key}`.
#[derive(Clone)]
pub struct S3Storage {
    client: aws_sdk_s3::Client,
    endpoint: String,
    bucket: String,
}

impl S3Storage {
    pub async fn connect(
        endpoint: &str,
        region: &str,
        access_key_id: &str,
        secret_access_key: &str,
        bucket: String,
        timeout: Duration,
    ) -> Self {
        let credentials = Credentials::new(
            access_key_id,
            secret_access_key,
            None,
            None,
            "hiredeck-static",
        );

        let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .credentials_provider(credentials)
            .endpoint_url(endpoint)
            .timeout_config(
                TimeoutConfig::builder()
                    .operation_timeout(timeout)
                    .build(),
            )
            .load()
            .await;

        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(true)
            .build();

        Self::from_client(aws_sdk_s3::Client::from_conf(s3_config), endpoint, bucket)
    }

    pub fn from_client(client: aws_sdk_s3::Client, endpoint: &str, bucket: String) -> Self {
        Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            bucket,
        }
    }
}

#[async_trait]
impl ResumeStorage for S3Storage {
    async fn store(
        &self,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<String, StorageError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(data))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| {
                StorageError::Backend(format!("S3 upload failed: {}", DisplayErrorContext(&e)))
            })?;

        debug!("Uploaded resume to s3://{}/{}", self.bucket, key);
        Ok(self.url_for(key))
    }

    fn url_for(&self, key: &str) -> String {
        format!("{}/{}/{}", self.endpoint, self.bucket, key)
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                StorageError::Backend(format!("S3 delete failed: {}", DisplayErrorContext(&e)))
            })?;
        Ok(())
    }
}
