//! Supabase-compatible storage REST client.
//!
//! Writes go to `POST {base}/storage/v1/object/{bucket}/{key}` with `x-upsert`
//! enabled, so replaying a write for the same key is harmless and may be retried.
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};

use super::{ResumeStorage, StorageError};

const MAX_ATTEMPTS: u32 = 3;
const BACKOFF_BASE_MS: u64 = 200;

#[derive(Debug, Deserialize)]
struct SupabaseErrorBody {
    message: Option<String>,
    error: Option<String>,
}

#[derive(Clone)]
pub struct SupabaseStorage {
    client: Client,
    base_url: String,
    api_key: String,
    bucket: String,
    timeout: Duration,
}

impl SupabaseStorage {
    pub fn new(
        base_url: &str,
        api_key: String,
        bucket: String,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build storage HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            bucket,
            timeout,
        })
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/storage/v1/object/{}/{}", self.base_url, self.bucket, key)
    }

    fn map_send_error(&self, e: reqwest::Error) -> StorageError {
        if e.is_timeout() {
            StorageError::Timeout(self.timeout)
        } else {
            StorageError::Transport(e.to_string())
        }
    }
}

#[async_trait]
impl ResumeStorage for SupabaseStorage {
    /// Uploads the object, retrying on 429, 5xx and transport failures with
    /// exponential backoff. Other non-success statuses fail immediately.
    async fn store(
        &self,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<String, StorageError> {
        let url = self.object_url(key);
        let mut last_error: Option<StorageError> = None;

        for attempt in 0..MAX_ATTEMPTS {
            if attempt > 0 {
                let delay = Duration::from_millis(BACKOFF_BASE_MS * (1 << (attempt - 1)));
                warn!(
                    key,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "Storage write failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(&url)
                .bearer_auth(&self.api_key)
                .header("apikey", &self.api_key)
                .header("content-type", content_type)
                .header("x-upsert", "true")
                .body(data.clone())
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(self.map_send_error(e));
                    continue;
                }
            };

            let status = response.status();
            if status.is_success() {
                debug!(key, bucket = %self.bucket, "Stored object");
                return Ok(self.url_for(key));
            }

            let body = response.text().await.unwrap_or_default();
            let error = StorageError::Rejected {
                status: status.as_u16(),
                message: backend_message(&body),
            };

            if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                last_error = Some(error);
                continue;
            }
            return Err(error);
        }

        Err(last_error.unwrap_or_else(|| {
            StorageError::Backend(format!("storage write failed after {MAX_ATTEMPTS} attempts"))
        }))
    }

    fn url_for(&self, key: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url, self.bucket, key
        )
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let response = self
            .client
            .delete(self.object_url(key))
            .bearer_auth(&self.api_key)
            .header("apikey", &self.api_key)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(StorageError::Rejected {
            status: status.as_u16(),
            message: backend_message(&body),
        })
    }
}

/// Pulls a human-readable message out of a storage error body, falling back to the raw text.
fn backend_message(body: &str) -> String {
    match serde_json::from_str::<SupabaseErrorBody>(body) {
        Ok(SupabaseErrorBody {
            message: Some(message),
            ..
        }) => message,
        Ok(SupabaseErrorBody {
            error: Some(error), ..
        }) => error,
        _ if body.trim().is_empty() => "no response body".to_string(),
        _ => body.trim().to_string(),
    }
}
