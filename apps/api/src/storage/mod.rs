//! Object storage for uploaded resume files.
//!
//! The upload flow only sees `ResumeStorage`; which backend sits behind it is
//! decided once at startup from `Config::storage`.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use uuid::Uuid;

use crate::config::{Config, StorageConfig};

pub mod s3;
pub mod supabase;

pub use s3::S3Storage;
pub use supabase::SupabaseStorage;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage backend rejected the write (status {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("storage backend unreachable: {0}")]
    Transport(String),

    #[error("storage request timed out after {0:?}")]
    Timeout(Duration),

    #[error("storage backend error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait ResumeStorage: Send + Sync {
    /// Writes `data` under `key` and returns the object's public URL.
    async fn store(
        &self,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<String, StorageError>;

    /// Public URL for `key`. Pure string construction, no round trip.
    fn url_for(&self, key: &str) -> String;

    /// Removes the object stored under `key`.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}

/// Builds the configured backend.
pub async fn build_storage(config: &Config) -> Result<Arc<dyn ResumeStorage>> {
    let storage: Arc<dyn ResumeStorage> = match &config.storage {
        StorageConfig::Supabase { url, key } => Arc::new(SupabaseStorage::new(
            url,
            key.clone(),
            config.bucket.clone(),
            config.storage_timeout,
        )?),
        StorageConfig::S3 {
            endpoint,
            region,
            access_key_id,
            secret_access_key,
        } => Arc::new(
            S3Storage::connect(
                endpoint,
                region,
                access_key_id,
                secret_access_key,
                config.bucket.clone(),
                config.storage_timeout,
            )
            .await,
        ),
    };
    Ok(storage)
}

/// Derives a unique object key from the client-supplied file name.
///
/// Only the last path component survives; anything outside `[A-Za-z0-9._-]`
/// becomes `_`. The random prefix keeps same-named uploads apart.
pub fn storage_key_for(original_name: &str) -> String {
    let base = original_name
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or_default()
        .trim();

    let mut sanitized: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.trim_matches(|c: char| c == '.' || c == '_').is_empty() {
        sanitized = "resume.pdf".to_string();
    }

    format!("{}-{}", Uuid::new_v4(), sanitized)
}
