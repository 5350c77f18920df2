//! Upload orchestration: store the file, extract its text, persist the profile.
//!
//! The file is buffered once as `Bytes`; storage and extraction each get a
//! cheap clone of the same buffer and run concurrently. The profile row is
//! only written once both have succeeded. If a later step fails after the
//! object was stored, the object is deleted again.

use bytes::Bytes;
use thiserror::Error;
use tracing::{info, warn};

use crate::intake::extract::{extract_text, ExtractionError};
use crate::models::candidate::{CandidateProfile, NewCandidateProfile};
use crate::profiles::{PersistenceError, ProfileStore};
use crate::storage::{storage_key_for, ResumeStorage, StorageError};

/// Validated form input for one upload.
#[derive(Debug, Clone)]
pub struct ResumeSubmission {
    pub full_name: String,
    pub email: String,
    pub domain: String,
    pub file_name: String,
    pub content_type: Option<String>,
    pub content: Bytes,
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

pub async fn process_upload(
    storage: &dyn ResumeStorage,
    profiles: &dyn ProfileStore,
    submission: ResumeSubmission,
) -> Result<CandidateProfile, UploadError> {
    let ResumeSubmission {
        full_name,
        email,
        domain,
        file_name,
        content_type,
        content,
    } = submission;

    let key = storage_key_for(&file_name);
    let content_type = content_type.unwrap_or_else(|| "application/pdf".to_string());
    info!(
        key = %key,
        size_bytes = content.len(),
        domain = %domain,
        "Processing resume upload"
    );

    let (stored, extracted) = tokio::join!(
        storage.store(&key, content.clone(), &content_type),
        extract_text(content),
    );

    let resume_url = stored?;
    info!(key = %key, url = %resume_url, "Resume stored");

    let resume_text = match extracted {
        Ok(text) => text,
        Err(e) => {
            discard_orphan(storage, &key).await;
            return Err(e.into());
        }
    };
    info!(key = %key, text_len = resume_text.len(), "Resume text extracted");

    let profile = NewCandidateProfile {
        full_name,
        email,
        domain,
        resume_url,
        resume_text,
    };

    match profiles.insert(profile).await {
        Ok(row) => {
            info!(candidate_id = row.id, key = %key, "Candidate profile created");
            Ok(row)
        }
        Err(e) => {
            discard_orphan(storage, &key).await;
            Err(e.into())
        }
    }
}

/// Best-effort removal of a stored object whose profile was never written.
async fn discard_orphan(storage: &dyn ResumeStorage, key: &str) {
    match storage.delete(key).await {
        Ok(()) => info!(key, "Removed stored resume after failed upload"),
        Err(e) => warn!(key, error = %e, "Failed to remove orphaned resume"),
    }
}
