use std::sync::Arc;

use crate::profiles::ProfileStore;
use crate::storage::ResumeStorage;

/// Shared application state injected into all route handlers via Axum extractors.
/// Collaborators are built once at startup and shared across requests.
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn ResumeStorage>,
    pub profiles: Arc<dyn ProfileStore>,
    /// Largest accepted resume file, in bytes.
    pub max_upload_bytes: usize,
}
