pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::intake::handlers;
use crate::state::AppState;

/// Room for the text fields and multipart framing on top of the file itself.
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.max_upload_bytes.saturating_add(FORM_OVERHEAD_BYTES);

    Router::new()
        .route("/", get(health::welcome_handler))
        .route("/health", get(health::health_handler))
        .route("/upload_resume", post(handlers::handle_upload_resume))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
