use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One row of `candidate_profiles`. Written once per successful upload, never updated.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CandidateProfile {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub domain: String,
    pub resume_url: String,
    pub resume_text: String,
    pub created_at: DateTime<Utc>,
}

/// Insert payload; `id` and `created_at` are assigned by the database.
#[derive(Debug, Clone)]
pub struct NewCandidateProfile {
    pub full_name: String,
    pub email: String,
    pub domain: String,
    pub resume_url: String,
    pub resume_text: String,
}
