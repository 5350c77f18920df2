use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use tracing::info;

use crate::models::candidate::{CandidateProfile, NewCandidateProfile};

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("database write timed out after {0:?}")]
    Timeout(Duration),
}

/// Sole writer of candidate profiles.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Inserts one profile and returns it as read back from the store,
    /// with its assigned `id` and `created_at`.
    async fn insert(&self, profile: NewCandidateProfile)
        -> Result<CandidateProfile, PersistenceError>;
}

pub struct PgProfileStore {
    pool: PgPool,
    timeout: Duration,
}

impl PgProfileStore {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    async fn insert_and_read_back(
        &self,
        profile: &NewCandidateProfile,
    ) -> Result<CandidateProfile, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO candidate_profiles
                (full_name, email, domain, resume_url, resume_text)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(&profile.full_name)
        .bind(&profile.email)
        .bind(&profile.domain)
        .bind(&profile.resume_url)
        .bind(&profile.resume_text)
        .fetch_one(&mut *tx)
        .await?;

        let row = sqlx::query_as::<_, CandidateProfile>(
            "SELECT * FROM candidate_profiles WHERE id = $1",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(row)
    }
}

#[async_trait]
impl ProfileStore for PgProfileStore {
    async fn insert(
        &self,
        profile: NewCandidateProfile,
    ) -> Result<CandidateProfile, PersistenceError> {
        let row = tokio::time::timeout(self.timeout, self.insert_and_read_back(&profile))
            .await
            .map_err(|_| PersistenceError::Timeout(self.timeout))??;

        info!("Inserted candidate profile {} ({})", row.id, row.domain);
        Ok(row)
    }
}
