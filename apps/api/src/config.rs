use std::time::Duration;

use anyhow::{bail, Context, Result};

pub const DEFAULT_BUCKET: &str = "resumes";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Which object store resumes are written to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    /// Supabase-compatible storage REST API.
    Supabase { url: String, key: String },
    /// S3-compatible endpoint (AWS, MinIO).
    S3 {
        endpoint: String,
        region: String,
        access_key_id: String,
        secret_access_key: String,
    },
}

impl StorageConfig {
    pub fn backend_name(&self) -> &'static str {
        match self {
            StorageConfig::Supabase { .. } => "supabase",
            StorageConfig::S3 { .. } => "s3",
        }
    }
}

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub storage: StorageConfig,
    pub bucket: String,
    pub max_upload_bytes: usize,
    pub storage_timeout: Duration,
    pub db_timeout: Duration,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let storage = match env.get("STORAGE_BACKEND").as_deref().unwrap_or("supabase") {
            "supabase" => StorageConfig::Supabase {
                url: env.require("SUPABASE_URL")?,
                key: env.require("SUPABASE_KEY")?,
            },
            "s3" => StorageConfig::S3 {
                endpoint: env.require("S3_ENDPOINT")?,
                region: env.get("S3_REGION").unwrap_or_else(|| "us-east-1".to_string()),
                access_key_id: env.require("AWS_ACCESS_KEY_ID")?,
                secret_access_key: env.require("AWS_SECRET_ACCESS_KEY")?,
            },
            other => bail!("STORAGE_BACKEND must be 'supabase' or 's3', got '{other}'"),
        };

        Ok(Config {
            database_url: env.require("DATABASE_URL")?,
            storage,
            bucket: env
                .get("STORAGE_BUCKET")
                .unwrap_or_else(|| DEFAULT_BUCKET.to_string()),
            max_upload_bytes: env.parse_or("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            storage_timeout: Duration::from_secs(env.parse_or("STORAGE_TIMEOUT_SECS", 30)?),
            db_timeout: Duration::from_secs(env.parse_or("DB_TIMEOUT_SECS", 10)?),
            port: env.parse_or("PORT", 8080)?,
            rust_log: env.get("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}

struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Empty values are treated as unset.
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    fn require(&self, key: &str) -> Result<String> {
        self.get(key)
            .with_context(|| format!("Required environment variable '{key}' is not set"))
    }

    fn parse_or<T>(&self, key: &str, default: T) -> Result<T>
    where
        T: std::str::FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        match self.get(key) {
            Some(raw) => raw
                .trim()
                .parse::<T>()
                .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
            None => Ok(default),
        }
    }
}
