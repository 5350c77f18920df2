use axum::{
    extract::{
        multipart::{Field, MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::StatusCode,
    Json,
};
use bytes::{Bytes, BytesMut};
use serde::Serialize;
use tracing::debug;

use crate::errors::AppError;
use crate::intake::upload::{process_upload, ResumeSubmission};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct UploadResumeResponse {
    pub message: String,
    pub candidate_id: i64,
}

/// POST /upload_resume
pub async fn handle_upload_resume(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResumeResponse>, AppError> {
    let multipart = multipart.map_err(|e| AppError::Validation(e.body_text()))?;
    let submission = read_submission(multipart, state.max_upload_bytes).await?;

    let profile =
        process_upload(state.storage.as_ref(), state.profiles.as_ref(), submission).await?;

    Ok(Json(UploadResumeResponse {
        message: "Resume uploaded successfully".to_string(),
        candidate_id: profile.id,
    }))
}

/// Reads and validates the four form fields. Nothing is stored before this returns.
async fn read_submission(
    mut multipart: Multipart,
    max_upload_bytes: usize,
) -> Result<ResumeSubmission, AppError> {
    let mut full_name: Option<String> = None;
    let mut email: Option<String> = None;
    let mut domain: Option<String> = None;
    let mut file: Option<(String, Option<String>, Bytes)> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        match name.as_str() {
            "full_name" => set_once(&mut full_name, &name, read_text(field, &name).await?)?,
            "email" => set_once(&mut email, &name, read_text(field, &name).await?)?,
            "domain" => set_once(&mut domain, &name, read_text(field, &name).await?)?,
            "resume_file" => {
                let file_name = field
                    .file_name()
                    .map(str::to_string)
                    .filter(|f| !f.trim().is_empty())
                    .ok_or_else(|| {
                        AppError::Validation("resume_file must be a file upload".to_string())
                    })?;
                let content_type = field.content_type().map(str::to_string);
                let content = read_file(field, max_upload_bytes).await?;
                if content.is_empty() {
                    return Err(AppError::Validation("resume_file is empty".to_string()));
                }
                set_once(&mut file, &name, (file_name, content_type, content))?;
            }
            other => debug!(field = other, "Ignoring unknown form field"),
        }
    }

    let (file_name, content_type, content) = file.ok_or_else(|| missing("resume_file"))?;

    Ok(ResumeSubmission {
        full_name: full_name.ok_or_else(|| missing("full_name"))?,
        email: email.ok_or_else(|| missing("email"))?,
        domain: domain.ok_or_else(|| missing("domain"))?,
        file_name,
        content_type,
        content,
    })
}

async fn read_text(field: Field<'_>, name: &str) -> Result<String, AppError> {
    let value = field.text().await.map_err(multipart_error)?;
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::Validation(format!("{name} must not be empty")));
    }
    Ok(value.to_string())
}

/// Buffers the file part once, refusing to grow past `max_bytes`.
async fn read_file(mut field: Field<'_>, max_bytes: usize) -> Result<Bytes, AppError> {
    let mut buf = BytesMut::new();
    while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
        if buf.len() + chunk.len() > max_bytes {
            return Err(AppError::PayloadTooLarge(format!(
                "resume_file exceeds the maximum size of {max_bytes} bytes"
            )));
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(buf.freeze())
}

fn set_once<T>(slot: &mut Option<T>, name: &str, value: T) -> Result<(), AppError> {
    if slot.is_some() {
        return Err(AppError::Validation(format!("{name} was sent more than once")));
    }
    *slot = Some(value);
    Ok(())
}

fn missing(name: &str) -> AppError {
    AppError::Validation(format!("Missing required field '{name}'"))
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(e.body_text())
    } else {
        AppError::Validation(format!("Invalid multipart body: {}", e.body_text()))
    }
}
