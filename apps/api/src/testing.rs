//! In-memory collaborators and request fixtures shared by unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

use crate::models::candidate::{CandidateProfile, NewCandidateProfile};
use crate::profiles::{PersistenceError, ProfileStore};
use crate::storage::{ResumeStorage, StorageError};

#[derive(Default)]
pub struct InMemoryStorage {
    objects: Mutex<Vec<(String, Bytes)>>,
    deleted: Mutex<Vec<String>>,
    reject_with: Option<String>,
}

impl InMemoryStorage {
    /// A backend that rejects every write with `message`.
    pub fn failing(message: &str) -> Self {
        Self {
            reject_with: Some(message.to_string()),
            ..Default::default()
        }
    }

    pub fn objects(&self) -> Vec<(String, Bytes)> {
        self.objects.lock().unwrap().clone()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl ResumeStorage for InMemoryStorage {
    async fn store(
        &self,
        key: &str,
        data: Bytes,
        _content_type: &str,
    ) -> Result<String, StorageError> {
        if let Some(message) = &self.reject_with {
            return Err(StorageError::Rejected {
                status: 400,
                message: message.clone(),
            });
        }
        self.objects.lock().unwrap().push((key.to_string(), data));
        Ok(self.url_for(key))
    }

    fn url_for(&self, key: &str) -> String {
        format!("https://storage.test/resumes/{key}")
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.objects.lock().unwrap().retain(|(k, _)| k != key);
        self.deleted.lock().unwrap().push(key.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryProfileStore {
    rows: Mutex<Vec<CandidateProfile>>,
    insert_calls: AtomicUsize,
    fail: bool,
}

impl InMemoryProfileStore {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn rows(&self) -> Vec<CandidateProfile> {
        self.rows.lock().unwrap().clone()
    }

    pub fn insert_calls(&self) -> usize {
        self.insert_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn insert(
        &self,
        profile: NewCandidateProfile,
    ) -> Result<CandidateProfile, PersistenceError> {
        self.insert_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(PersistenceError::Database(sqlx::Error::PoolTimedOut));
        }

        let mut rows = self.rows.lock().unwrap();
        let row = CandidateProfile {
            id: rows.len() as i64 + 1,
            full_name: profile.full_name,
            email: profile.email,
            domain: profile.domain,
            resume_url: profile.resume_url,
            resume_text: profile.resume_text,
            created_at: Utc::now(),
        };
        rows.push(row.clone());
        Ok(row)
    }
}

/// Builds a PDF with one page per entry. An empty entry produces a page
/// with an empty content stream (no text layer).
pub fn pdf_with_pages(texts: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in texts {
        let operations = if text.is_empty() {
            vec![]
        } else {
            vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![72.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ]
        };
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        });
        kids.push(page_id.into());
    }

    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => texts.len() as i64,
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

pub const BOUNDARY: &str = "hiredeck-test-boundary";

/// Hand-assembled `multipart/form-data` body.
#[derive(Default)]
pub struct MultipartBody {
    body: Vec<u8>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, content_type: &str, data: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn content_type() -> String {
        format!("multipart/form-data; boundary={BOUNDARY}")
    }

    pub fn finish(mut self) -> Vec<u8> {
        self.body
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        self.body
    }
}
