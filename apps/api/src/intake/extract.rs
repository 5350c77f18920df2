//! PDF text extraction.
//!
//! Parsing is CPU-bound, so `extract_text` moves it onto the blocking pool;
//! `extract_text_sync` is the inner pass.

use bytes::Bytes;
use thiserror::Error;
use tracing::debug;

/// PDF allows junk before the header, but only this far in.
const HEADER_SEARCH_WINDOW: usize = 1024;
const PDF_MAGIC: &[u8] = b"%PDF-";

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("uploaded file is not a PDF")]
    NotPdf,

    #[error("could not read PDF: {0}")]
    Malformed(String),

    #[error("PDF extraction aborted: {0}")]
    Aborted(String),
}

/// Extracts the text of every page, in page order, off the async executor.
pub async fn extract_text(content: Bytes) -> Result<String, ExtractionError> {
    tokio::task::spawn_blocking(move || extract_text_sync(&content))
        .await
        .map_err(|e| ExtractionError::Aborted(e.to_string()))?
}

/// Synchronous extraction. A PDF without a text layer, or without pages,
/// yields an empty string.
pub fn extract_text_sync(content: &[u8]) -> Result<String, ExtractionError> {
    if !has_pdf_header(content) {
        return Err(ExtractionError::NotPdf);
    }

    // pdf-extract panics on some malformed inputs instead of returning an error.
    let text = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(content))
        .map_err(|panic| ExtractionError::Malformed(panic_message(panic.as_ref())))?
        .map_err(|e| ExtractionError::Malformed(e.to_string()))?;

    let text = text.trim().to_string();
    debug!(text_len = text.len(), "PDF text extracted");
    Ok(text)
}

fn has_pdf_header(content: &[u8]) -> bool {
    let window = &content[..content.len().min(HEADER_SEARCH_WINDOW)];
    window
        .windows(PDF_MAGIC.len())
        .any(|w| w == PDF_MAGIC)
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "parser panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::pdf_with_pages;

    #[test]
    fn test_header_detection() {
        assert!(has_pdf_header(b"%PDF-1.7\n..."));
        assert!(has_pdf_header(b"\xEF\xBB\xBF%PDF-1.4"));
        assert!(!has_pdf_header(b"PK\x03\x04 docx"));
        assert!(!has_pdf_header(b""));

        let mut late = vec![b' '; HEADER_SEARCH_WINDOW];
        late.extend_from_slice(b"%PDF-1.4");
        assert!(!has_pdf_header(&late));
    }

    #[test]
    fn test_single_page_text() {
        let pdf = pdf_with_pages(&["Hello World"]);
        assert_eq!(extract_text_sync(&pdf).unwrap(), "Hello World");
    }

    #[test]
    fn test_pages_concatenate_in_order() {
        let pdf = pdf_with_pages(&["Alpha section", "Bravo section", "Charlie section"]);
        let text = extract_text_sync(&pdf).unwrap();

        let alpha = text.find("Alpha section").expect("page 1 text missing");
        let bravo = text.find("Bravo section").expect("page 2 text missing");
        let charlie = text.find("Charlie section").expect("page 3 text missing");
        assert!(alpha < bravo && bravo < charlie, "out of order: {text:?}");
    }

    #[test]
    fn test_page_without_text_layer_is_empty() {
        let pdf = pdf_with_pages(&[""]);
        assert_eq!(extract_text_sync(&pdf).unwrap(), "");
    }

    #[test]
    fn test_zero_page_pdf_is_empty() {
        let pdf = pdf_with_pages(&[]);
        assert_eq!(extract_text_sync(&pdf).unwrap(), "");
    }

    #[test]
    fn test_non_pdf_is_rejected() {
        let err = extract_text_sync(b"just some plain text, not a document").unwrap_err();
        assert!(matches!(err, ExtractionError::NotPdf));
    }

    #[test]
    fn test_truncated_pdf_is_malformed() {
        let err = extract_text_sync(b"%PDF-1.4\n1 0 obj\n<< /Type /Catalog").unwrap_err();
        assert!(matches!(err, ExtractionError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_async_extraction_matches_sync() {
        let pdf = Bytes::from(pdf_with_pages(&["Hello World"]));
        assert_eq!(extract_text(pdf).await.unwrap(), "Hello World");
    }
}
