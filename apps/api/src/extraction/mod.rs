//! Resume text extraction: turns an uploaded file into normalized plain text.
//!
//! Flow: detect_format → extract_text (pdf / docx / plain) → normalize_text → length check.
//! Extraction is CPU-bound and must run inside `tokio::task::spawn_blocking`.

pub mod detect;
pub mod docx;
pub mod normalize;
pub mod pdf;

use serde::Serialize;
use sha2::{Digest, Sha256};
use thiserror::Error;

pub use detect::{detect_format, DocumentFormat};
pub use normalize::normalize_text;

/// Documents with fewer non-whitespace characters than this are treated as scanned/empty.
pub const MIN_TEXT_CHARS: usize = 50;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Unsupported resume format: {0}")]
    UnsupportedFormat(String),

    #[error("No readable text found in the document (scanned or image-only files are not supported)")]
    EmptyDocument,

    #[error("The PDF is encrypted or password protected")]
    Encrypted,

    #[error("The document could not be read: {0}")]
    Corrupt(String),

    #[error("{0}")]
    Join(String),
}

/// A resume file as received from a multipart upload.
#[derive(Debug, Clone)]
pub struct ResumeUpload {
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub bytes: bytes::Bytes,
}

/// Normalized text extracted from an uploaded resume.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractedDocument {
    pub format: DocumentFormat,
    pub text: String,
    pub char_count: usize,
    pub word_count: usize,
    /// SHA-256 of the original upload bytes.
    pub sha256: String,
}

/// Dispatches raw bytes to the extractor for `format`.
pub fn extract_text(bytes: &[u8], format: DocumentFormat) -> Result<String, ExtractionError> {
    match format {
        DocumentFormat::Pdf => pdf::extract_pdf_text(bytes),
        DocumentFormat::Docx => docx::extract_docx_text(bytes),
        DocumentFormat::PlainText => Ok(decode_plain_text(bytes)),
    }
}

/// Full synchronous extraction: detect, extract, normalize, reject near-empty output.
pub fn extract_document(
    filename: Option<&str>,
    content_type: Option<&str>,
    bytes: &[u8],
) -> Result<ExtractedDocument, ExtractionError> {
    let format = detect_format(filename, content_type, bytes)?;
    let raw = extract_text(bytes, format)?;
    let text = normalize_text(&raw);

    let meaningful = text.chars().filter(|c| !c.is_whitespace()).count();
    if meaningful < MIN_TEXT_CHARS {
        return Err(ExtractionError::EmptyDocument);
    }

    Ok(ExtractedDocument {
        format,
        char_count: text.chars().count(),
        word_count: text.split_whitespace().count(),
        sha256: hex::encode(Sha256::digest(bytes)),
        text,
    })
}

/// Runs `extract_document` on the blocking pool so PDF parsing never stalls the runtime.
pub async fn extract_document_blocking(
    filename: Option<String>,
    content_type: Option<String>,
    bytes: bytes::Bytes,
) -> Result<ExtractedDocument, ExtractionError> {
    tokio::task::spawn_blocking(move || {
        extract_document(filename.as_deref(), content_type.as_deref(), &bytes)
    })
    .await
    .map_err(|e| ExtractionError::Join(e.to_string()))?
}

fn decode_plain_text(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RESUME: &str = "Jane Doe\njane@example.com\n\nExperience\nSenior Rust Engineer at Acme, 2019-2024\nBuilt distributed systems in Rust and Go.";

    #[test]
    fn test_extract_plain_text_document() {
        let doc = extract_document(Some("resume.txt"), None, SAMPLE_RESUME.as_bytes()).unwrap();
        assert_eq!(doc.format, DocumentFormat::PlainText);
        assert!(doc.text.starts_with("Jane Doe"));
        assert!(doc.word_count > 10);
        assert_eq!(doc.sha256.len(), 64);
    }

    #[test]
    fn test_bom_is_stripped() {
        let mut bytes = b"\xEF\xBB\xBF".to_vec();
        bytes.extend_from_slice(SAMPLE_RESUME.as_bytes());
        let doc = extract_document(Some("resume.txt"), None, &bytes).unwrap();
        assert!(doc.text.starts_with('J'));
    }

    #[test]
    fn test_short_text_is_rejected_as_empty() {
        let result = extract_document(Some("resume.txt"), None, b"Jane Doe\n\n   ");
        assert!(matches!(result, Err(ExtractionError::EmptyDocument)));
    }

    #[test]
    fn test_sha256_depends_on_raw_bytes() {
        let a = extract_document(Some("a.txt"), None, SAMPLE_RESUME.as_bytes()).unwrap();
        let padded = format!("{SAMPLE_RESUME}   ");
        let b = extract_document(Some("b.txt"), None, padded.as_bytes()).unwrap();
        assert_eq!(a.text, b.text);
        assert_ne!(a.sha256, b.sha256);
    }

    #[tokio::test]
    async fn test_blocking_wrapper_returns_same_result() {
        let doc = extract_document_blocking(
            Some("resume.md".to_string()),
            Some("text/markdown".to_string()),
            bytes::Bytes::from_static(SAMPLE_RESUME.as_bytes()),
        )
        .await
        .unwrap();
        assert_eq!(doc.format, DocumentFormat::PlainText);
    }
}
