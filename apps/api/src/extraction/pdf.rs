//! PDF text extraction wrapper around `pdf-extract`.
//!
//! Handles encrypted PDFs and parser panics on malformed input.

use std::panic::{catch_unwind, AssertUnwindSafe};

use tracing::warn;

use super::ExtractionError;

/// Extracts the text layer of a PDF held in memory.
pub fn extract_pdf_text(bytes: &[u8]) -> Result<String, ExtractionError> {
    if looks_encrypted(bytes) {
        return Err(ExtractionError::Encrypted);
    }

    // pdf-extract panics on some malformed object streams instead of returning an error.
    let result = catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text_from_mem(bytes)));

    match result {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(ExtractionError::Corrupt(e.to_string())),
        Err(_) => {
            warn!("pdf-extract panicked while reading a {} byte upload", bytes.len());
            Err(ExtractionError::Corrupt("PDF structure could not be parsed".to_string()))
        }
    }
}

/// An `/Encrypt` entry in the trailer means the text streams are unreadable without a key.
fn looks_encrypted(bytes: &[u8]) -> bool {
    bytes.windows(b"/Encrypt".len()).any(|w| w == b"/Encrypt")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encrypted_marker_detected() {
        let bytes = b"%PDF-1.4\ntrailer << /Root 1 0 R /Encrypt 5 0 R >>";
        assert!(matches!(extract_pdf_text(bytes), Err(ExtractionError::Encrypted)));
    }

    #[test]
    fn test_truncated_pdf_is_corrupt() {
        let result = extract_pdf_text(b"%PDF-1.4\n1 0 obj\n<<");
        assert!(matches!(result, Err(ExtractionError::Corrupt(_))));
    }
}
