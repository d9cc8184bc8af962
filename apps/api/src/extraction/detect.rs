use serde::{Deserialize, Serialize};

use super::ExtractionError;

const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
const PDF_MAGIC: &[u8] = b"%PDF-";
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const OLE_MAGIC: &[u8] = b"\xD0\xCF\x11\xE0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentFormat {
    Pdf,
    Docx,
    PlainText,
}

impl DocumentFormat {
    pub fn content_type(self) -> &'static str {
        match self {
            DocumentFormat::Pdf => "application/pdf",
            DocumentFormat::Docx => DOCX_MIME,
            DocumentFormat::PlainText => "text/plain; charset=utf-8",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            DocumentFormat::Pdf => "pdf",
            DocumentFormat::Docx => "docx",
            DocumentFormat::PlainText => "txt",
        }
    }
}

/// Detects the upload format. Magic bytes win over the filename, the filename over the MIME type.
pub fn detect_format(
    filename: Option<&str>,
    content_type: Option<&str>,
    bytes: &[u8],
) -> Result<DocumentFormat, ExtractionError> {
    let extension = filename
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase());
    let mime = content_type
        .map(|ct| ct.split(';').next().unwrap_or(ct).trim().to_ascii_lowercase());

    if bytes.starts_with(PDF_MAGIC) {
        return Ok(DocumentFormat::Pdf);
    }

    if bytes.starts_with(ZIP_MAGIC) {
        let named_docx = extension.as_deref() == Some("docx");
        let typed_docx = mime.as_deref() == Some(DOCX_MIME);
        return if named_docx || typed_docx {
            Ok(DocumentFormat::Docx)
        } else {
            Err(ExtractionError::UnsupportedFormat(
                "zip archives other than .docx are not accepted".to_string(),
            ))
        };
    }

    if bytes.starts_with(OLE_MAGIC) {
        return Err(ExtractionError::UnsupportedFormat(
            "legacy .doc files are not supported, save as .docx or .pdf".to_string(),
        ));
    }

    match extension.as_deref() {
        Some("pdf") => return Err(ExtractionError::Corrupt("missing PDF header".to_string())),
        Some("docx") => return Err(ExtractionError::Corrupt("missing DOCX container".to_string())),
        Some("txt" | "md" | "text") => return Ok(DocumentFormat::PlainText),
        Some("doc") => {
            return Err(ExtractionError::UnsupportedFormat(
                "legacy .doc files are not supported, save as .docx or .pdf".to_string(),
            ))
        }
        _ => {}
    }

    match mime.as_deref() {
        Some(m) if m.starts_with("text/") => Ok(DocumentFormat::PlainText),
        Some(other) => Err(ExtractionError::UnsupportedFormat(other.to_string())),
        None => Err(ExtractionError::UnsupportedFormat(
            filename.unwrap_or("unnamed upload").to_string(),
        )),
    }
}
