//! DOCX text extraction: reads `word/document.xml` out of the zip container.

use std::io::{Cursor, Read};

use roxmltree::{Document, Node};

use super::ExtractionError;

const WORD_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const DOCUMENT_PART: &str = "word/document.xml";
/// Guards against zip bombs: the main document part of a resume is never this large.
const MAX_DOCUMENT_XML_BYTES: u64 = 20 * 1024 * 1024;

pub fn extract_docx_text(bytes: &[u8]) -> Result<String, ExtractionError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ExtractionError::Corrupt(format!("invalid docx container: {e}")))?;

    let part = archive
        .by_name(DOCUMENT_PART)
        .map_err(|_| ExtractionError::Corrupt(format!("{DOCUMENT_PART} is missing")))?;

    let mut xml = String::new();
    part.take(MAX_DOCUMENT_XML_BYTES)
        .read_to_string(&mut xml)
        .map_err(|e| ExtractionError::Corrupt(format!("unreadable {DOCUMENT_PART}: {e}")))?;

    document_xml_to_text(&xml)
}

/// Flattens WordprocessingML into text: one line per top-level paragraph.
pub fn document_xml_to_text(xml: &str) -> Result<String, ExtractionError> {
    let doc = Document::parse(xml)
        .map_err(|e| ExtractionError::Corrupt(format!("malformed document xml: {e}")))?;

    let mut out = String::new();
    for paragraph in doc
        .descendants()
        .filter(|n| is_word(*n, "p") && !n.ancestors().skip(1).any(|a| is_word(a, "p")))
    {
        for node in paragraph.descendants() {
            if is_word(node, "t") {
                if let Some(text) = node.text() {
                    out.push_str(text);
                }
            } else if is_word(node, "tab") {
                out.push('\t');
            } else if is_word(node, "br") || is_word(node, "cr") {
                out.push('\n');
            }
        }
        out.push('\n');
    }

    Ok(out)
}

fn is_word(node: Node<'_, '_>, local: &str) -> bool {
    node.is_element()
        && node.tag_name().name() == local
        && node.tag_name().namespace() == Some(WORD_NS)
}
