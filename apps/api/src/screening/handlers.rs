use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::Serialize;
use tracing::info;

use crate::errors::AppError;
use crate::extraction::{extract_document_blocking, DocumentFormat};
use crate::matching::pipeline::check_upload_size;
use crate::models::candidate::ExtractedCandidate;
use crate::routes::multipart::read_upload_form;
use crate::screening::extract_candidate;
use crate::state::AppState;

#[derive(Serialize)]
pub struct ExtractResponse {
    pub format: DocumentFormat,
    pub char_count: usize,
    pub word_count: usize,
    pub sha256: String,
    pub candidate: ExtractedCandidate,
}

/// POST /api/v1/resumes/extract
/// Extracts text and a candidate profile without scoring or storing anything.
pub async fn handle_extract_resume(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ExtractResponse>, AppError> {
    let upload = read_upload_form(multipart).await?.require_resume()?;
    check_upload_size(upload.bytes.len(), state.config.max_upload_bytes)?;

    let document =
        extract_document_blocking(upload.filename, upload.content_type, upload.bytes).await?;
    let candidate = extract_candidate(&document.text, &state.llm).await?;
    info!(
        "Extracted {:?} resume: {} words, {} skills",
        document.format,
        document.word_count,
        candidate.skills.len()
    );

    Ok(Json(ExtractResponse {
        format: document.format,
        char_count: document.char_count,
        word_count: document.word_count,
        sha256: document.sha256,
        candidate,
    }))
}
