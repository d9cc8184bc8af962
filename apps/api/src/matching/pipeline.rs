//! The match pipeline: one uploaded resume plus one job in, one stored and cached
//! `MatchResponse` out.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::extraction::{extract_document_blocking, ResumeUpload};
use crate::matching::evidence::compute_evidence;
use crate::matching::fingerprint::fingerprint;
use crate::llm_client::LlmClient;
use crate::matching::scorer::{MatchOutcome, MatchScorer, Recommendation, ScoringInput};
use crate::matching::store;
use crate::models::candidate::ExtractedCandidate;
use crate::models::job::JobRequirements;
use crate::models::match_result::MatchResultRow;
use crate::report::publish_report;
use crate::screening::extract_candidate;
use crate::state::AppState;
use crate::storage::blobs::{delete_blob, put_blob, resume_key};
use crate::storage::cache::{cache_match, get_cached_match};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResponse {
    pub match_id: Uuid,
    /// True when the result was served from Redis or a previous identical screening.
    pub cached: bool,
    pub job_title: String,
    pub job: JobRequirements,
    pub candidate: ExtractedCandidate,
    pub outcome: MatchOutcome,
    pub resume_sha256: String,
    pub report_path: String,
    pub created_at: DateTime<Utc>,
}

impl MatchResponse {
    pub fn from_row(row: &MatchResultRow, cached: bool) -> Result<Self, AppError> {
        let corrupt = |field: &str, e: serde_json::Error| {
            AppError::Internal(anyhow::anyhow!(
                "Stored match {} has malformed {field}: {e}",
                row.id
            ))
        };

        let recommendation: Recommendation =
            serde_json::from_value(serde_json::Value::String(row.recommendation.clone()))
                .map_err(|e| corrupt("recommendation", e))?;

        Ok(MatchResponse {
            match_id: row.id,
            cached,
            job_title: row.job_title.clone(),
            job: serde_json::from_value(row.job.clone()).map_err(|e| corrupt("job", e))?,
            candidate: serde_json::from_value(row.candidate.clone())
                .map_err(|e| corrupt("candidate", e))?,
            outcome: MatchOutcome {
                overall_score: row.overall_score.clamp(0, 100) as u8,
                categories: serde_json::from_value(row.categories.clone())
                    .map_err(|e| corrupt("categories", e))?,
                strengths: row.strengths.clone(),
                concerns: row.concerns.clone(),
                summary: row.summary.clone(),
                recommendation,
                evidence: serde_json::from_value(row.evidence.clone())
                    .map_err(|e| corrupt("evidence", e))?,
                fingerprint: row.fingerprint.clone(),
                scorer_backend: row.scorer_backend.clone(),
                adjusted: row.adjusted,
            },
            resume_sha256: row.resume_sha256.clone(),
            report_path: report_path(row.id),
            created_at: row.created_at,
        })
    }
}

pub fn report_path(match_id: Uuid) -> String {
    format!("/api/v1/matches/{match_id}/report")
}

/// Rejects empty uploads (400) and uploads above `max_bytes` (413).
pub fn check_upload_size(len: usize, max_bytes: usize) -> Result<(), AppError> {
    if len == 0 {
        return Err(AppError::Validation("resume file is empty".to_string()));
    }
    if len > max_bytes {
        return Err(AppError::PayloadTooLarge(format!(
            "resume is {len} bytes, the limit is {max_bytes} bytes"
        )));
    }
    Ok(())
}

pub struct NewMatch<'a> {
    pub id: Uuid,
    pub job: &'a JobRequirements,
    pub candidate: &'a ExtractedCandidate,
    pub outcome: &'a MatchOutcome,
    pub resume_sha256: &'a str,
    pub resume_s3_key: &'a str,
}

pub fn build_row(new: NewMatch<'_>) -> Result<MatchResultRow, AppError> {
    let to_value = |v: serde_json::Result<serde_json::Value>| v.map_err(anyhow::Error::from);
    let outcome = new.outcome;

    Ok(MatchResultRow {
        id: new.id,
        fingerprint: outcome.fingerprint.clone(),
        job_id: new.job.job_id,
        job_title: new.job.title.trim().to_string(),
        job: to_value(serde_json::to_value(new.job))?,
        candidate: to_value(serde_json::to_value(new.candidate))?,
        candidate_name: new.candidate.full_name.clone(),
        overall_score: outcome.overall_score as i16,
        categories: to_value(serde_json::to_value(&outcome.categories))?,
        evidence: to_value(serde_json::to_value(&outcome.evidence))?,
        strengths: outcome.strengths.clone(),
        concerns: outcome.concerns.clone(),
        summary: outcome.summary.clone(),
        recommendation: outcome.recommendation.as_str().to_string(),
        scorer_backend: outcome.scorer_backend.clone(),
        adjusted: outcome.adjusted,
        resume_sha256: new.resume_sha256.to_string(),
        resume_s3_key: new.resume_s3_key.to_string(),
        report_s3_key: None,
        created_at: Utc::now(),
    })
}

/// Screens one resume against one job.
///
/// Identical (resume text, job) pairs are answered from Redis or the database
/// without calling the model again.
pub async fn run_match(
    state: &AppState,
    upload: ResumeUpload,
    job: JobRequirements,
) -> Result<MatchResponse, AppError> {
    // 1. Validate inputs
    check_upload_size(upload.bytes.len(), state.config.max_upload_bytes)?;
    job.validate()?;

    // 2. Extract text
    let document = extract_document_blocking(
        upload.filename.clone(),
        upload.content_type.clone(),
        upload.bytes.clone(),
    )
    .await?;
    let fp = fingerprint(&document.text, &job);
    info!(
        "Extracted {} words from {:?} resume, fingerprint {}",
        document.word_count, document.format, fp
    );

    // 3. Cache, then previous screenings
    match get_cached_match::<MatchResponse>(&state.redis, &fp).await {
        Ok(Some(mut hit)) => {
            info!("Match cache hit for {fp}");
            hit.cached = true;
            return Ok(hit);
        }
        Ok(None) => {}
        Err(e) => warn!("Match cache lookup failed, continuing: {e}"),
    }
    if let Some(row) = store::find_by_fingerprint(&state.db, &fp).await? {
        info!("Reusing stored match {} for {fp}", row.id);
        let response = MatchResponse::from_row(&row, true)?;
        remember(state, &fp, &response).await;
        return Ok(response);
    }

    // 4. Candidate, evidence, score
    let (candidate, outcome) = screen_resume(
        &state.llm,
        state.match_scorer.as_ref(),
        &document.text,
        &job,
        &fp,
    )
    .await?;
    let match_id = Uuid::new_v4();
    info!(
        "Match {match_id}: score {} ({}) via {}",
        outcome.overall_score,
        outcome.recommendation.as_str(),
        outcome.scorer_backend
    );

    // 5. Keep the original, then persist; the first row per fingerprint wins
    let resume_s3_key = resume_key(match_id, document.format.extension());
    put_blob(
        &state.s3,
        &state.config.s3_bucket,
        &resume_s3_key,
        upload.bytes.to_vec(),
        document.format.content_type(),
    )
    .await?;

    let row = build_row(NewMatch {
        id: match_id,
        job: &job,
        candidate: &candidate,
        outcome: &outcome,
        resume_sha256: &document.sha256,
        resume_s3_key: &resume_s3_key,
    })?;
    if !store::insert_match(&state.db, &row).await? {
        info!("Concurrent screening already stored {fp}, discarding match {match_id}");
        if let Err(e) = delete_blob(&state.s3, &state.config.s3_bucket, &resume_s3_key).await {
            warn!("Could not remove unused resume {resume_s3_key}: {e}");
        }
        let winner = store::find_by_fingerprint(&state.db, &fp).await?;
        let response = stored_winner(winner, &fp)?;
        remember(state, &fp, &response).await;
        return Ok(response);
    }

    let response = MatchResponse::from_row(&row, false)?;

    // 6. Report and cache are best-effort; the match itself is already stored
    if let Err(e) = publish_report(state, &response, None).await {
        warn!("Report upload for match {match_id} failed: {e}");
    }
    remember(state, &fp, &response).await;

    Ok(response)
}

/// Extracts the candidate and scores them. Nothing is stored here, so a failure
/// leaves no trace in S3 or the database.
pub async fn screen_resume(
    llm: &LlmClient,
    scorer: &dyn MatchScorer,
    resume_text: &str,
    job: &JobRequirements,
    fp: &str,
) -> Result<(ExtractedCandidate, MatchOutcome), AppError> {
    let candidate = extract_candidate(resume_text, llm).await?;
    let evidence = compute_evidence(&candidate, resume_text, job);
    let outcome = scorer
        .score(&ScoringInput {
            candidate: &candidate,
            resume_text,
            job,
            evidence: &evidence,
            fingerprint: fp,
        })
        .await?;
    Ok((candidate, outcome))
}

/// The row that won an insert race on `fp`, served as a cached result.
fn stored_winner(winner: Option<MatchResultRow>, fp: &str) -> Result<MatchResponse, AppError> {
    let row = winner.ok_or_else(|| {
        AppError::Internal(anyhow::anyhow!(
            "Insert for {fp} conflicted but no stored match was found"
        ))
    })?;
    MatchResponse::from_row(&row, true)
}

async fn remember(state: &AppState, fp: &str, response: &MatchResponse) {
    let mut stored = response.clone();
    stored.cached = false;
    if let Err(e) = cache_match(
        &state.redis,
        fp,
        &stored,
        state.config.match_cache_ttl_secs,
    )
    .await
    {
        warn!("Match cache write failed for {fp}: {e}");
    }
}
