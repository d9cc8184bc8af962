pub mod html;

use chrono::Utc;
use tracing::info;

use crate::errors::AppError;
use crate::interview::questions::InterviewQuestion;
use crate::matching::pipeline::MatchResponse;
use crate::matching::store;
use crate::state::AppState;
use crate::storage::blobs::{put_blob, report_key};

pub use html::{render_match_report, ReportInput};

pub const REPORT_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// Builds the report input for a stored match.
pub fn report_input<'a>(
    response: &'a MatchResponse,
    questions: Option<&'a [InterviewQuestion]>,
) -> ReportInput<'a> {
    ReportInput {
        match_id: response.match_id,
        candidate_name: response.candidate.display_name(),
        job_title: &response.job_title,
        outcome: &response.outcome,
        questions,
        generated_at: Utc::now(),
    }
}

/// Renders the report, uploads it to `reports/{match_id}.html` and records the key.
pub async fn publish_report(
    state: &AppState,
    response: &MatchResponse,
    questions: Option<&[InterviewQuestion]>,
) -> Result<String, AppError> {
    let html = render_match_report(report_input(response, questions));
    let key = report_key(response.match_id);

    put_blob(
        &state.s3,
        &state.config.s3_bucket,
        &key,
        html.into_bytes(),
        REPORT_CONTENT_TYPE,
    )
    .await?;
    store::set_report_key(&state.db, response.match_id, &key).await?;

    info!("Published report for match {}", response.match_id);
    Ok(key)
}
