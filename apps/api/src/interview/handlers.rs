use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::interview::questions::{fallback_questions, generate_questions, InterviewQuestionSet};
use crate::matching::pipeline::MatchResponse;
use crate::matching::store;
use crate::report::publish_report;
use crate::state::AppState;

const MIN_QUESTIONS: usize = 3;
const MAX_QUESTIONS: usize = 15;

#[derive(Debug, Default, Deserialize)]
pub struct QuestionsRequest {
    pub count: Option<usize>,
}

/// POST /api/v1/matches/:id/interview-questions
pub async fn handle_generate_questions(
    State(state): State<AppState>,
    Path(match_id): Path<Uuid>,
    body: Bytes,
) -> Result<(StatusCode, Json<InterviewQuestionSet>), AppError> {
    let request = parse_questions_request(&body)?;
    let count = resolve_count(request.count, state.config.interview_question_count)?;

    let row = store::get_match(&state.db, match_id).await?;
    let response = MatchResponse::from_row(&row, false)?;

    let (questions, generated_by) = match generate_questions(
        &state.llm,
        &response.outcome,
        &response.candidate,
        &response.job,
        count,
    )
    .await
    {
        Ok(questions) if !questions.is_empty() => (questions, "llm"),
        Ok(_) => {
            warn!("Model returned no usable questions for match {match_id}, using templates");
            (fallback_questions(&response.outcome, &response.job, count), "template")
        }
        Err(e) => {
            warn!("Question generation failed for match {match_id}, using templates: {e}");
            (fallback_questions(&response.outcome, &response.job, count), "template")
        }
    };

    let set = InterviewQuestionSet::new(match_id, questions, generated_by);
    store::insert_question_set(&state.db, &set.to_row()?).await?;
    info!(
        "Stored {} interview questions ({generated_by}) for match {match_id}",
        set.questions.len()
    );

    if let Err(e) = publish_report(&state, &response, Some(set.questions.as_slice())).await {
        warn!("Report refresh for match {match_id} failed: {e}");
    }

    Ok((StatusCode::CREATED, Json(set)))
}

/// GET /api/v1/matches/:id/interview-questions
pub async fn handle_get_questions(
    State(state): State<AppState>,
    Path(match_id): Path<Uuid>,
) -> Result<Json<InterviewQuestionSet>, AppError> {
    let row = store::latest_question_set(&state.db, match_id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("No interview questions for match {match_id}"))
        })?;
    Ok(Json(InterviewQuestionSet::from_row(row)?))
}

/// An empty body means defaults; anything else must be a valid request object.
fn parse_questions_request(body: &[u8]) -> Result<QuestionsRequest, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(QuestionsRequest::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| AppError::Validation(format!("invalid interview questions request: {e}")))
}

fn resolve_count(requested: Option<usize>, default: usize) -> Result<usize, AppError> {
    let count = requested.unwrap_or(default);
    if !(MIN_QUESTIONS..=MAX_QUESTIONS).contains(&count) {
        return Err(AppError::Validation(format!(
            "count must be between {MIN_QUESTIONS} and {MAX_QUESTIONS}, got {count}"
        )));
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_count_defaults_and_bounds() {
        assert_eq!(resolve_count(None, 8).unwrap(), 8);
        assert_eq!(resolve_count(Some(3), 8).unwrap(), 3);
        assert_eq!(resolve_count(Some(15), 8).unwrap(), 15);
        assert!(resolve_count(Some(2), 8).is_err());
        assert!(resolve_count(Some(16), 8).is_err());
    }

    #[test]
    fn test_empty_body_uses_defaults() {
        assert_eq!(parse_questions_request(b"").unwrap().count, None);
        assert_eq!(parse_questions_request(b" \n").unwrap().count, None);
        assert_eq!(parse_questions_request(b"{}").unwrap().count, None);
        assert_eq!(parse_questions_request(br#"{"count": 5}"#).unwrap().count, Some(5));
    }

    #[test]
    fn test_malformed_body_is_rejected() {
        for body in [
            br#"{"count": -1}"#.as_slice(),
            br#"{"count": "ten"}"#.as_slice(),
            b"count=5".as_slice(),
        ] {
            let err = parse_questions_request(body).unwrap_err();
            assert!(matches!(err, AppError::Validation(_)), "got {err:?}");
        }
    }
}
