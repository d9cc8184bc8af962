use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::Html,
    Json,
};
use uuid::Uuid;

use crate::errors::AppError;
use crate::interview::questions::InterviewQuestionSet;
use crate::matching::pipeline::{run_match, MatchResponse};
use crate::matching::store;
use crate::models::job::JobRequirements;
use crate::report::{render_match_report, report_input};
use crate::routes::multipart::read_upload_form;
use crate::state::AppState;

/// POST /api/v1/matches
/// 201 for a new screening, 200 when an identical one was reused.
pub async fn handle_create_match(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<MatchResponse>), AppError> {
    let mut form = read_upload_form(multipart).await?;
    let upload = form.require_resume()?;
    let job = parse_job(form.job.as_deref())?;

    let response = run_match(&state, upload, job).await?;
    let status = if response.cached {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    Ok((status, Json(response)))
}

/// GET /api/v1/matches/:id
pub async fn handle_get_match(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MatchResponse>, AppError> {
    let row = store::get_match(&state.db, id).await?;
    Ok(Json(MatchResponse::from_row(&row, false)?))
}

/// GET /api/v1/matches/:id/report
pub async fn handle_get_report(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Html<String>, AppError> {
    let row = store::get_match(&state.db, id).await?;
    let response = MatchResponse::from_row(&row, false)?;
    let questions = match store::latest_question_set(&state.db, id).await? {
        Some(set_row) => Some(InterviewQuestionSet::from_row(set_row)?.questions),
        None => None,
    };

    Ok(Html(render_match_report(report_input(
        &response,
        questions.as_deref(),
    ))))
}

fn parse_job(raw: Option<&str>) -> Result<JobRequirements, AppError> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::Validation("multipart field 'job' is required".to_string()))?;
    serde_json::from_str(raw).map_err(|e| AppError::Validation(format!("invalid job JSON: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_job_accepts_minimal_json() {
        let job = parse_job(Some(r#"{"title": "Data Engineer", "required_skills": ["SQL"]}"#))
            .unwrap();
        assert_eq!(job.title, "Data Engineer");
        assert_eq!(job.required_skills, vec!["SQL".to_string()]);
        assert!(job.preferred_skills.is_empty());
    }

    #[test]
    fn test_parse_job_rejects_missing_and_malformed() {
        assert!(matches!(parse_job(None), Err(AppError::Validation(_))));
        assert!(matches!(parse_job(Some("  ")), Err(AppError::Validation(_))));
        assert!(matches!(
            parse_job(Some(r#"{"description": "no title"}"#)),
            Err(AppError::Validation(_))
        ));
    }
}
