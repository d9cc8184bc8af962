use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// One screening of one resume against one job.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MatchResultRow {
    pub id: Uuid,
    pub fingerprint: String,
    pub job_id: Option<Uuid>,
    pub job_title: String,
    pub job: Value,
    pub candidate: Value,
    pub candidate_name: Option<String>,
    pub overall_score: i16,
    pub categories: Value,
    pub evidence: Value,
    pub strengths: Vec<String>,
    pub concerns: Vec<String>,
    pub summary: String,
    pub recommendation: String,
    pub scorer_backend: String,
    pub adjusted: bool,
    pub resume_sha256: String,
    pub resume_s3_key: String,
    pub report_s3_key: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InterviewQuestionSetRow {
    pub id: Uuid,
    pub match_id: Uuid,
    pub questions: Value,
    pub generated_by: String,
    pub created_at: DateTime<Utc>,
}
