use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::match_result::{InterviewQuestionSetRow, MatchResultRow};

const INSERT_MATCH_SQL: &str = r#"
        INSERT INTO match_results
            (id, fingerprint, job_id, job_title, job, candidate, candidate_name,
             overall_score, categories, evidence, strengths, concerns, summary,
             recommendation, scorer_backend, adjusted, resume_sha256, resume_s3_key,
             report_s3_key, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16,
                $17, $18, $19, $20)
        ON CONFLICT (fingerprint) DO NOTHING
        "#;

/// Inserts a new match. Returns `false` when a match with the same fingerprint
/// already exists; the stored row is left untouched.
pub async fn insert_match(pool: &PgPool, row: &MatchResultRow) -> Result<bool, AppError> {
    let result = sqlx::query(INSERT_MATCH_SQL)
    .bind(row.id)
    .bind(&row.fingerprint)
    .bind(row.job_id)
    .bind(&row.job_title)
    .bind(&row.job)
    .bind(&row.candidate)
    .bind(&row.candidate_name)
    .bind(row.overall_score)
    .bind(&row.categories)
    .bind(&row.evidence)
    .bind(&row.strengths)
    .bind(&row.concerns)
    .bind(&row.summary)
    .bind(&row.recommendation)
    .bind(&row.scorer_backend)
    .bind(row.adjusted)
    .bind(&row.resume_sha256)
    .bind(&row.resume_s3_key)
    .bind(&row.report_s3_key)
    .bind(row.created_at)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() == 1)
}

pub async fn get_match(pool: &PgPool, id: Uuid) -> Result<MatchResultRow, AppError> {
    sqlx::query_as::<_, MatchResultRow>("SELECT * FROM match_results WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Match {id} not found")))
}

/// The match with this fingerprint, if the pair was screened before.
pub async fn find_by_fingerprint(
    pool: &PgPool,
    fingerprint: &str,
) -> Result<Option<MatchResultRow>, AppError> {
    Ok(sqlx::query_as::<_, MatchResultRow>(
        "SELECT * FROM match_results WHERE fingerprint = $1",
    )
    .bind(fingerprint)
    .fetch_optional(pool)
    .await?)
}

pub async fn set_report_key(pool: &PgPool, id: Uuid, key: &str) -> Result<(), AppError> {
    sqlx::query("UPDATE match_results SET report_s3_key = $1 WHERE id = $2")
        .bind(key)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Question sets are append-only; the latest one per match wins.
pub async fn insert_question_set(
    pool: &PgPool,
    row: &InterviewQuestionSetRow,
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO interview_question_sets (id, match_id, questions, generated_by, created_at)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(row.id)
    .bind(row.match_id)
    .bind(&row.questions)
    .bind(&row.generated_by)
    .bind(row.created_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn latest_question_set(
    pool: &PgPool,
    match_id: Uuid,
) -> Result<Option<InterviewQuestionSetRow>, AppError> {
    Ok(sqlx::query_as::<_, InterviewQuestionSetRow>(
        r#"
        SELECT * FROM interview_question_sets
        WHERE match_id = $1
        ORDER BY created_at DESC
        LIMIT 1
        "#,
    )
    .bind(match_id)
    .fetch_optional(pool)
    .await?)
}
