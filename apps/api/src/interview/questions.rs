use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::interview::prompts::{INTERVIEW_PROMPT_TEMPLATE, INTERVIEW_ROLE, QUESTIONS_SCHEMA};
use crate::llm_client::prompts::{system_prompt, FAIRNESS_INSTRUCTION};
use crate::llm_client::{LlmClient, LlmError};
use crate::matching::evidence::normalize_skill;
use crate::matching::scorer::MatchOutcome;
use crate::models::candidate::ExtractedCandidate;
use crate::models::job::JobRequirements;
use crate::models::match_result::InterviewQuestionSetRow;

const MIN_QUESTION_CHARS: usize = 10;
const MAX_GAP_PROBES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    Technical,
    Behavioral,
    GapProbe,
    Situational,
}

impl QuestionKind {
    pub fn label(self) -> &'static str {
        match self {
            QuestionKind::Technical => "Technical",
            QuestionKind::Behavioral => "Behavioral",
            QuestionKind::GapProbe => "Gap probe",
            QuestionKind::Situational => "Situational",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterviewQuestion {
    pub kind: QuestionKind,
    pub question: String,
    #[serde(default)]
    pub rationale: String,
    #[serde(default)]
    pub related_skill: Option<String>,
}

impl InterviewQuestion {
    fn new(kind: QuestionKind, question: String, rationale: &str, skill: Option<&str>) -> Self {
        Self {
            kind,
            question,
            rationale: rationale.to_string(),
            related_skill: skill.map(str::to_string),
        }
    }

    fn probes(&self, skill: &str) -> bool {
        if self.kind != QuestionKind::GapProbe {
            return false;
        }
        let wanted = normalize_skill(skill);
        self.related_skill
            .as_deref()
            .is_some_and(|s| normalize_skill(s) == wanted)
            || format!(" {} ", normalize_skill(&self.question)).contains(&format!(" {wanted} "))
    }
}

/// A stored set of questions for one match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterviewQuestionSet {
    pub id: Uuid,
    pub match_id: Uuid,
    pub questions: Vec<InterviewQuestion>,
    /// "llm" or "template".
    pub generated_by: String,
    pub created_at: DateTime<Utc>,
}

impl InterviewQuestionSet {
    pub fn new(match_id: Uuid, questions: Vec<InterviewQuestion>, generated_by: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            match_id,
            questions,
            generated_by: generated_by.to_string(),
            created_at: Utc::now(),
        }
    }

    pub fn to_row(&self) -> Result<InterviewQuestionSetRow, AppError> {
        Ok(InterviewQuestionSetRow {
            id: self.id,
            match_id: self.match_id,
            questions: serde_json::to_value(&self.questions).map_err(anyhow::Error::from)?,
            generated_by: self.generated_by.clone(),
            created_at: self.created_at,
        })
    }

    pub fn from_row(row: InterviewQuestionSetRow) -> Result<Self, AppError> {
        let questions = serde_json::from_value(row.questions).map_err(|e| {
            AppError::Internal(anyhow::anyhow!(
                "Stored question set {} is malformed: {e}",
                row.id
            ))
        })?;
        Ok(Self {
            id: row.id,
            match_id: row.match_id,
            questions,
            generated_by: row.generated_by,
            created_at: row.created_at,
        })
    }
}

#[derive(Deserialize)]
struct QuestionsResponse {
    questions: Vec<InterviewQuestion>,
}

/// Asks the model for `count` questions, then cleans them up.
pub async fn generate_questions(
    llm: &LlmClient,
    outcome: &MatchOutcome,
    candidate: &ExtractedCandidate,
    job: &JobRequirements,
    count: usize,
) -> Result<Vec<InterviewQuestion>, LlmError> {
    let to_json = |value: serde_json::Result<serde_json::Value>| {
        value
            .and_then(|v| serde_json::to_string_pretty(&v))
            .map_err(LlmError::Parse)
    };
    let match_json = to_json(Ok(json!({
        "overall_score": outcome.overall_score,
        "strengths": outcome.strengths,
        "concerns": outcome.concerns,
        "missing_required_skills": outcome.evidence.required_missing,
        "missing_preferred_skills": outcome.evidence.preferred_missing,
    })))?;

    let prompt = INTERVIEW_PROMPT_TEMPLATE
        .replace("{fairness_instruction}", FAIRNESS_INSTRUCTION)
        .replace("{count}", &count.to_string())
        .replace("{job_json}", &to_json(serde_json::to_value(job))?)
        .replace("{candidate_json}", &to_json(serde_json::to_value(candidate))?)
        .replace("{match_json}", &match_json);

    let response: QuestionsResponse = llm
        .call_validated(&prompt, &system_prompt(INTERVIEW_ROLE), &QUESTIONS_SCHEMA)
        .await?;

    info!(
        "Model returned {} interview questions (requested {count})",
        response.questions.len()
    );
    Ok(post_process_questions(
        response.questions,
        count,
        &outcome.evidence.required_missing,
    ))
}

/// Trims, de-duplicates, guarantees gap probes for missing skills and cuts to `count`.
pub fn post_process_questions(
    questions: Vec<InterviewQuestion>,
    count: usize,
    missing_skills: &[String],
) -> Vec<InterviewQuestion> {
    let mut seen = HashSet::new();
    let mut cleaned: Vec<InterviewQuestion> = questions
        .into_iter()
        .map(|q| InterviewQuestion {
            kind: q.kind,
            question: q.question.split_whitespace().collect::<Vec<_>>().join(" "),
            rationale: q.rationale.trim().to_string(),
            related_skill: q
                .related_skill
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
        })
        .filter(|q| q.question.chars().count() >= MIN_QUESTION_CHARS)
        .filter(|q| seen.insert(q.question.to_lowercase()))
        .collect();

    let probed_skills: Vec<&str> = missing_skills
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .take(MAX_GAP_PROBES)
        .collect();

    let mut probe_indices = Vec::new();
    for skill in &probed_skills {
        match cleaned.iter().position(|q| q.probes(skill)) {
            Some(idx) => probe_indices.push(idx),
            None => {
                cleaned.push(gap_probe_question(skill));
                probe_indices.push(cleaned.len() - 1);
            }
        }
    }

    truncate_keeping_kinds(cleaned, count, &probe_indices)
}

/// Keeps `count` questions in their original order. Priority: the first question of
/// every kind, then the gap probes in `priority`, then everything else in order.
fn truncate_keeping_kinds(
    questions: Vec<InterviewQuestion>,
    count: usize,
    priority: &[usize],
) -> Vec<InterviewQuestion> {
    if questions.len() <= count {
        return questions;
    }

    let mut keep = vec![false; questions.len()];
    let mut kept = 0;
    let mut mark = |idx: usize, keep: &mut Vec<bool>| {
        if kept < count && !keep[idx] {
            keep[idx] = true;
            kept += 1;
        }
    };

    let mut kinds_seen = HashSet::new();
    for (idx, q) in questions.iter().enumerate() {
        if kinds_seen.insert(q.kind) {
            mark(idx, &mut keep);
        }
    }
    for &idx in priority {
        mark(idx, &mut keep);
    }
    for idx in 0..questions.len() {
        mark(idx, &mut keep);
    }

    questions
        .into_iter()
        .zip(keep)
        .filter_map(|(q, k)| k.then_some(q))
        .collect()
}

fn gap_probe_question(skill: &str) -> InterviewQuestion {
    InterviewQuestion::new(
        QuestionKind::GapProbe,
        format!(
            "This role requires {skill}. What experience do you have with it, \
             and how would you get up to speed?"
        ),
        "Required skill not found on the resume",
        Some(skill),
    )
}

/// Deterministic questions used when the model is unavailable.
pub fn fallback_questions(
    outcome: &MatchOutcome,
    job: &JobRequirements,
    count: usize,
) -> Vec<InterviewQuestion> {
    let evidence = &outcome.evidence;
    let mut questions: Vec<InterviewQuestion> = Vec::new();

    for skill in evidence.required_matched.iter().take(3) {
        questions.push(InterviewQuestion::new(
            QuestionKind::Technical,
            format!(
                "Walk me through a recent project where you used {skill}. \
                 What was your specific contribution?"
            ),
            "Verifies depth in a required skill listed on the resume",
            Some(skill),
        ));
    }
    questions.push(InterviewQuestion::new(
        QuestionKind::Behavioral,
        "Tell me about a time you disagreed with a teammate on a technical decision. \
         How was it resolved?"
            .to_string(),
        "Collaboration and handling disagreement",
        None,
    ));
    questions.push(InterviewQuestion::new(
        QuestionKind::Situational,
        format!(
            "You join as {} and inherit a system with little documentation. \
             How do you approach your first month?",
            job.title.trim()
        ),
        "Onboarding approach and prioritisation",
        None,
    ));
    for concern in outcome.concerns.iter().take(2) {
        questions.push(InterviewQuestion::new(
            QuestionKind::GapProbe,
            format!("Our review noted: \"{concern}\". How would you address that in this role?"),
            "Follows up on a concern from the match assessment",
            None,
        ));
    }
    questions.push(InterviewQuestion::new(
        QuestionKind::Behavioral,
        "Describe a project that did not go as planned. What did you change afterwards?"
            .to_string(),
        "Learning from setbacks",
        None,
    ));
    questions.push(InterviewQuestion::new(
        QuestionKind::Situational,
        "A stakeholder asks for a deadline you believe is unrealistic. What do you do?"
            .to_string(),
        "Expectation management",
        None,
    ));
    for skill in evidence.preferred_missing.iter().take(2) {
        questions.push(InterviewQuestion::new(
            QuestionKind::Technical,
            format!("Have you worked with {skill}, or something comparable?"),
            "Preferred skill not found on the resume",
            Some(skill),
        ));
    }

    post_process_questions(questions, count, &evidence.required_missing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::evidence::Evidence;
    use crate::matching::scorer::Recommendation;

    fn q(kind: QuestionKind, text: &str) -> InterviewQuestion {
        InterviewQuestion::new(kind, text.to_string(), "why", None)
    }

    fn outcome(matched: &[&str], missing: &[&str]) -> MatchOutcome {
        MatchOutcome {
            overall_score: 58,
            categories: vec![],
            strengths: vec!["Solid Rust background".to_string()],
            concerns: vec!["No Kafka experience".to_string()],
            summary: "Partial fit.".to_string(),
            recommendation: Recommendation::PartialMatch,
            evidence: Evidence {
                required_matched: matched.iter().map(|s| s.to_string()).collect(),
                required_missing: missing.iter().map(|s| s.to_string()).collect(),
                ..Default::default()
            },
            fingerprint: "ab".repeat(32),
            scorer_backend: "keyword".to_string(),
            adjusted: false,
        }
    }

    fn job() -> JobRequirements {
        JobRequirements {
            title: "Platform Engineer".to_string(),
            required_skills: vec!["Rust".to_string(), "Kafka".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn test_short_and_duplicate_questions_are_dropped() {
        let out = post_process_questions(
            vec![
                q(QuestionKind::Technical, "  Why   Rust?  "),
                q(QuestionKind::Technical, "How do you structure error handling in Rust?"),
                q(QuestionKind::Technical, "how do you structure error handling in rust?"),
                q(QuestionKind::Behavioral, ""),
            ],
            10,
            &[],
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].question, "How do you structure error handling in Rust?");
    }

    #[test]
    fn test_missing_skill_gets_gap_probe() {
        let out = post_process_questions(
            vec![q(QuestionKind::Technical, "Describe your favourite Rust crate.")],
            5,
            &["Kafka".to_string()],
        );
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].kind, QuestionKind::GapProbe);
        assert_eq!(out[1].related_skill.as_deref(), Some("Kafka"));
    }

    #[test]
    fn test_existing_gap_probe_is_reused() {
        let out = post_process_questions(
            vec![q(QuestionKind::GapProbe, "What have you built with kafka streams?")],
            5,
            &["Kafka".to_string()],
        );
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn test_gap_probes_capped_at_three_skills() {
        let missing: Vec<String> = ["Kafka", "Go", "Terraform", "Kubernetes"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let out = post_process_questions(vec![], 10, &missing);
        assert_eq!(out.len(), 3);
        assert!(out.iter().all(|q| q.kind == QuestionKind::GapProbe));
    }

    #[test]
    fn test_truncation_keeps_every_kind() {
        let mut questions: Vec<InterviewQuestion> = (0..6)
            .map(|i| q(QuestionKind::Technical, &format!("Technical question number {i}")))
            .collect();
        questions.push(q(QuestionKind::Behavioral, "Tell me about a hard deadline."));
        questions.push(q(QuestionKind::Situational, "What if production goes down?"));

        let out = post_process_questions(questions, 4, &[]);
        assert_eq!(out.len(), 4);
        let kinds: HashSet<QuestionKind> = out.iter().map(|q| q.kind).collect();
        assert!(kinds.contains(&QuestionKind::Behavioral));
        assert!(kinds.contains(&QuestionKind::Situational));
        // original order survives
        assert_eq!(out[0].question, "Technical question number 0");
        assert_eq!(out[3].kind, QuestionKind::Situational);
    }

    #[test]
    fn test_fallback_questions_cover_gaps_and_count() {
        let out = fallback_questions(&outcome(&["Rust"], &["Kafka"]), &job(), 5);
        assert_eq!(out.len(), 5);
        assert!(out.iter().any(|q| q.probes("Kafka")));
        assert!(out.iter().any(|q| q.kind == QuestionKind::Technical));
        assert!(out.iter().any(|q| q.question.contains("Platform Engineer")));
    }

    #[test]
    fn test_fallback_questions_are_deterministic() {
        let a = fallback_questions(&outcome(&["Rust", "Go"], &["Kafka"]), &job(), 8);
        let b = fallback_questions(&outcome(&["Rust", "Go"], &["Kafka"]), &job(), 8);
        assert_eq!(a, b);
    }

    #[test]
    fn test_question_set_row_round_trip() {
        let set = InterviewQuestionSet::new(
            Uuid::new_v4(),
            vec![q(QuestionKind::Behavioral, "Tell me about a hard deadline.")],
            "template",
        );
        let back = InterviewQuestionSet::from_row(set.to_row().unwrap()).unwrap();
        assert_eq!(back.questions, set.questions);
        assert_eq!(back.generated_by, "template");
    }
}
