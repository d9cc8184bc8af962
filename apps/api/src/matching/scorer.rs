//! Match scoring: pluggable, trait-based scorer producing a `MatchOutcome`.
//!
//! Default: `LlmMatchScorer` (model-assisted, reconciled into the point budget).
//! Alternative: `KeywordMatchScorer` (pure-Rust, deterministic, fully testable).
//! The LLM scorer falls back to the keyword scorer whenever the model call fails.
//!
//! `AppState` holds an `Arc<dyn MatchScorer>`, selected at startup via config.

use std::collections::HashSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::AppError;
use crate::llm_client::prompts::{system_prompt, EVIDENCE_INSTRUCTION, FAIRNESS_INSTRUCTION};
use crate::llm_client::LlmClient;
use crate::matching::budget::{
    anchor_bands, reconcile, Band, CategoryScore, ProposedScore, ScoreCategory,
};
use crate::matching::evidence::{normalize_skill, Evidence};
use crate::matching::prompts::{MATCH_PROMPT_TEMPLATE, MATCH_ROLE, MATCH_SCHEMA};
use crate::models::candidate::ExtractedCandidate;
use crate::models::job::JobRequirements;
use crate::screening::candidate_parser::truncate_chars;

const MAX_LIST_ITEMS: usize = 6;
/// Resume characters included in the match prompt.
const MATCH_RESUME_EXCERPT_CHARS: usize = 6_000;
const TITLE_STOPWORDS: &[&str] = &["and", "the", "for", "with", "of", "in", "at", "to", "a"];

// ────────────────────────────────────────────────────────────────────────────
// Output data models (shared across all scorer backends)
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    StrongMatch,
    GoodMatch,
    PartialMatch,
    WeakMatch,
}

impl Recommendation {
    pub fn from_score(score: u8) -> Self {
        match score {
            80.. => Recommendation::StrongMatch,
            65..=79 => Recommendation::GoodMatch,
            45..=64 => Recommendation::PartialMatch,
            _ => Recommendation::WeakMatch,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Recommendation::StrongMatch => "strong_match",
            Recommendation::GoodMatch => "good_match",
            Recommendation::PartialMatch => "partial_match",
            Recommendation::WeakMatch => "weak_match",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Recommendation::StrongMatch => "Strong match",
            Recommendation::GoodMatch => "Good match",
            Recommendation::PartialMatch => "Partial match",
            Recommendation::WeakMatch => "Weak match",
        }
    }
}

/// Final, reconciled result of scoring one candidate against one job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchOutcome {
    pub overall_score: u8,
    pub categories: Vec<CategoryScore>,
    pub strengths: Vec<String>,
    pub concerns: Vec<String>,
    pub summary: String,
    pub recommendation: Recommendation,
    pub evidence: Evidence,
    pub fingerprint: String,
    pub scorer_backend: String, // "llm" | "keyword"
    pub adjusted: bool,
}

/// What the model returns, validated against `MATCH_SCHEMA`.
#[derive(Debug, Clone, Deserialize)]
pub struct MatchAssessment {
    pub overall_score: i64,
    pub categories: CategoryAssessments,
    pub strengths: Vec<String>,
    pub concerns: Vec<String>,
    pub summary: String,
    /// Advisory only; the final recommendation follows the reconciled score.
    #[serde(default)]
    pub recommendation: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryAssessments {
    pub skills: CategoryAssessment,
    pub experience: CategoryAssessment,
    pub education: CategoryAssessment,
    pub role_fit: CategoryAssessment,
    pub extras: CategoryAssessment,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryAssessment {
    pub points: i64,
    pub rationale: String,
}

impl MatchAssessment {
    fn proposed_scores(&self) -> Vec<ProposedScore> {
        let c = &self.categories;
        [
            (ScoreCategory::Skills, &c.skills),
            (ScoreCategory::Experience, &c.experience),
            (ScoreCategory::Education, &c.education),
            (ScoreCategory::RoleFit, &c.role_fit),
            (ScoreCategory::Extras, &c.extras),
        ]
        .into_iter()
        .map(|(category, a)| ProposedScore {
            category,
            points: a.points,
            rationale: a.rationale.trim().to_string(),
        })
        .collect()
    }
}

/// Everything a scorer needs about one screening.
pub struct ScoringInput<'a> {
    pub candidate: &'a ExtractedCandidate,
    pub resume_text: &'a str,
    pub job: &'a JobRequirements,
    pub evidence: &'a Evidence,
    pub fingerprint: &'a str,
}

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

/// The match scorer trait. Implement this to swap backends without touching
/// the pipeline or handlers.
#[async_trait]
pub trait MatchScorer: Send + Sync {
    async fn score(&self, input: &ScoringInput<'_>) -> Result<MatchOutcome, AppError>;
}

// ────────────────────────────────────────────────────────────────────────────
// KeywordMatchScorer
// ────────────────────────────────────────────────────────────────────────────

/// Deterministic scorer: band midpoints for evidence-backed categories,
/// title overlap for role fit, certifications/languages for extras.
pub struct KeywordMatchScorer;

#[async_trait]
impl MatchScorer for KeywordMatchScorer {
    async fn score(&self, input: &ScoringInput<'_>) -> Result<MatchOutcome, AppError> {
        Ok(keyword_outcome(input))
    }
}

pub fn keyword_outcome(input: &ScoringInput<'_>) -> MatchOutcome {
    let evidence = input.evidence;
    let bands = anchor_bands(evidence);

    let role_ratio = title_overlap(&input.job.title, input.candidate);
    let role_points = (ScoreCategory::RoleFit.max_points() as f32 * role_ratio).round() as i64;

    let extras_points = ((5.0 * evidence.preferred_coverage).round() as i64
        + input.candidate.certifications.len().min(3) as i64
        + if input.candidate.languages.len() > 1 { 2 } else { 0 })
    .min(ScoreCategory::Extras.max_points() as i64);

    let proposed = vec![
        ProposedScore {
            category: ScoreCategory::Skills,
            points: bands[0].midpoint() as i64,
            rationale: skills_rationale(evidence),
        },
        ProposedScore {
            category: ScoreCategory::Experience,
            points: bands[1].midpoint() as i64,
            rationale: experience_rationale(evidence, input.job),
        },
        ProposedScore {
            category: ScoreCategory::Education,
            points: bands[2].midpoint() as i64,
            rationale: match evidence.education_met {
                Some(true) => "Education meets the stated requirement".to_string(),
                Some(false) => "Education below the stated requirement".to_string(),
                None => "Education requirement not comparable".to_string(),
            },
        },
        ProposedScore {
            category: ScoreCategory::RoleFit,
            points: role_points,
            rationale: format!("{:.0}% of the job title terms appear in past titles", role_ratio * 100.0),
        },
        ProposedScore {
            category: ScoreCategory::Extras,
            points: extras_points,
            rationale: format!(
                "{} certifications, {} languages, {:.0}% of preferred skills",
                input.candidate.certifications.len(),
                input.candidate.languages.len(),
                evidence.preferred_coverage * 100.0
            ),
        },
    ];
    let proposed_overall = proposed.iter().map(|p| p.points).sum();

    let reconciled = reconcile(&proposed, proposed_overall, &bands, input.fingerprint);
    let (strengths, concerns) = keyword_strengths_concerns(evidence, input.job);
    let recommendation = Recommendation::from_score(reconciled.overall);

    let summary = format!(
        "{} matches {} of {} required skills with {:.1} years of experience. {}.",
        input.candidate.display_name(),
        evidence.required_matched.len(),
        evidence.required_matched.len() + evidence.required_missing.len(),
        evidence.candidate_years,
        recommendation.label()
    );

    MatchOutcome {
        overall_score: reconciled.overall,
        categories: reconciled.categories,
        strengths,
        concerns,
        summary,
        recommendation,
        evidence: evidence.clone(),
        fingerprint: input.fingerprint.to_string(),
        scorer_backend: "keyword".to_string(),
        adjusted: reconciled.adjusted,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// LlmMatchScorer
// ────────────────────────────────────────────────────────────────────────────

/// Model-assisted scorer. The model proposes points; the point budget decides.
pub struct LlmMatchScorer {
    llm: LlmClient,
    fallback: KeywordMatchScorer,
}

impl LlmMatchScorer {
    pub fn new(llm: LlmClient) -> Self {
        Self {
            llm,
            fallback: KeywordMatchScorer,
        }
    }
}

#[async_trait]
impl MatchScorer for LlmMatchScorer {
    async fn score(&self, input: &ScoringInput<'_>) -> Result<MatchOutcome, AppError> {
        let bands = anchor_bands(input.evidence);
        let prompt = build_match_prompt(input, &bands)?;

        let assessment: MatchAssessment = match self
            .llm
            .call_validated(&prompt, &system_prompt(MATCH_ROLE), &MATCH_SCHEMA)
            .await
        {
            Ok(a) => a,
            Err(e) => {
                warn!(
                    "LLM match scoring failed for {}, using keyword scorer: {e}",
                    input.fingerprint
                );
                return self.fallback.score(input).await;
            }
        };

        Ok(outcome_from_assessment(assessment, input, &bands))
    }
}

/// Reconciles a model assessment into a final outcome.
pub fn outcome_from_assessment(
    assessment: MatchAssessment,
    input: &ScoringInput<'_>,
    bands: &[Band; 5],
) -> MatchOutcome {
    let reconciled = reconcile(
        &assessment.proposed_scores(),
        assessment.overall_score,
        bands,
        input.fingerprint,
    );
    info!(
        "LLM match score {} -> {} (adjusted={}) for {}",
        assessment.overall_score, reconciled.overall, reconciled.adjusted, input.fingerprint
    );
    let recommendation = Recommendation::from_score(reconciled.overall);
    if let Some(proposed) = assessment.recommendation.as_deref() {
        if proposed != recommendation.as_str() {
            debug!(
                "Model recommended {proposed}, reconciled score gives {}",
                recommendation.as_str()
            );
        }
    }

    MatchOutcome {
        overall_score: reconciled.overall,
        categories: reconciled.categories,
        strengths: clean_list(assessment.strengths),
        concerns: clean_list(assessment.concerns),
        summary: assessment.summary.trim().to_string(),
        recommendation,
        evidence: input.evidence.clone(),
        fingerprint: input.fingerprint.to_string(),
        scorer_backend: "llm".to_string(),
        adjusted: reconciled.adjusted,
    }
}

fn build_match_prompt(input: &ScoringInput<'_>, bands: &[Band; 5]) -> Result<String, AppError> {
    let to_json = |value: serde_json::Value| {
        serde_json::to_string_pretty(&value)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to serialize prompt data: {e}")))
    };

    let bands_json = to_json(serde_json::Value::Object(
        ScoreCategory::ALL
            .iter()
            .zip(bands.iter())
            .map(|(category, band)| {
                (
                    category_key(*category).to_string(),
                    serde_json::json!([band.floor, band.ceiling]),
                )
            })
            .collect(),
    ))?;
    let job_json = to_json(serde_json::to_value(input.job).map_err(anyhow::Error::from)?)?;
    let candidate_json =
        to_json(serde_json::to_value(input.candidate).map_err(anyhow::Error::from)?)?;
    let evidence_json = to_json(serde_json::to_value(input.evidence).map_err(anyhow::Error::from)?)?;

    Ok(MATCH_PROMPT_TEMPLATE
        .replace("{fairness_instruction}", FAIRNESS_INSTRUCTION)
        .replace("{evidence_instruction}", EVIDENCE_INSTRUCTION)
        .replace("{bands_json}", &bands_json)
        .replace("{job_json}", &job_json)
        .replace("{candidate_json}", &candidate_json)
        .replace("{evidence_json}", &evidence_json)
        .replace(
            "{resume_excerpt}",
            truncate_chars(input.resume_text, MATCH_RESUME_EXCERPT_CHARS),
        ))
}

fn category_key(category: ScoreCategory) -> &'static str {
    match category {
        ScoreCategory::Skills => "skills",
        ScoreCategory::Experience => "experience",
        ScoreCategory::Education => "education",
        ScoreCategory::RoleFit => "role_fit",
        ScoreCategory::Extras => "extras",
    }
}

/// Share of meaningful job-title tokens found in any of the candidate's titles.
fn title_overlap(job_title: &str, candidate: &ExtractedCandidate) -> f32 {
    let tokens = |text: &str| -> HashSet<String> {
        normalize_skill(text)
            .split_whitespace()
            .filter(|t| t.len() > 1 && !TITLE_STOPWORDS.contains(t))
            .map(str::to_string)
            .collect()
    };

    let wanted = tokens(job_title);
    if wanted.is_empty() {
        return 0.0;
    }
    let held: HashSet<String> = candidate.titles().flat_map(|t| tokens(t)).collect();
    wanted.intersection(&held).count() as f32 / wanted.len() as f32
}

fn skills_rationale(evidence: &Evidence) -> String {
    let total = evidence.required_matched.len() + evidence.required_missing.len();
    if total == 0 {
        return "No required skills listed".to_string();
    }
    format!(
        "{} of {} required skills found",
        evidence.required_matched.len(),
        total
    )
}

fn experience_rationale(evidence: &Evidence, job: &JobRequirements) -> String {
    match job.min_years_experience {
        Some(min) if min > 0.0 => format!(
            "{:.1} years against {:.1} required",
            evidence.candidate_years, min
        ),
        _ => format!("{:.1} years, no minimum stated", evidence.candidate_years),
    }
}

fn keyword_strengths_concerns(
    evidence: &Evidence,
    job: &JobRequirements,
) -> (Vec<String>, Vec<String>) {
    let mut strengths = Vec::new();
    let mut concerns = Vec::new();

    if !evidence.required_matched.is_empty() {
        strengths.push(format!(
            "Has required skills: {}",
            evidence.required_matched.join(", ")
        ));
    }
    if !evidence.preferred_matched.is_empty() {
        strengths.push(format!(
            "Has preferred skills: {}",
            evidence.preferred_matched.join(", ")
        ));
    }
    if !evidence.required_missing.is_empty() {
        concerns.push(format!(
            "Missing required skills: {}",
            evidence.required_missing.join(", ")
        ));
    }
    if let Some(min) = job.min_years_experience {
        if evidence.candidate_years >= min {
            strengths.push(format!("Meets the {min:.0}+ years experience requirement"));
        } else {
            concerns.push(format!(
                "{:.1} years of experience against {min:.0} required",
                evidence.candidate_years
            ));
        }
    }
    if evidence.education_met == Some(false) {
        concerns.push("Education below the stated requirement".to_string());
    }

    (strengths, concerns)
}

fn clean_list(items: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty() && seen.insert(s.to_lowercase()))
        .take(MAX_LIST_ITEMS)
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::stub::{spawn_stub, StubReply};
    use crate::matching::evidence::compute_evidence;
    use crate::matching::fingerprint::fingerprint;
    use crate::models::candidate::WorkHistoryItem;

    const RESUME: &str = "Jane Doe. Senior Backend Engineer. Rust, PostgreSQL, Docker.";

    fn candidate() -> ExtractedCandidate {
        ExtractedCandidate {
            full_name: Some("Jane Doe".to_string()),
            headline: Some("Senior Backend Engineer".to_string()),
            total_years_experience: 6.0,
            skills: vec!["Rust".to_string(), "PostgreSQL".to_string(), "Docker".to_string()],
            work_history: vec![WorkHistoryItem {
                company: "Acme".to_string(),
                title: "Backend Engineer".to_string(),
                ..Default::default()
            }],
            certifications: vec!["CKA".to_string()],
            languages: vec!["English".to_string(), "German".to_string()],
            ..Default::default()
        }
    }

    fn job() -> JobRequirements {
        JobRequirements {
            title: "Senior Backend Engineer".to_string(),
            description: "Own our Rust services".to_string(),
            required_skills: vec!["Rust".to_string(), "PostgreSQL".to_string(), "Kafka".to_string()],
            preferred_skills: vec!["Docker".to_string()],
            min_years_experience: Some(5.0),
            ..Default::default()
        }
    }

    fn assessment(points: [i64; 5], overall: i64) -> MatchAssessment {
        let a = |p: i64| CategoryAssessment {
            points: p,
            rationale: format!("  {p} points "),
        };
        MatchAssessment {
            overall_score: overall,
            categories: CategoryAssessments {
                skills: a(points[0]),
                experience: a(points[1]),
                education: a(points[2]),
                role_fit: a(points[3]),
                extras: a(points[4]),
            },
            strengths: vec!["Rust".to_string(), " rust ".to_string(), "".to_string()],
            concerns: (0..9).map(|i| format!("concern {i}")).collect(),
            summary: "  Good fit.  ".to_string(),
            recommendation: Some("strong_match".to_string()),
        }
    }

    #[test]
    fn test_recommendation_thresholds() {
        assert_eq!(Recommendation::from_score(100), Recommendation::StrongMatch);
        assert_eq!(Recommendation::from_score(80), Recommendation::StrongMatch);
        assert_eq!(Recommendation::from_score(79), Recommendation::GoodMatch);
        assert_eq!(Recommendation::from_score(65), Recommendation::GoodMatch);
        assert_eq!(Recommendation::from_score(64), Recommendation::PartialMatch);
        assert_eq!(Recommendation::from_score(45), Recommendation::PartialMatch);
        assert_eq!(Recommendation::from_score(44), Recommendation::WeakMatch);
        assert_eq!(Recommendation::from_score(0), Recommendation::WeakMatch);
    }

    #[tokio::test]
    async fn test_keyword_scorer_is_deterministic_and_consistent() {
        let c = candidate();
        let j = job();
        let ev = compute_evidence(&c, RESUME, &j);
        let fp = fingerprint(RESUME, &j);
        let input = ScoringInput {
            candidate: &c,
            resume_text: RESUME,
            job: &j,
            evidence: &ev,
            fingerprint: &fp,
        };

        let a = KeywordMatchScorer.score(&input).await.unwrap();
        let b = KeywordMatchScorer.score(&input).await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.scorer_backend, "keyword");

        let total: u32 = a.categories.iter().map(|c| c.points as u32).sum();
        assert_eq!(total, a.overall_score as u32);
        assert_eq!(a.recommendation, Recommendation::from_score(a.overall_score));
        assert!(a.concerns.iter().any(|c| c.contains("Kafka")));
        assert!(a.strengths.iter().any(|s| s.contains("Rust")));
    }

    #[tokio::test]
    async fn test_llm_scorer_falls_back_to_keywords_on_bad_output() {
        let stub = spawn_stub(vec![StubReply::Text("I cannot score this.".to_string())]).await;
        let c = candidate();
        let j = job();
        let ev = compute_evidence(&c, RESUME, &j);
        let fp = fingerprint(RESUME, &j);
        let input = ScoringInput {
            candidate: &c,
            resume_text: RESUME,
            job: &j,
            evidence: &ev,
            fingerprint: &fp,
        };

        let outcome = LlmMatchScorer::new(stub.client.clone())
            .score(&input)
            .await
            .unwrap();
        assert_eq!(outcome.scorer_backend, "keyword");
        assert_eq!(outcome, KeywordMatchScorer.score(&input).await.unwrap());
        assert_eq!(stub.hits(), 1);
    }

    #[tokio::test]
    async fn test_llm_scorer_reconciles_valid_assessment() {
        let reply = serde_json::json!({
            "overall_score": 100,
            "categories": {
                "skills": {"points": 40, "rationale": "all"},
                "experience": {"points": 25, "rationale": "senior"},
                "education": {"points": 15, "rationale": "n/a"},
                "role_fit": {"points": 10, "rationale": "same title"},
                "extras": {"points": 10, "rationale": "CKA"}
            },
            "strengths": ["Rust"],
            "concerns": ["No Kafka"],
            "summary": "Strong backend profile."
        });
        let stub = spawn_stub(vec![StubReply::Text(reply.to_string())]).await;
        let c = candidate();
        let j = job();
        let ev = compute_evidence(&c, RESUME, &j);
        let fp = fingerprint(RESUME, &j);
        let input = ScoringInput {
            candidate: &c,
            resume_text: RESUME,
            job: &j,
            evidence: &ev,
            fingerprint: &fp,
        };

        let outcome = LlmMatchScorer::new(stub.client.clone())
            .score(&input)
            .await
            .unwrap();
        assert_eq!(outcome.scorer_backend, "llm");
        assert!(outcome.adjusted);
        let total: u32 = outcome.categories.iter().map(|c| c.points as u32).sum();
        assert_eq!(total, outcome.overall_score as u32);
        assert!(stub.prompts()[0].contains("Senior Backend Engineer"));
    }

    #[test]
    fn test_keyword_role_fit_full_title_overlap() {
        let ratio = title_overlap("Senior Backend Engineer", &candidate());
        assert_eq!(ratio, 1.0);
        let partial = title_overlap("Staff Data Engineer", &candidate());
        assert!((partial - 1.0 / 3.0).abs() < 1e-6);
        assert_eq!(title_overlap("", &candidate()), 0.0);
    }

    #[test]
    fn test_assessment_outcome_respects_bands() {
        let c = candidate();
        let j = job();
        let ev = compute_evidence(&c, RESUME, &j);
        let bands = anchor_bands(&ev);
        let input = ScoringInput {
            candidate: &c,
            resume_text: RESUME,
            job: &j,
            evidence: &ev,
            fingerprint: "42ab",
        };

        // model over-scores skills although Kafka is missing, and claims 100 overall
        let outcome = outcome_from_assessment(assessment([40, 25, 15, 10, 10], 100), &input, &bands);

        assert_eq!(outcome.scorer_backend, "llm");
        for (score, band) in outcome.categories.iter().zip(bands.iter()) {
            assert!(score.points >= band.floor && score.points <= band.ceiling);
        }
        let total: u32 = outcome.categories.iter().map(|c| c.points as u32).sum();
        assert_eq!(total, outcome.overall_score as u32);
        assert!(outcome.overall_score < 100);
        assert!(outcome.adjusted);
    }

    #[test]
    fn test_assessment_lists_are_cleaned() {
        let c = candidate();
        let j = job();
        let ev = compute_evidence(&c, RESUME, &j);
        let bands = anchor_bands(&ev);
        let input = ScoringInput {
            candidate: &c,
            resume_text: RESUME,
            job: &j,
            evidence: &ev,
            fingerprint: "00",
        };
        let outcome = outcome_from_assessment(assessment([20, 15, 8, 6, 5], 54), &input, &bands);
        assert_eq!(outcome.strengths, vec!["Rust".to_string()]);
        assert_eq!(outcome.concerns.len(), MAX_LIST_ITEMS);
        assert_eq!(outcome.summary, "Good fit.");
        assert_eq!(outcome.categories[0].rationale, "20 points");
    }

    #[test]
    fn test_match_prompt_includes_bands_and_evidence() {
        let c = candidate();
        let j = job();
        let ev = compute_evidence(&c, RESUME, &j);
        let bands = anchor_bands(&ev);
        let input = ScoringInput {
            candidate: &c,
            resume_text: RESUME,
            job: &j,
            evidence: &ev,
            fingerprint: "00",
        };
        let prompt = build_match_prompt(&input, &bands).unwrap();
        assert!(prompt.contains("\"role_fit\""));
        assert!(prompt.contains("Kafka"));
        assert!(!prompt.contains("{bands_json}"));
        assert!(!prompt.contains("{candidate_json}"));
    }
}
