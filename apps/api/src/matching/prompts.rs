// Match scoring prompt templates and the fixed response schema.

use once_cell::sync::Lazy;
use serde_json::{json, Value};

use crate::matching::budget::ScoreCategory;

pub const MATCH_ROLE: &str = "You are a senior technical recruiter scoring how well a candidate \
    fits a job. You score conservatively and only from written evidence.";

/// Replace: {fairness_instruction}, {evidence_instruction}, {job_json}, {candidate_json},
///          {evidence_json}, {bands_json}, {resume_excerpt}
pub const MATCH_PROMPT_TEMPLATE: &str = r#"{fairness_instruction}

{evidence_instruction}

Score the candidate against the job using a fixed 100-point budget:
- skills (max 40): coverage and depth of the required and preferred skills
- experience (max 25): years and relevance of professional experience
- education (max 15): degree level and field against the requirement
- role_fit (max 10): similarity of past titles and responsibilities to this role
- extras (max 10): certifications, languages, notable achievements relevant to the role

The following bounds were computed from the resume and are binding.
Each category's points MUST lie within its [floor, ceiling]:
{bands_json}

JOB:
{job_json}

CANDIDATE PROFILE:
{candidate_json}

SKILL EVIDENCE (computed, authoritative):
{evidence_json}

RESUME EXCERPT (for checking claims only):
{resume_excerpt}

Return a JSON object with this EXACT schema:
{
  "overall_score": 72,
  "categories": {
    "skills": {"points": 30, "rationale": "Covers Rust and PostgreSQL; no Kafka"},
    "experience": {"points": 20, "rationale": "6 years backend, 4 required"},
    "education": {"points": 10, "rationale": "BSc Computer Science matches"},
    "role_fit": {"points": 7, "rationale": "Previous backend titles"},
    "extras": {"points": 5, "rationale": "AWS certification"}
  },
  "strengths": ["Strong Rust background"],
  "concerns": ["No Kafka experience"],
  "summary": "Two to three sentence hiring-manager summary.",
  "recommendation": "good_match"
}

HARD RULES:
1. overall_score MUST equal the sum of the five category points
2. Every category's points MUST stay within its bounds above
3. strengths and concerns: at most 6 items each, each one short sentence
4. Do NOT mention protected characteristics anywhere
5. Return ONLY the JSON object"#;

/// JSON Schema every match response must satisfy.
pub static MATCH_SCHEMA: Lazy<Value> = Lazy::new(|| {
    let category = |category: ScoreCategory| {
        json!({
            "type": "object",
            "required": ["points", "rationale"],
            "properties": {
                "points": {"type": "integer", "minimum": 0, "maximum": category.max_points()},
                "rationale": {"type": "string"}
            }
        })
    };
    let short_list = json!({"type": "array", "items": {"type": "string"}, "maxItems": 10});
    json!({
        "type": "object",
        "required": ["overall_score", "categories", "strengths", "concerns", "summary"],
        "properties": {
            "overall_score": {"type": "integer", "minimum": 0, "maximum": 100},
            "categories": {
                "type": "object",
                "required": ["skills", "experience", "education", "role_fit", "extras"],
                "properties": {
                    "skills": category(ScoreCategory::Skills),
                    "experience": category(ScoreCategory::Experience),
                    "education": category(ScoreCategory::Education),
                    "role_fit": category(ScoreCategory::RoleFit),
                    "extras": category(ScoreCategory::Extras)
                }
            },
            "strengths": short_list,
            "concerns": short_list,
            "summary": {"type": "string", "minLength": 1},
            "recommendation": {
                "type": "string",
                "enum": ["strong_match", "good_match", "partial_match", "weak_match"]
            }
        }
    })
});
