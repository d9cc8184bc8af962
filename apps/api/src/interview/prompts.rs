use once_cell::sync::Lazy;
use serde_json::{json, Value};

pub const INTERVIEW_ROLE: &str = "You are an experienced hiring manager preparing a structured \
    interview. You write specific, answerable questions grounded in the candidate's resume \
    and the job's requirements.";

/// Replace: {fairness_instruction}, {count}, {job_json}, {candidate_json}, {match_json}
pub const INTERVIEW_PROMPT_TEMPLATE: &str = r#"{fairness_instruction}

Write {count} interview questions for this candidate and job.

JOB:
{job_json}

CANDIDATE PROFILE:
{candidate_json}

MATCH ASSESSMENT (strengths, concerns, missing skills):
{match_json}

Return a JSON object with this EXACT schema:
{
  "questions": [
    {
      "kind": "gap_probe",
      "question": "The role uses Kafka heavily. What experience do you have with event streaming?",
      "rationale": "Kafka is required but not on the resume",
      "related_skill": "Kafka"
    }
  ]
}

RULES:
1. kind is one of: technical, behavioral, gap_probe, situational
2. Every missing required skill gets at least one gap_probe question naming it in related_skill
3. Technical questions reference concrete projects or skills from the resume
4. Mix the kinds; no more than half the questions of one kind
5. One question per item, no multi-part lists
6. Do NOT ask about age, family, health, religion, nationality or any protected characteristic
7. Return ONLY the JSON object"#;

pub static QUESTIONS_SCHEMA: Lazy<Value> = Lazy::new(|| {
    json!({
        "type": "object",
        "required": ["questions"],
        "properties": {
            "questions": {
                "type": "array",
                "minItems": 1,
                "maxItems": 30,
                "items": {
                    "type": "object",
                    "required": ["kind", "question", "rationale"],
                    "properties": {
                        "kind": {
                            "type": "string",
                            "enum": ["technical", "behavioral", "gap_probe", "situational"]
                        },
                        "question": {"type": "string", "minLength": 1},
                        "rationale": {"type": "string"},
                        "related_skill": {"type": ["string", "null"]}
                    }
                }
            }
        }
    })
});
