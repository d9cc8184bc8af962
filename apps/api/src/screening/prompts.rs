// Candidate extraction prompt templates and the fixed response schema.

use once_cell::sync::Lazy;
use serde_json::{json, Value};

pub const CANDIDATE_EXTRACTION_ROLE: &str = "You are a precise resume data extractor for a recruiting team. \
    Convert resume text into a structured candidate profile.";

/// Replace: {evidence_instruction}, {resume_text}
pub const CANDIDATE_EXTRACTION_PROMPT: &str = r#"{evidence_instruction}

Extract a structured candidate profile from the resume below.

Return a JSON object with this EXACT schema (no extra fields):
{
  "full_name": "Jane Doe" | null,
  "email": "jane@example.com" | null,
  "phone": "+1 555 123 4567" | null,
  "location": "Berlin, Germany" | null,
  "headline": "Senior Backend Engineer" | null,
  "summary": "Two sentence professional summary in the candidate's own terms" | null,
  "total_years_experience": 6.5,
  "skills": ["Rust", "PostgreSQL", "Kubernetes"],
  "work_history": [
    {
      "company": "Acme",
      "title": "Senior Backend Engineer",
      "start_date": "2019-03" | null,
      "end_date": "2024-01" | null,
      "highlights": ["Cut p99 latency by 40% by redesigning the cache layer"]
    }
  ],
  "education": [
    {"institution": "TU Berlin", "degree": "MSc", "field": "Computer Science", "graduation_year": 2016}
  ],
  "certifications": ["AWS Solutions Architect"],
  "languages": ["English", "German"]
}

RULES:
1. total_years_experience = professional experience summed across roles, overlapping roles counted once, 0 if unknown
2. end_date null means the role is current
3. skills: technologies, tools, methods and domain skills written in the resume; no soft-skill filler
4. Dates as "YYYY-MM" or "YYYY" exactly as precise as the resume states
5. Do NOT extract age, date of birth, gender, marital status, nationality, or photos
6. Return ONLY the JSON object

RESUME:
{resume_text}"#;

/// JSON Schema every extraction response must satisfy.
pub static CANDIDATE_SCHEMA: Lazy<Value> = Lazy::new(|| {
    let nullable_string = json!({"type": ["string", "null"]});
    let string_list = json!({"type": "array", "items": {"type": "string"}});
    json!({
        "type": "object",
        "required": [
            "full_name", "email", "phone", "location", "headline", "summary",
            "total_years_experience", "skills", "work_history", "education",
            "certifications", "languages"
        ],
        "properties": {
            "full_name": nullable_string,
            "email": nullable_string,
            "phone": nullable_string,
            "location": nullable_string,
            "headline": nullable_string,
            "summary": nullable_string,
            "total_years_experience": {"type": "number", "minimum": 0, "maximum": 60},
            "skills": {"type": "array", "items": {"type": "string"}, "maxItems": 200},
            "work_history": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["company", "title"],
                    "properties": {
                        "company": {"type": "string"},
                        "title": {"type": "string"},
                        "start_date": nullable_string,
                        "end_date": nullable_string,
                        "highlights": string_list
                    }
                }
            },
            "education": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["institution"],
                    "properties": {
                        "institution": {"type": "string"},
                        "degree": nullable_string,
                        "field": nullable_string,
                        "graduation_year": {"type": ["integer", "null"], "minimum": 1900, "maximum": 2100}
                    }
                }
            },
            "certifications": string_list,
            "languages": string_list
        }
    })
});
