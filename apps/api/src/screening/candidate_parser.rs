//! Candidate extraction: resume text → validated `ExtractedCandidate`.

use std::collections::HashSet;

use tracing::{debug, info};

use crate::errors::AppError;
use crate::llm_client::prompts::{system_prompt, EVIDENCE_INSTRUCTION};
use crate::llm_client::LlmClient;
use crate::models::candidate::{EducationItem, ExtractedCandidate, WorkHistoryItem};
use crate::screening::contact::{find_email, find_phone, is_plausible_phone, is_valid_email};
use crate::screening::prompts::{
    CANDIDATE_EXTRACTION_PROMPT, CANDIDATE_EXTRACTION_ROLE, CANDIDATE_SCHEMA,
};

/// Resume text beyond this many characters is not sent to the model.
pub const MAX_RESUME_CHARS: usize = 24_000;
const MAX_SKILLS: usize = 100;
const MAX_SKILL_LEN: usize = 60;
const MAX_YEARS: f32 = 60.0;

/// Extracts a structured candidate profile from normalized resume text.
pub async fn extract_candidate(
    resume_text: &str,
    llm: &LlmClient,
) -> Result<ExtractedCandidate, AppError> {
    let excerpt = truncate_chars(resume_text, MAX_RESUME_CHARS);
    if excerpt.len() < resume_text.len() {
        info!(
            "Resume truncated from {} to {} bytes before extraction",
            resume_text.len(),
            excerpt.len()
        );
    }

    let prompt = CANDIDATE_EXTRACTION_PROMPT
        .replace("{evidence_instruction}", EVIDENCE_INSTRUCTION)
        .replace("{resume_text}", excerpt);

    let raw: ExtractedCandidate = llm
        .call_validated(&prompt, &system_prompt(CANDIDATE_EXTRACTION_ROLE), &CANDIDATE_SCHEMA)
        .await
        .map_err(|e| AppError::Llm(format!("Candidate extraction failed: {e}")))?;

    let candidate = post_process(raw, resume_text);
    debug!(
        "Extracted candidate: {} skills, {} roles, {:.1} years",
        candidate.skills.len(),
        candidate.work_history.len(),
        candidate.total_years_experience
    );
    Ok(candidate)
}

/// Cleans model output and fills contact gaps from the resume text itself.
pub fn post_process(candidate: ExtractedCandidate, resume_text: &str) -> ExtractedCandidate {
    let email = clean_opt(candidate.email)
        .map(|e| e.to_lowercase())
        .filter(|e| is_valid_email(e))
        .or_else(|| find_email(resume_text));

    let phone = clean_opt(candidate.phone)
        .filter(|p| is_plausible_phone(p))
        .or_else(|| find_phone(resume_text));

    let years = if candidate.total_years_experience.is_finite() {
        candidate.total_years_experience.clamp(0.0, MAX_YEARS)
    } else {
        0.0
    };

    ExtractedCandidate {
        full_name: clean_opt(candidate.full_name).map(|n| collapse_spaces(&n)),
        email,
        phone,
        location: clean_opt(candidate.location),
        headline: clean_opt(candidate.headline),
        summary: clean_opt(candidate.summary),
        total_years_experience: (years * 10.0).round() / 10.0,
        skills: normalize_skills(candidate.skills),
        work_history: candidate
            .work_history
            .into_iter()
            .filter_map(clean_work_item)
            .collect(),
        education: candidate
            .education
            .into_iter()
            .filter_map(clean_education_item)
            .collect(),
        certifications: dedupe_case_insensitive(candidate.certifications),
        languages: dedupe_case_insensitive(candidate.languages),
    }
}

/// Trims, collapses inner whitespace, drops overlong entries and de-duplicates
/// case-insensitively while keeping the first spelling seen.
pub fn normalize_skills(skills: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    skills
        .into_iter()
        .map(|s| collapse_spaces(&s))
        .filter(|s| !s.is_empty() && s.chars().count() <= MAX_SKILL_LEN)
        .filter(|s| seen.insert(s.to_lowercase()))
        .take(MAX_SKILLS)
        .collect()
}

/// Cuts `text` to at most `max_chars` characters without splitting a code point.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn clean_work_item(item: WorkHistoryItem) -> Option<WorkHistoryItem> {
    let company = collapse_spaces(&item.company);
    let title = collapse_spaces(&item.title);
    if company.is_empty() && title.is_empty() {
        return None;
    }
    Some(WorkHistoryItem {
        company,
        title,
        start_date: clean_opt(item.start_date),
        end_date: clean_opt(item.end_date),
        highlights: item
            .highlights
            .into_iter()
            .map(|h| collapse_spaces(&h))
            .filter(|h| !h.is_empty())
            .collect(),
    })
}

fn clean_education_item(item: EducationItem) -> Option<EducationItem> {
    let institution = collapse_spaces(&item.institution);
    if institution.is_empty() {
        return None;
    }
    Some(EducationItem {
        institution,
        degree: clean_opt(item.degree),
        field: clean_opt(item.field),
        graduation_year: item.graduation_year,
    })
}

fn dedupe_case_insensitive(items: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .map(|s| collapse_spaces(&s))
        .filter(|s| !s.is_empty() && seen.insert(s.to_lowercase()))
        .collect()
}

fn clean_opt(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("null"))
}

fn collapse_spaces(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}
