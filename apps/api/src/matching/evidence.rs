//! Evidence: locally computed, deterministic facts about a candidate vs a job.
//!
//! These numbers anchor the model's scores: the point budget never lets a category
//! drift far from what the resume text can actually support.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::models::candidate::ExtractedCandidate;
use crate::models::job::JobRequirements;

/// Common spellings folded onto one canonical skill name.
const SKILL_ALIASES: &[(&str, &str)] = &[
    ("js", "javascript"),
    ("ecmascript", "javascript"),
    ("ts", "typescript"),
    ("k8s", "kubernetes"),
    ("postgres", "postgresql"),
    ("psql", "postgresql"),
    ("golang", "go"),
    ("node", "node.js"),
    ("nodejs", "node.js"),
    ("node js", "node.js"),
    ("reactjs", "react"),
    ("react.js", "react"),
    ("vuejs", "vue"),
    ("vue.js", "vue"),
    ("py", "python"),
    ("python3", "python"),
    ("amazon web services", "aws"),
    ("gcp", "google cloud"),
    ("google cloud platform", "google cloud"),
    ("ml", "machine learning"),
    ("c sharp", "c#"),
    ("csharp", "c#"),
    ("cpp", "c++"),
    ("mongo", "mongodb"),
    ("tf", "terraform"),
];

const DOCTORATE: &[&str] = &["phd", "doctorate", "doctoral", "dphil"];
const MASTER: &[&str] = &["master", "masters", "msc", "ms", "ma", "mba", "meng", "mphil", "mtech"];
const BACHELOR: &[&str] = &[
    "bachelor", "bachelors", "bsc", "bs", "ba", "beng", "btech", "bcom", "undergraduate",
];
const ASSOCIATE: &[&str] = &["associate", "associates"];

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Evidence {
    pub required_matched: Vec<String>,
    pub required_missing: Vec<String>,
    pub preferred_matched: Vec<String>,
    pub preferred_missing: Vec<String>,
    /// Share of required skills found, 0.0 – 1.0 (1.0 when none are required).
    pub skill_coverage: f32,
    /// Share of preferred skills found, 0.0 – 1.0 (1.0 when none are listed).
    pub preferred_coverage: f32,
    pub candidate_years: f32,
    /// candidate years / required years, clamped to 0.0 – 1.0.
    pub experience_ratio: f32,
    /// `None` when either side's education level is unknown.
    pub education_met: Option<bool>,
}

/// Computes skill, experience and education evidence for one candidate/job pair.
pub fn compute_evidence(
    candidate: &ExtractedCandidate,
    resume_text: &str,
    job: &JobRequirements,
) -> Evidence {
    let candidate_skills: HashSet<String> =
        candidate.skills.iter().map(|s| normalize_skill(s)).collect();
    let resume_tokens = token_haystack(resume_text);

    let (required_matched, required_missing) =
        split_skills(&job.required_skills, &candidate_skills, &resume_tokens);
    let (preferred_matched, preferred_missing) =
        split_skills(&job.preferred_skills, &candidate_skills, &resume_tokens);

    let skill_coverage = coverage(required_matched.len(), required_missing.len());
    let preferred_coverage = coverage(preferred_matched.len(), preferred_missing.len());

    let candidate_years = candidate.total_years_experience.max(0.0);
    let experience_ratio = match job.min_years_experience {
        Some(min) if min > 0.0 => (candidate_years / min).clamp(0.0, 1.0),
        _ => 1.0,
    };

    Evidence {
        required_matched,
        required_missing,
        preferred_matched,
        preferred_missing,
        skill_coverage,
        preferred_coverage,
        candidate_years,
        experience_ratio,
        education_met: education_met(candidate, job),
    }
}

/// Lowercases, turns separators into spaces and resolves aliases.
/// `+`, `#` and `.` survive so "C++", "C#" and "Node.js" stay distinct.
pub fn normalize_skill(skill: &str) -> String {
    let spaced: String = skill
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '+' | '#' | '.') {
                c
            } else {
                ' '
            }
        })
        .collect();
    let collapsed = spaced
        .split_whitespace()
        .map(|t| t.trim_end_matches('.'))
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    SKILL_ALIASES
        .iter()
        .find(|(alias, _)| *alias == collapsed)
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or(collapsed)
}

/// Highest degree rank found in `text`: 1 associate, 2 bachelor, 3 master, 4 doctorate.
pub fn degree_rank(text: &str) -> Option<u8> {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .filter(|c| *c != '.' && *c != '\'' && *c != '’')
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();

    cleaned
        .split_whitespace()
        .filter_map(|token| {
            if DOCTORATE.contains(&token) {
                Some(4)
            } else if MASTER.contains(&token) {
                Some(3)
            } else if BACHELOR.contains(&token) {
                Some(2)
            } else if ASSOCIATE.contains(&token) {
                Some(1)
            } else {
                None
            }
        })
        .max()
}

fn education_met(candidate: &ExtractedCandidate, job: &JobRequirements) -> Option<bool> {
    let required = job.education_level.as_deref().and_then(degree_rank)?;
    if candidate.education.is_empty() {
        return Some(false);
    }
    let best = candidate
        .education
        .iter()
        .filter_map(|e| e.degree.as_deref().and_then(degree_rank))
        .max()?;
    Some(best >= required)
}

fn split_skills(
    wanted: &[String],
    candidate_skills: &HashSet<String>,
    resume_tokens: &str,
) -> (Vec<String>, Vec<String>) {
    let mut seen = HashSet::new();
    let mut matched = Vec::new();
    let mut missing = Vec::new();

    for skill in wanted {
        let canonical = normalize_skill(skill);
        if canonical.is_empty() || !seen.insert(canonical.clone()) {
            continue;
        }
        let label = skill.trim().to_string();
        if candidate_skills.contains(&canonical) || mentioned_in(&canonical, resume_tokens) {
            matched.push(label);
        } else {
            missing.push(label);
        }
    }

    (matched, missing)
}

/// True when the canonical skill, or any alias of it, appears as whole words.
fn mentioned_in(canonical: &str, resume_tokens: &str) -> bool {
    std::iter::once(canonical)
        .chain(
            SKILL_ALIASES
                .iter()
                .filter(|(_, c)| *c == canonical)
                .map(|(alias, _)| *alias),
        )
        .any(|needle| resume_tokens.contains(&format!(" {needle} ")))
}

/// Resume text in the same normalized token form as skills, padded with spaces
/// so whole-word checks are a plain substring search.
fn token_haystack(text: &str) -> String {
    let mut haystack = String::from(" ");
    for token in normalize_skill_tokens(text) {
        haystack.push_str(&token);
        haystack.push(' ');
    }
    haystack
}

fn normalize_skill_tokens(text: &str) -> Vec<String> {
    text.to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '+' | '#' | '.') {
                c
            } else {
                ' '
            }
        })
        .collect::<String>()
        .split_whitespace()
        .map(|t| t.trim_end_matches('.').to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

fn coverage(matched: usize, missing: usize) -> f32 {
    let total = matched + missing;
    if total == 0 {
        1.0
    } else {
        matched as f32 / total as f32
    }
}
