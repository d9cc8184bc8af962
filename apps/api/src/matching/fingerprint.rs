//! Match fingerprints: a stable hash of (resume text, job) used as the cache key
//! and as the seed for the point-distribution order in `budget::reconcile`.

use serde::Serialize;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::models::job::JobRequirements;

/// Field order here is the canonical order; changing it invalidates every cached match.
#[derive(Serialize)]
struct CanonicalJob<'a> {
    job_id: Option<&'a Uuid>,
    title: String,
    description: String,
    required_skills: Vec<String>,
    preferred_skills: Vec<String>,
    min_years_experience: Option<f32>,
    education_level: Option<String>,
    location: Option<String>,
}

/// SHA-256 hex over the normalized resume text and the canonical job JSON.
/// Identical inputs always yield the identical fingerprint.
pub fn fingerprint(resume_text: &str, job: &JobRequirements) -> String {
    let canonical = CanonicalJob {
        job_id: job.job_id.as_ref(),
        title: canonical_text(&job.title),
        description: canonical_text(&job.description),
        required_skills: canonical_list(&job.required_skills),
        preferred_skills: canonical_list(&job.preferred_skills),
        min_years_experience: job.min_years_experience,
        education_level: job.education_level.as_deref().map(canonical_text),
        location: job.location.as_deref().map(canonical_text),
    };
    // Serializing a plain struct of strings and numbers cannot fail.
    let job_json = serde_json::to_string(&canonical).unwrap_or_default();

    let mut hasher = Sha256::new();
    hasher.update(canonical_text(resume_text).as_bytes());
    hasher.update([0x1f]);
    hasher.update(job_json.as_bytes());
    hex::encode(hasher.finalize())
}

/// Rotation start for point distribution: first fingerprint byte modulo `modulus`.
pub fn rotation_offset(fingerprint: &str, modulus: usize) -> usize {
    if modulus == 0 {
        return 0;
    }
    let first_byte = fingerprint
        .get(..2)
        .and_then(|h| u8::from_str_radix(h, 16).ok())
        .unwrap_or(0);
    first_byte as usize % modulus
}

fn canonical_text(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn canonical_list(values: &[String]) -> Vec<String> {
    let mut list: Vec<String> = values
        .iter()
        .map(|v| canonical_text(v))
        .filter(|v| !v.is_empty())
        .collect();
    list.sort();
    list.dedup();
    list
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> JobRequirements {
        JobRequirements {
            title: "Backend Engineer".to_string(),
            description: "Build APIs".to_string(),
            required_skills: vec!["Rust".to_string(), "PostgreSQL".to_string()],
            min_years_experience: Some(4.0),
            ..Default::default()
        }
    }

    #[test]
    fn test_fingerprint_is_stable() {
        let a = fingerprint("Jane Doe, Rust engineer", &job());
        let b = fingerprint("Jane Doe, Rust engineer", &job());
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_fingerprint_ignores_case_whitespace_and_skill_order() {
        let mut reordered = job();
        reordered.required_skills = vec!["postgresql".to_string(), " RUST ".to_string()];
        reordered.title = "backend   engineer".to_string();
        assert_eq!(
            fingerprint("Jane Doe,\n\nRust   engineer", &job()),
            fingerprint("jane doe, rust engineer", &reordered)
        );
    }

    #[test]
    fn test_fingerprint_changes_with_requirements() {
        let mut stricter = job();
        stricter.min_years_experience = Some(8.0);
        assert_ne!(fingerprint("resume", &job()), fingerprint("resume", &stricter));
    }

    #[test]
    fn test_fingerprint_changes_with_resume() {
        assert_ne!(fingerprint("resume a", &job()), fingerprint("resume b", &job()));
    }

    #[test]
    fn test_rotation_offset_uses_first_byte() {
        assert_eq!(rotation_offset("ff00", 5), 255 % 5);
        assert_eq!(rotation_offset("07ab", 5), 2);
        assert_eq!(rotation_offset("", 5), 0);
        assert_eq!(rotation_offset("zz", 5), 0);
        assert_eq!(rotation_offset("ab", 0), 0);
    }
}
