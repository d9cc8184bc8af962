use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;

const MAX_SKILLS_PER_LIST: usize = 100;
const MAX_YEARS: f32 = 60.0;

/// The job a resume is screened against. Sent alongside the upload as a JSON field.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct JobRequirements {
    /// Id of the job in the owning system, if any. Not interpreted here.
    #[serde(default)]
    pub job_id: Option<Uuid>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub required_skills: Vec<String>,
    #[serde(default)]
    pub preferred_skills: Vec<String>,
    #[serde(default)]
    pub min_years_experience: Option<f32>,
    /// Free text such as "Bachelor's in Computer Science".
    #[serde(default)]
    pub education_level: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

impl JobRequirements {
    /// Rejects jobs that cannot be scored meaningfully.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.title.trim().is_empty() {
            return Err(AppError::Validation("job.title cannot be empty".to_string()));
        }
        if self.description.trim().is_empty() && self.required_skills.is_empty() {
            return Err(AppError::Validation(
                "job needs a description or at least one required skill".to_string(),
            ));
        }
        for (name, list) in [
            ("required_skills", &self.required_skills),
            ("preferred_skills", &self.preferred_skills),
        ] {
            if list.len() > MAX_SKILLS_PER_LIST {
                return Err(AppError::Validation(format!(
                    "job.{name} has {} entries (max {MAX_SKILLS_PER_LIST})",
                    list.len()
                )));
            }
        }
        if let Some(years) = self.min_years_experience {
            if !years.is_finite() || !(0.0..=MAX_YEARS).contains(&years) {
                return Err(AppError::Validation(format!(
                    "job.min_years_experience must be between 0 and {MAX_YEARS}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> JobRequirements {
        JobRequirements {
            title: "Backend Engineer".to_string(),
            description: "Build APIs in Rust".to_string(),
            required_skills: vec!["Rust".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_job_passes() {
        assert!(job().validate().is_ok());
    }

    #[test]
    fn test_empty_title_rejected() {
        let mut j = job();
        j.title = "  ".to_string();
        assert!(matches!(j.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_needs_description_or_skills() {
        let mut j = job();
        j.description.clear();
        assert!(j.validate().is_ok());
        j.required_skills.clear();
        assert!(j.validate().is_err());
    }

    #[test]
    fn test_years_out_of_range_rejected() {
        let mut j = job();
        j.min_years_experience = Some(75.0);
        assert!(j.validate().is_err());
        j.min_years_experience = Some(f32::NAN);
        assert!(j.validate().is_err());
        j.min_years_experience = Some(5.0);
        assert!(j.validate().is_ok());
    }

    #[test]
    fn test_too_many_skills_rejected() {
        let mut j = job();
        j.preferred_skills = (0..101).map(|i| format!("skill-{i}")).collect();
        assert!(j.validate().is_err());
    }

    #[test]
    fn test_minimal_json_deserializes() {
        let j: JobRequirements =
            serde_json::from_str(r#"{"title": "SRE", "required_skills": ["Kubernetes"]}"#).unwrap();
        assert!(j.job_id.is_none());
        assert!(j.description.is_empty());
        assert!(j.validate().is_ok());
    }
}
