use serde::{Deserialize, Serialize};

/// Structured candidate profile extracted from resume text.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExtractedCandidate {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    /// Current or most recent title, e.g. "Senior Backend Engineer".
    pub headline: Option<String>,
    pub summary: Option<String>,
    #[serde(default)]
    pub total_years_experience: f32,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub work_history: Vec<WorkHistoryItem>,
    #[serde(default)]
    pub education: Vec<EducationItem>,
    #[serde(default)]
    pub certifications: Vec<String>,
    #[serde(default)]
    pub languages: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WorkHistoryItem {
    pub company: String,
    pub title: String,
    /// "YYYY-MM" or "YYYY" as written on the resume.
    pub start_date: Option<String>,
    /// `None` means current position.
    pub end_date: Option<String>,
    #[serde(default)]
    pub highlights: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EducationItem {
    pub institution: String,
    pub degree: Option<String>,
    pub field: Option<String>,
    pub graduation_year: Option<u16>,
}

impl ExtractedCandidate {
    /// Name used in reports when the resume carries none.
    pub fn display_name(&self) -> &str {
        self.full_name.as_deref().unwrap_or("Unnamed candidate")
    }

    /// All job titles the candidate has held, headline first.
    pub fn titles(&self) -> impl Iterator<Item = &str> {
        self.headline
            .as_deref()
            .into_iter()
            .chain(self.work_history.iter().map(|w| w.title.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_lists_default_to_empty() {
        let candidate: ExtractedCandidate = serde_json::from_value(json!({
            "full_name": "Jane Doe",
            "email": null,
            "phone": null,
            "location": null,
            "headline": "Backend Engineer",
            "summary": null,
            "total_years_experience": 6.5
        }))
        .unwrap();
        assert!(candidate.skills.is_empty());
        assert!(candidate.work_history.is_empty());
        assert_eq!(candidate.display_name(), "Jane Doe");
    }

    #[test]
    fn test_titles_lists_headline_then_history() {
        let candidate = ExtractedCandidate {
            headline: Some("Staff Engineer".to_string()),
            work_history: vec![WorkHistoryItem {
                company: "Acme".to_string(),
                title: "Senior Engineer".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        };
        let titles: Vec<&str> = candidate.titles().collect();
        assert_eq!(titles, vec!["Staff Engineer", "Senior Engineer"]);
    }

    #[test]
    fn test_display_name_fallback() {
        assert_eq!(ExtractedCandidate::default().display_name(), "Unnamed candidate");
    }
}
