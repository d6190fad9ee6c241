// src/types/profile.rs
//! Structured profile returned by the CV structuring endpoint.

use serde::{Deserialize, Serialize};

/// Fixed-schema profile extracted from raw CV text.
///
/// Every field is optional: the structuring endpoint returns `null` or an
/// empty list for anything it could not find, and the profile is treated as
/// a draft the user can edit afterwards.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StructuredProfile {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub links: Vec<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub education: Vec<EducationEntry>,
    #[serde(default)]
    pub experience: Vec<ExperienceEntry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EducationEntry {
    #[serde(default)]
    pub institution: Option<String>,
    #[serde(default)]
    pub degree: Option<String>,
    // Some backend versions emit camelCase date keys.
    #[serde(default, alias = "startDate")]
    pub start_date: Option<String>,
    #[serde(default, alias = "endDate")]
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExperienceEntry {
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default, alias = "startDate")]
    pub start_date: Option<String>,
    #[serde(default, alias = "endDate")]
    pub end_date: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
}

impl StructuredProfile {
    /// A profile is meaningful when at least one identifying or substantive
    /// field came back populated. Wizard progression gates on this.
    pub fn is_meaningful(&self) -> bool {
        let has = |s: &Option<String>| s.as_deref().map_or(false, |v| !v.trim().is_empty());

        has(&self.full_name)
            || has(&self.email)
            || has(&self.phone)
            || !self.skills.is_empty()
            || !self.experience.is_empty()
            || !self.education.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_profile_is_not_meaningful() {
        let profile = StructuredProfile::default();
        assert!(!profile.is_meaningful());
    }

    #[test]
    fn blank_strings_do_not_count() {
        let profile = StructuredProfile {
            full_name: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(!profile.is_meaningful());
    }

    #[test]
    fn single_populated_field_is_meaningful() {
        let profile = StructuredProfile {
            skills: vec!["Rust".to_string()],
            ..Default::default()
        };
        assert!(profile.is_meaningful());

        let profile = StructuredProfile {
            email: Some("jane@example.com".to_string()),
            ..Default::default()
        };
        assert!(profile.is_meaningful());
    }

    #[test]
    fn parses_backend_schema_with_nulls() {
        let raw = r#"{
            "full_name": "John Doe",
            "email": null,
            "phone": null,
            "location": null,
            "links": [],
            "skills": ["Python", "FastAPI"],
            "education": [{"institution": "MIT", "degree": "BSc", "start_date": "2015", "end_date": "2019"}],
            "experience": [{"company": "Acme", "role": "Engineer", "startDate": "2019-06", "endDate": null, "summary": "Built things"}]
        }"#;

        let profile: StructuredProfile = serde_json::from_str(raw).unwrap();
        assert_eq!(profile.full_name.as_deref(), Some("John Doe"));
        assert_eq!(profile.skills.len(), 2);
        // camelCase date spelling is accepted
        assert_eq!(profile.experience[0].start_date.as_deref(), Some("2019-06"));
        assert!(profile.experience[0].end_date.is_none());
        assert!(profile.is_meaningful());
    }

    #[test]
    fn missing_keys_default_to_empty() {
        let profile: StructuredProfile = serde_json::from_str("{}").unwrap();
        assert!(profile.links.is_empty());
        assert!(!profile.is_meaningful());
    }
}
