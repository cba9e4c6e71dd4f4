use serde::{Deserialize, Serialize};

use crate::schema::{Schema, StructuredRecord};

/// Structured requirements extracted from a raw job description.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDetails {
    pub job_title: String,
    pub required_skills: Vec<String>,
    /// Minimum years of experience. Never negative.
    pub experience_required: u32,
    pub tools: Vec<String>,
    pub soft_skills: Vec<String>,
}

impl StructuredRecord for JobDetails {
    const SCHEMA: Schema = Schema::JobDetails;
}

/// Gap analysis of a resume against `JobDetails`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumeSuggestions {
    pub missing_skills: Vec<String>,
    pub improvement_points: Vec<String>,
    pub overall_fit_summary: String,
}

impl StructuredRecord for ResumeSuggestions {
    const SCHEMA: Schema = Schema::ResumeSuggestions;
}

/// Generated cover letter text. Only constructed from non-blank text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CoverLetter(String);

impl CoverLetter {
    pub const FILE_NAME: &'static str = "cover_letter.txt";

    /// Returns `None` for empty or whitespace-only text.
    pub fn new(text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
