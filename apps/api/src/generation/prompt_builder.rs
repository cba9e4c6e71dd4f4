//! Prompt Builder: assembles the exact text sent to the generation service.

use std::collections::HashMap;

use serde::Serialize;
use thiserror::Error;

use crate::generation::prompts::{
    COVER_LETTER_TEMPLATE, JOB_DETAILS_TEMPLATE, RESUME_SUGGESTIONS_TEMPLATE,
};
use crate::llm_client::prompts::{PLAIN_TEXT_RULES, STRUCTURED_OUTPUT_RULES};
use crate::schema::Schema;

pub const JOB_DESCRIPTION: &str = "jobDescription";
pub const JOB_DETAILS: &str = "jobDetails";
pub const JOB_TITLE: &str = "jobTitle";
pub const RESUME: &str = "resume";

const FORMAT_INSTRUCTIONS: &str = "formatInstructions";
const OUTPUT_RULES: &str = "outputRules";

/// A required substitution key was not supplied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("missing required prompt input '{key}'")]
pub struct MissingInputError {
    pub key: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptTemplate {
    JobDetails,
    ResumeSuggestions,
    CoverLetter,
}

impl PromptTemplate {
    fn text(self) -> &'static str {
        match self {
            PromptTemplate::JobDetails => JOB_DETAILS_TEMPLATE,
            PromptTemplate::ResumeSuggestions => RESUME_SUGGESTIONS_TEMPLATE,
            PromptTemplate::CoverLetter => COVER_LETTER_TEMPLATE,
        }
    }

    pub fn required_inputs(self) -> &'static [&'static str] {
        match self {
            PromptTemplate::JobDetails => &[JOB_DESCRIPTION],
            PromptTemplate::ResumeSuggestions => &[JOB_DETAILS, RESUME],
            PromptTemplate::CoverLetter => &[JOB_TITLE, JOB_DETAILS, RESUME],
        }
    }

    /// Output schema, or `None` for free-text output.
    pub fn schema(self) -> Option<Schema> {
        match self {
            PromptTemplate::JobDetails => Some(Schema::JobDetails),
            PromptTemplate::ResumeSuggestions => Some(Schema::ResumeSuggestions),
            PromptTemplate::CoverLetter => None,
        }
    }
}

/// Named content supplied by the caller.
#[derive(Debug, Clone, Default)]
pub struct PromptInputs {
    values: HashMap<String, String>,
}

impl PromptInputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }
}

/// One prompt ready for a single generation call.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub template: PromptTemplate,
    pub prompt: String,
    pub schema: Option<Schema>,
}

pub fn build(
    template: PromptTemplate,
    inputs: &PromptInputs,
) -> Result<GenerationRequest, MissingInputError> {
    let mut values: HashMap<&str, String> = HashMap::new();

    for &key in template.required_inputs() {
        let value = inputs.get(key).ok_or(MissingInputError { key })?;
        values.insert(key, value.to_string());
    }

    let schema = template.schema();
    match schema {
        Some(schema) => {
            values.insert(FORMAT_INSTRUCTIONS, schema.describe());
            values.insert(OUTPUT_RULES, STRUCTURED_OUTPUT_RULES.to_string());
        }
        None => {
            values.insert(OUTPUT_RULES, PLAIN_TEXT_RULES.to_string());
        }
    }

    Ok(GenerationRequest {
        template,
        prompt: render(template.text(), &values),
        schema,
    })
}

/// Single-pass `{name}` substitution. Substituted content is never rescanned, and
/// braces that do not name a known value are copied through unchanged.
fn render(template: &str, values: &HashMap<&str, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let replacement = after
            .find('}')
            .and_then(|close| values.get(&after[..close]).map(|value| (close, value)));

        match replacement {
            Some((close, value)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}
