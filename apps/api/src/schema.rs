//! Schema Registry: the fixed output contracts the generation model is asked to honour.
//!
//! Each structured schema is an ordered list of fields with a kind and a default.
//! The same table drives the prompt description, the all-defaults record and
//! field-level repair in `extraction`.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

/// Shape of a single schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Free text. Default `""`.
    Text,
    /// Ordered list of strings. Default `[]`.
    TextList,
    /// Non-negative integer. Default `0`.
    Count,
}

impl FieldKind {
    pub fn type_hint(self) -> &'static str {
        match self {
            FieldKind::Text => "string",
            FieldKind::TextList => "array of strings",
            FieldKind::Count => "non-negative integer",
        }
    }

    pub fn default_value(self) -> Value {
        match self {
            FieldKind::Text => Value::String(String::new()),
            FieldKind::TextList => Value::Array(Vec::new()),
            FieldKind::Count => Value::from(0u32),
        }
    }

    fn default_literal(self) -> &'static str {
        match self {
            FieldKind::Text => "\"\"",
            FieldKind::TextList => "[]",
            FieldKind::Count => "0",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    /// JSON key as it must appear in model output.
    pub name: &'static str,
    pub kind: FieldKind,
    pub description: &'static str,
}

const JOB_DETAILS_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        name: "job_title",
        kind: FieldKind::Text,
        description: "Title of the advertised position",
    },
    FieldSpec {
        name: "required_skills",
        kind: FieldKind::TextList,
        description: "Technical skills the role requires",
    },
    FieldSpec {
        name: "experience_required",
        kind: FieldKind::Count,
        description: "Minimum years of experience required",
    },
    FieldSpec {
        name: "tools",
        kind: FieldKind::TextList,
        description: "Tools, frameworks and platforms mentioned",
    },
    FieldSpec {
        name: "soft_skills",
        kind: FieldKind::TextList,
        description: "Interpersonal and soft skills mentioned",
    },
];

const RESUME_SUGGESTIONS_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        name: "missing_skills",
        kind: FieldKind::TextList,
        description: "Skills the job asks for that the resume does not show",
    },
    FieldSpec {
        name: "improvement_points",
        kind: FieldKind::TextList,
        description: "Concrete changes that would make the resume fit the job better",
    },
    FieldSpec {
        name: "overall_fit_summary",
        kind: FieldKind::Text,
        description: "Short summary of how well the candidate fits the role",
    },
];

/// The structured output shapes the pipeline extracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schema {
    JobDetails,
    ResumeSuggestions,
}

impl Schema {
    pub fn name(self) -> &'static str {
        match self {
            Schema::JobDetails => "job_details",
            Schema::ResumeSuggestions => "resume_suggestions",
        }
    }

    pub fn fields(self) -> &'static [FieldSpec] {
        match self {
            Schema::JobDetails => JOB_DETAILS_FIELDS,
            Schema::ResumeSuggestions => RESUME_SUGGESTIONS_FIELDS,
        }
    }

    /// Machine-readable contract embedded in structured-output prompts.
    pub fn describe(self) -> String {
        let fields = self.fields();
        let mut out = String::from(
            "The output MUST be a single JSON object with exactly these fields and no others:\n{\n",
        );
        for (i, field) in fields.iter().enumerate() {
            let separator = if i + 1 < fields.len() { "," } else { "" };
            out.push_str(&format!(
                "  \"{}\": <{}>{}\n",
                field.name,
                field.kind.type_hint(),
                separator
            ));
        }
        out.push_str("}\n\nField meanings:\n");
        for field in fields {
            out.push_str(&format!(
                "- {} ({}): {}. If unknown use {}.\n",
                field.name,
                field.kind.type_hint(),
                field.description,
                field.kind.default_literal()
            ));
        }
        out.push_str(
            "\nReturn exactly this shape: one JSON object, every field present, no extra keys.",
        );
        out
    }

    /// The all-defaults instance as a JSON document.
    #[cfg(test)]
    pub fn defaults(self) -> Value {
        let map: serde_json::Map<String, Value> = self
            .fields()
            .iter()
            .map(|f| (f.name.to_string(), f.kind.default_value()))
            .collect();
        Value::Object(map)
    }
}

/// A record type backed by one of the registry's schemas.
///
/// `Default` must produce the same values as `Schema::defaults()`.
pub trait StructuredRecord: DeserializeOwned + Serialize + Default {
    const SCHEMA: Schema;
}

/// The all-defaults instance of a record, used as the fallback base.
pub fn defaults_for<T: StructuredRecord>() -> T {
    T::default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::analysis::{JobDetails, ResumeSuggestions};

    #[test]
    fn test_describe_lists_every_field_with_type() {
        let description = Schema::JobDetails.describe();
        for field in Schema::JobDetails.fields() {
            assert!(description.contains(&format!("\"{}\"", field.name)));
        }
        assert!(description.contains("<non-negative integer>"));
        assert!(description.contains("no extra keys"));
    }

    #[test]
    fn test_describe_states_defaults() {
        let description = Schema::ResumeSuggestions.describe();
        assert!(description.contains("missing_skills (array of strings)"));
        assert!(description.contains("If unknown use []"));
        assert!(description.contains("If unknown use \"\""));
    }

    #[test]
    fn test_schema_defaults_match_record_defaults() {
        let job: JobDetails = serde_json::from_value(Schema::JobDetails.defaults()).unwrap();
        assert_eq!(job, defaults_for::<JobDetails>());

        let suggestions: ResumeSuggestions =
            serde_json::from_value(Schema::ResumeSuggestions.defaults()).unwrap();
        assert_eq!(suggestions, defaults_for::<ResumeSuggestions>());
    }

    #[test]
    fn test_record_serialization_uses_schema_field_names() {
        let value = serde_json::to_value(JobDetails::default()).unwrap();
        let keys: Vec<&str> = value
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        for field in Schema::JobDetails.fields() {
            assert!(keys.contains(&field.name), "missing key {}", field.name);
        }
        assert_eq!(keys.len(), Schema::JobDetails.fields().len());
    }
}
