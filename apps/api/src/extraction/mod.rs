//! Response Validator: turns raw model text into a typed record.
//!
//! Three tiers, cheapest first:
//! 1. strict: fence-stripped text is a JSON object that deserializes straight into the record
//! 2. lenient: the first JSON object embedded in the text deserializes into the record
//! 3. repaired: that object is rebuilt field by field (see `repair`)
//!
//! Only text with no locatable JSON object at all yields an error.

pub mod fences;
pub mod locate;
pub mod repair;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::schema::StructuredRecord;
use fences::strip_code_fences;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("model output contained no parseable JSON document")]
    Unparseable { raw: String },
}

/// Which tier produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionTier {
    Strict,
    Lenient,
    Repaired,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Extracted<T> {
    pub record: T,
    pub tier: ExtractionTier,
    /// Fields that were defaulted or coerced. Empty unless `tier` is `Repaired`.
    pub repaired_fields: Vec<&'static str>,
}

/// Record-only form of `extract`.
#[cfg(test)]
pub fn validate<T: StructuredRecord>(raw: &str) -> Result<T, ExtractionError> {
    extract(raw).map(|extracted| extracted.record)
}

/// Validates raw model output against `T`'s schema and reports which tier produced
/// the record.
pub fn extract<T: StructuredRecord>(raw: &str) -> Result<Extracted<T>, ExtractionError> {
    let schema = T::SCHEMA.name();
    let cleaned = strip_code_fences(raw);

    // Strict means a keyed object; serde would also accept the positional array form.
    if let Ok(document @ Value::Object(_)) = serde_json::from_str::<Value>(cleaned) {
        if let Ok(record) = T::deserialize(&document) {
            debug!(schema, "strict parse succeeded");
            return Ok(Extracted {
                record,
                tier: ExtractionTier::Strict,
                repaired_fields: Vec::new(),
            });
        }
    }

    let Some(document) = locate::first_object(cleaned) else {
        warn!(schema, raw_len = raw.len(), "no JSON document found in model output");
        return Err(ExtractionError::Unparseable {
            raw: raw.to_string(),
        });
    };

    if let Ok(record) = T::deserialize(&Value::Object(document.clone())) {
        debug!(schema, "lenient extraction succeeded");
        return Ok(Extracted {
            record,
            tier: ExtractionTier::Lenient,
            repaired_fields: Vec::new(),
        });
    }

    let repair = repair::repair_document(T::SCHEMA, &document);
    warn!(
        schema,
        fields = ?repair.repaired_fields,
        "model output failed schema conformance; fields repaired"
    );

    let record = match T::deserialize(&repair.document) {
        Ok(record) => record,
        Err(e) => {
            // Repair emits exactly the registry's field kinds, so this is a registry/record mismatch.
            warn!(schema, "repaired document did not deserialize: {e}");
            T::default()
        }
    };

    Ok(Extracted {
        record,
        tier: ExtractionTier::Repaired,
        repaired_fields: repair.repaired_fields,
    })
}
