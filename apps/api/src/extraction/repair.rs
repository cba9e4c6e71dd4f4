//! Field-level repair: rebuilds a complete, well-typed document from whatever the
//! model returned, one field at a time. Never fails.

use serde_json::{Map, Value};

use crate::schema::{FieldKind, Schema};

/// A schema-conformant document plus the fields that had to be defaulted or coerced.
#[derive(Debug, Clone)]
pub struct Repair {
    pub document: Value,
    pub repaired_fields: Vec<&'static str>,
}

pub fn repair_document(schema: Schema, source: &Map<String, Value>) -> Repair {
    let mut document = Map::new();
    let mut repaired_fields = Vec::new();

    for field in schema.fields() {
        let original = source.get(field.name);
        let (value, intact) = match original {
            Some(value) if is_well_typed(field.kind, value) => (value.clone(), true),
            Some(value) => match coerce(field.kind, value) {
                Some(coerced) => (coerced, false),
                None => (field.kind.default_value(), false),
            },
            None => (field.kind.default_value(), false),
        };

        if !intact {
            repaired_fields.push(field.name);
        }
        document.insert(field.name.to_string(), value);
    }

    Repair {
        document: Value::Object(document),
        repaired_fields,
    }
}

fn is_well_typed(kind: FieldKind, value: &Value) -> bool {
    match kind {
        FieldKind::Text => value.is_string(),
        FieldKind::TextList => value
            .as_array()
            .is_some_and(|items| items.iter().all(Value::is_string)),
        FieldKind::Count => value
            .as_u64()
            .is_some_and(|n| n <= u64::from(u32::MAX)),
    }
}

fn coerce(kind: FieldKind, value: &Value) -> Option<Value> {
    match kind {
        FieldKind::Text => coerce_text(value).map(Value::String),
        FieldKind::TextList => coerce_text_list(value).map(|items| {
            Value::Array(items.into_iter().map(Value::String).collect())
        }),
        FieldKind::Count => coerce_count(value).map(Value::from),
    }
}

/// Strings, numbers and booleans render as text; `null` and containers do not.
fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn coerce_text(value: &Value) -> Option<String> {
    match value {
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(scalar_to_string)
                .collect::<Vec<_>>()
                .join(", "),
        ),
        other => scalar_to_string(other),
    }
}

fn coerce_text_list(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::Array(items) => Some(items.iter().filter_map(scalar_to_string).collect()),
        Value::String(s) if s.trim().is_empty() => Some(Vec::new()),
        Value::String(_) | Value::Number(_) | Value::Bool(_) => {
            scalar_to_string(value).map(|s| vec![s])
        }
        Value::Null | Value::Object(_) => None,
    }
}

fn coerce_count(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => {
            if let Some(unsigned) = n.as_u64() {
                Some(saturate(unsigned))
            } else if n.as_i64().is_some() {
                // Only negative integers reach here.
                Some(0)
            } else {
                n.as_f64().map(clamp_float)
            }
        }
        Value::String(s) => leading_integer(s),
        _ => None,
    }
}

fn saturate(n: u64) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

fn clamp_float(f: f64) -> u32 {
    if f <= 0.0 {
        0
    } else if f >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        f.trunc() as u32
    }
}

/// Parses the integer at the start of strings like `"5"`, `"5+ years"` or `"-2"`.
fn leading_integer(s: &str) -> Option<u32> {
    let s = s.trim();
    let (negative, digits_start) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    let digits: String = digits_start
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    if digits.is_empty() {
        return None;
    }
    if negative {
        return Some(0);
    }
    Some(digits.parse::<u64>().map(saturate).unwrap_or(u32::MAX))
}
