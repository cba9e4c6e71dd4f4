//! Lenient extraction: finds a JSON document embedded in surrounding prose.

use serde_json::{Map, Value};

/// Opening delimiters tried before giving up. Each one costs a scan to the end of the
/// text, so this bounds the search at `MAX_OPENINGS * text.len()`.
const MAX_OPENINGS: usize = 256;

/// Returns the first embedded JSON object in `text`.
///
/// Candidate spans are balanced `{…}` / `[…]` runs, tried in order of their opening
/// delimiter. A span counts only if it parses as JSON and is an object, or an array
/// holding an object (its first object element is returned).
pub fn first_object(text: &str) -> Option<Map<String, Value>> {
    candidate_spans(text).find_map(|span| match serde_json::from_str::<Value>(span) {
        Ok(Value::Object(map)) => Some(map),
        Ok(Value::Array(items)) => items.into_iter().find_map(|item| match item {
            Value::Object(map) => Some(map),
            _ => None,
        }),
        _ => None,
    })
}

/// Yields the balanced span at each of the first `MAX_OPENINGS` opening delimiters.
fn candidate_spans(text: &str) -> impl Iterator<Item = &str> {
    let bytes = text.as_bytes();
    bytes
        .iter()
        .enumerate()
        .filter(|(_, b)| matches!(b, b'{' | b'['))
        .take(MAX_OPENINGS)
        .filter_map(move |(start, _)| span_end(bytes, start).map(|end| &text[start..end]))
}

/// Index one past the delimiter that closes the one at `start`.
/// Quoted strings (with backslash escapes) are skipped; a mismatched closer ends the search.
fn span_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut expected: Vec<u8> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &b) in bytes[start..].iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }

        match b {
            b'"' => in_string = true,
            b'{' => expected.push(b'}'),
            b'[' => expected.push(b']'),
            b'}' | b']' => {
                if expected.pop() != Some(b) {
                    return None;
                }
                if expected.is_empty() {
                    return Some(start + offset + 1);
                }
            }
            _ => {}
        }
    }

    None
}
