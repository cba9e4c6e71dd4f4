/// Strips surrounding whitespace and an enclosing ``` code fence from model output.
///
/// Handles any info string (```json, ```JSON, ```javascript), content on the opening
/// fence line and a missing closing fence. Text that does not start with a fence is only trimmed.
pub fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };

    // Only a bare info-string token is dropped; a document may start on the fence line.
    let body = rest
        .trim_start_matches(|c: char| c.is_ascii_alphanumeric() || matches!(c, '_' | '+' | '-'))
        .trim();
    body.strip_suffix("```").map(str::trim).unwrap_or(body)
}
