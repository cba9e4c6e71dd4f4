// Shared prompt fragments.
// Task templates live in generation::prompts; this file holds cross-cutting rules.

/// Negative instructions appended to every structured-output prompt.
pub const STRUCTURED_OUTPUT_RULES: &str = "\
Return ONLY valid JSON.
Do NOT include explanations or any prose before or after the JSON.
Do NOT include markdown.
Do NOT include comments.
Do NOT wrap the output in ```json or any other code fence.";

/// Instruction appended to free-text prompts.
pub const PLAIN_TEXT_RULES: &str = "\
Return only the requested text.
Do NOT include a preamble, a title line or closing remarks about the text itself.";
