//! Prompt rendering and response-parsing helpers shared by processors.

use opq_core::ProcessContext;

/// Maximum characters of operation input sent to the model.
pub const MAX_INPUT_CHARS: usize = 12000;

/// Truncate input to `max` characters (UTF-8 safe).
pub fn truncate_input(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    // Find a valid UTF-8 boundary at or before max
    let mut end = max;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// Fill a prompt template's `{input}` and `{context}` placeholders from the
/// operation being processed.
pub fn render(template: &str, ctx: &ProcessContext) -> String {
    let input = truncate_input(ctx.input_text(), MAX_INPUT_CHARS);
    let context = match ctx.context_json() {
        Some(value) => {
            serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
        }
        None => "none provided".to_string(),
    };
    template.replace("{input}", input).replace("{context}", &context)
}

/// Strip a markdown code fence wrapper if the model added one.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the language tag on the opening fence line
    let rest = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Parse a comma-separated label list from a model response.
pub fn parse_labels(response: &str) -> Vec<String> {
    let cleaned = response
        .trim()
        .trim_start_matches("Labels:")
        .trim_start_matches("LABELS:")
        .trim_start_matches('[')
        .trim_end_matches(']')
        .trim();

    cleaned
        .split(',')
        .map(|t| {
            t.trim()
                .to_lowercase()
                .trim_matches(|c: char| !c.is_alphanumeric() && c != '-' && c != '_')
                .to_string()
        })
        .filter(|t| !t.is_empty() && t.len() <= 50)
        .take(16)
        .collect()
}
