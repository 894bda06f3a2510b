//! Locating JSON payloads inside free-form model output.
//!
//! Even in JSON mode some models wrap the object in Markdown fences or add a
//! sentence before it. Callers parse whatever this returns against their own
//! record shape.

/// Return the outermost JSON object embedded in `text`.
///
/// Strips a surrounding ```` ```json ```` fence if present, then takes the
/// span from the first `{` to the last `}`. Returns `None` when no such span
/// exists.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let trimmed = strip_code_fence(text.trim());

    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end < start {
        return None;
    }

    Some(&trimmed[start..=end])
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };

    // Drop the info string ("json") on the opening fence line.
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };

    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}
