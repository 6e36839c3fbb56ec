//! Char-boundary safe text helpers for log previews.

/// Return at most `max_chars` characters of `text`.
///
/// Slicing always lands on a char boundary, so Korean text is never split
/// inside a code point.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Short preview of `text` for logs, with an ellipsis when truncated.
pub fn preview(text: &str, max_chars: usize) -> String {
    let head = truncate_chars(text, max_chars);
    if head.len() < text.len() {
        format!("{}...", head)
    } else {
        head.to_string()
    }
}
