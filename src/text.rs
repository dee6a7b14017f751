// ── Character-safe truncation ────────────────────────────────────────────────
//
// Lengths here are in chars, not bytes: OCR output is frequently CJK and a
// byte cut would split a code point.

pub const ELLIPSIS: &str = "...";

pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Returns at most `max_chars` leading characters of `text`.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

/// Display preview: the first `max_chars` characters, with `...` appended when
/// anything was cut.
pub fn preview(text: &str, max_chars: usize) -> String {
    let cut = truncate_chars(text, max_chars);
    if cut.len() == text.len() {
        text.to_string()
    } else {
        format!("{cut}{ELLIPSIS}")
    }
}
