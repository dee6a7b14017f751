//! Locating the JSON object inside a language-model reply.
//!
//! Models asked to "return only JSON" still wrap it in markdown fences or put a
//! sentence before it. The body of the first fenced code block is searched
//! first, then the whole reply; in each, the slice from the first `{` to the
//! last `}` is the candidate object.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static FENCED_BLOCK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```[A-Za-z0-9_-]*[ \t]*\r?\n?(.*?)```").unwrap());

/// Body of the first fenced code block, or the whole text when there is none.
/// An unterminated fence has its opening line dropped.
pub fn strip_code_fence(text: &str) -> &str {
    if let Some(body) = FENCED_BLOCK_RE.captures(text).and_then(|c| c.get(1)) {
        return body.as_str();
    }
    match text.find("```") {
        Some(start) => {
            let rest = &text[start + 3..];
            match rest.find('\n') {
                Some(nl) => &rest[nl + 1..],
                None => rest,
            }
        }
        None => text,
    }
}

fn brace_slice(body: &str) -> Option<&str> {
    let start = body.find('{')?;
    let end = body.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&body[start..=end])
}

/// The first-`{`-to-last-`}` slice of the fenced body, or of the whole reply
/// when the fence holds no braces (a stray closing fence, a fenced headline
/// ahead of the object).
pub fn extract_json_object(text: &str) -> Option<&str> {
    brace_slice(strip_code_fence(text)).or_else(|| brace_slice(text))
}

/// Extracts and parses the object, trying the fenced body before the whole
/// reply. Anything other than a JSON object is `None`.
pub fn parse_json_object(text: &str) -> Option<Value> {
    let fenced = brace_slice(strip_code_fence(text));
    let whole = brace_slice(text);
    let candidates = fenced.into_iter().chain(whole.filter(|w| Some(*w) != fenced));
    for candidate in candidates {
        if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(candidate) {
            return Some(value);
        }
    }
    None
}
