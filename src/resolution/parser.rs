//! Answer-envelope parsing for model responses.
//!
//! Every prompt instructs the model to answer in this shape:
//!
//! ```text
//! ---ANSWER---
//! search.google
//! ---NOTES---
//! I picked search because ...
//! ```
//!
//! Only the text between the two markers is used. Anything after the closing
//! marker is ignored, which is what makes chatty models usable.

use once_cell::sync::Lazy;
use regex::Regex;

/// Opening marker of the answer section.
pub const ANSWER_MARKER: &str = "---ANSWER---";

/// Marker that closes the answer section and opens free-form notes.
pub const NOTES_MARKER: &str = "---NOTES---";

static ENVELOPE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?s){}(.*?){}",
        regex::escape(ANSWER_MARKER),
        regex::escape(NOTES_MARKER)
    ))
    .expect("Invalid regex")
});

/// Extract the trimmed payload between the answer and notes markers.
///
/// Returns `None` when either marker is missing. The first complete
/// envelope wins.
pub fn extract_answer(text: &str) -> Option<String> {
    ENVELOPE_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
}

/// Strip one pair of surrounding quotes when both ends carry the same kind.
///
/// `'hello'` and `"hello"` become `hello`; `'hello"`, `'hello` and a lone `'`
/// are returned unchanged.
pub fn strip_matching_quotes(value: &str) -> &str {
    let mut chars = value.chars();
    match (chars.next(), chars.next_back()) {
        (Some(first), Some(last)) if first == last && (first == '\'' || first == '"') => {
            &value[1..value.len() - 1]
        }
        _ => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_simple() {
        let text = "---ANSWER---\nsearch.google\n---NOTES---\n";
        assert_eq!(extract_answer(text).as_deref(), Some("search.google"));
    }

    #[test]
    fn test_extract_tolerates_commentary() {
        let text = "Sure! Here you go.\n---ANSWER---\n  math.solve  \n---NOTES---\nI chose math because the \
                    user asked a sum.\n---ANSWER---\nsearch.google\n---NOTES---";
        assert_eq!(extract_answer(text).as_deref(), Some("math.solve"));
    }

    #[test]
    fn test_extract_multiline_payload() {
        let text = "---ANSWER---\n(declare-const a Int)\n(assert (< a 10))\n---NOTES---";
        assert_eq!(
            extract_answer(text).as_deref(),
            Some("(declare-const a Int)\n(assert (< a 10))")
        );
    }

    #[test]
    fn test_extract_missing_markers() {
        assert_eq!(extract_answer("search.google"), None);
        assert_eq!(extract_answer("---ANSWER---\nsearch.google\n"), None);
        assert_eq!(extract_answer("search.google\n---NOTES---\n"), None);
        assert_eq!(extract_answer("---NOTES---\nx\n---ANSWER---"), None);
    }

    #[test]
    fn test_extract_empty_payload() {
        assert_eq!(extract_answer("---ANSWER---\n\n---NOTES---").as_deref(), Some(""));
    }

    #[test]
    fn test_extract_is_idempotent() {
        let text = "noise ---ANSWER--- 'weather today' ---NOTES--- more noise";
        let first = extract_answer(text);
        assert_eq!(first, extract_answer(text));
        assert_eq!(first.as_deref(), Some("'weather today'"));
    }

    #[test]
    fn test_strip_matching_quotes() {
        assert_eq!(strip_matching_quotes("'hello'"), "hello");
        assert_eq!(strip_matching_quotes("\"hello\""), "hello");
        assert_eq!(strip_matching_quotes("hello"), "hello");
        assert_eq!(strip_matching_quotes("'hello"), "'hello");
        assert_eq!(strip_matching_quotes("'hello\""), "'hello\"");
        assert_eq!(strip_matching_quotes("'"), "'");
        assert_eq!(strip_matching_quotes("''"), "");
        assert_eq!(strip_matching_quotes(""), "");
    }

    #[test]
    fn test_strip_only_one_layer() {
        assert_eq!(strip_matching_quotes("\"'nested'\""), "'nested'");
    }
}
