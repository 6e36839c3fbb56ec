//! Recovery of an [`OrchestrationResult`] from raw model text.
//!
//! Stages, first success wins:
//! 1. the whole text as JSON
//! 2. a fenced code block (optionally tagged `json`) holding an object
//! 3. the smallest balanced `{...}` span containing the key `"type"`, found
//!    in a single pass over the text
//!
//! A stage succeeds only for an object with a known string `type`; missing
//! `content` or `message` become empty. When every stage fails the result is
//! `{data, "", "saved"}` and a warning with a preview of the text is logged.

use std::ops::Range;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

use crate::result::{OrchestrationResult, ResultType};

const PREVIEW_CHARS: usize = 200;

const TYPE_KEY: &str = "\"type\"";

/// Brace spans parsed before giving up on stage 3.
const MAX_BRACE_ATTEMPTS: usize = 32;

/// Parse model output into a result. Never fails.
pub fn parse_structured_response(raw: &str) -> OrchestrationResult {
    if let Some(result) = parse_object(raw.trim()) {
        debug!(stage = "direct", "Parsed structured response");
        return result;
    }

    if let Some(result) = fenced_blocks(raw).find_map(parse_object) {
        debug!(stage = "fenced", "Parsed structured response");
        return result;
    }

    if let Some(result) = typed_brace_candidates(raw).into_iter().find_map(parse_object)
    {
        debug!(stage = "brace", "Parsed structured response");
        return result;
    }

    warn!(
        preview = %diary_core::preview(raw, PREVIEW_CHARS),
        "Unparseable structured response, defaulting to saved"
    );
    OrchestrationResult::saved()
}

fn parse_object(text: &str) -> Option<OrchestrationResult> {
    let value: Value = serde_json::from_str(text).ok()?;
    let obj = value.as_object()?;

    let kind = match obj.get("type")?.as_str()? {
        "data" => ResultType::Data,
        "answer" => ResultType::Answer,
        "error" => ResultType::Error,
        _ => return None,
    };
    let field = |key: &str| {
        obj.get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };

    Some(
        OrchestrationResult {
            kind,
            content: field("content"),
            message: field("message"),
        }
        .normalized(),
    )
}

fn fence_regex() -> Option<&'static Regex> {
    static FENCE: OnceLock<Option<Regex>> = OnceLock::new();
    FENCE
        .get_or_init(|| Regex::new(r"(?s)```(?:json)?\s*(\{.*?\})\s*```").ok())
        .as_ref()
}

fn fenced_blocks(raw: &str) -> impl Iterator<Item = &str> {
    fence_regex()
        .into_iter()
        .flat_map(move |re| re.captures_iter(raw))
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
}

/// Byte ranges of every balanced brace span, shortest first, in one pass.
/// Braces inside JSON strings are not counted; quotes only open a string
/// inside a brace.
fn brace_spans(raw: &str) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    let mut open: Vec<usize> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (idx, ch) in raw.char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' if !open.is_empty() => in_string = true,
            '{' => open.push(idx),
            '}' => {
                if let Some(start) = open.pop() {
                    spans.push(start..idx + 1);
                }
            }
            _ => {}
        }
    }

    spans.sort_by_key(|span| span.len());
    spans
}

/// Brace spans containing the `"type"` key, shortest first, at most
/// [`MAX_BRACE_ATTEMPTS`] of them.
fn typed_brace_candidates(raw: &str) -> Vec<&str> {
    let keys: Vec<usize> = raw.match_indices(TYPE_KEY).map(|(at, _)| at).collect();
    if keys.is_empty() {
        return Vec::new();
    }

    brace_spans(raw)
        .into_iter()
        .filter(|span| {
            let first = keys.partition_point(|&at| at < span.start);
            keys.get(first)
                .is_some_and(|&at| at + TYPE_KEY.len() <= span.end)
        })
        .take(MAX_BRACE_ATTEMPTS)
        .map(|span| &raw[span])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_json_round_trip() {
        let result = parse_structured_response(
            r#"{"type":"answer","content":"맑았어요","message":"answered"}"#,
        );
        assert_eq!(result, OrchestrationResult::answered("맑았어요"));
    }

    #[test]
    fn test_fenced_block() {
        let raw = "결과입니다.\n```json\n{\"type\": \"answer\", \"content\": \"비\", \"message\": \"ok\"}\n```\n끝";
        let result = parse_structured_response(raw);
        assert_eq!(result.kind, ResultType::Answer);
        assert_eq!(result.content, "비");
        assert_eq!(result.message, "ok");
    }

    #[test]
    fn test_untagged_fence() {
        let raw = "```\n{\"type\": \"data\", \"content\": \"\", \"message\": \"saved\"}\n```";
        assert_eq!(parse_structured_response(raw), OrchestrationResult::saved());
    }

    #[test]
    fn test_brace_span_in_prose() {
        let raw = r#"Here you go: {"type": "answer", "content": "파스타", "message": "answered"} hope it helps"#;
        assert_eq!(parse_structured_response(raw), OrchestrationResult::answered("파스타"));
    }

    #[test]
    fn test_smallest_span_with_type_wins() {
        let raw = r#"note {"meta": 1} then {"wrapper": {"type": "answer", "content": "inner", "message": "m"}}"#;
        let result = parse_structured_response(raw);
        assert_eq!(result.content, "inner");
    }

    #[test]
    fn test_braces_inside_strings() {
        let raw = r#"x {"type": "answer", "content": "a } b", "message": "m"} y"#;
        assert_eq!(parse_structured_response(raw).content, "a } b");
    }

    #[test]
    fn test_garbage_defaults_to_saved() {
        assert_eq!(
            parse_structured_response("not json at all"),
            OrchestrationResult::saved()
        );
        assert_eq!(parse_structured_response(""), OrchestrationResult::saved());
        assert_eq!(parse_structured_response("{{{"), OrchestrationResult::saved());
    }

    #[test]
    fn test_missing_fields_default_empty() {
        let result = parse_structured_response(r#"{"type": "answer"}"#);
        assert_eq!(result.kind, ResultType::Answer);
        assert_eq!(result.content, "");
        assert_eq!(result.message, "");
    }

    #[test]
    fn test_non_string_or_unknown_type_rejected() {
        assert_eq!(
            parse_structured_response(r#"{"type": 3, "content": "x"}"#),
            OrchestrationResult::saved()
        );
        assert_eq!(
            parse_structured_response(r#"{"type": "question", "content": "x"}"#),
            OrchestrationResult::saved()
        );
    }

    #[test]
    fn test_data_content_is_cleared() {
        let result = parse_structured_response(r#"{"type": "data", "content": "x", "message": "saved"}"#);
        assert_eq!(result, OrchestrationResult::saved());
    }

    #[test]
    fn test_unbalanced_braces_scan_linearly() {
        let raw = format!("{}\"type\"", "{".repeat(100_000));
        let started = std::time::Instant::now();
        assert_eq!(parse_structured_response(&raw), OrchestrationResult::saved());
        assert!(started.elapsed() < std::time::Duration::from_secs(2));
    }

    #[test]
    fn test_deeply_nested_type_spans_are_bounded() {
        let raw = format!(
            "{}{{\"type\": \"answer\", \"content\": \"x\"}}{}",
            "{\"a\": ".repeat(5_000),
            "}".repeat(5_000)
        );
        let candidates = typed_brace_candidates(&raw);
        assert_eq!(candidates.len(), MAX_BRACE_ATTEMPTS);
        assert_eq!(candidates[0], r#"{"type": "answer", "content": "x"}"#);
        assert_eq!(parse_structured_response(&raw).content, "x");
    }

    #[test]
    fn test_brace_after_stray_quote() {
        let raw = r#"He said "hi. {"type": "answer", "content": "ok", "message": "m"}"#;
        assert_eq!(parse_structured_response(raw).content, "ok");
    }

    #[test]
    fn test_brace_candidates_shortest_first() {
        let raw = r#"{"a": {"b": 1}}"#;
        let spans: Vec<&str> = brace_spans(raw).into_iter().map(|span| &raw[span]).collect();
        assert_eq!(spans, vec![r#"{"b": 1}"#, r#"{"a": {"b": 1}}"#]);
    }
}
