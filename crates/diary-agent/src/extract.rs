//! Structured field extraction from session histories.
//!
//! Tool results arrive as loosely shaped JSON. These functions walk a history,
//! collect its `toolResult` blocks in order, and pull out the fields callers
//! care about. Malformed messages and blocks are skipped, never reported.

use serde_json::Value;

use crate::history::{ContentBlock, ToolResultEntry};
use crate::tool::ToolStatus;

/// Separator between reference passages.
const REFERENCE_SEPARATOR: &str = "\n\n";

/// Collect every `toolResult` block of `history` in encounter order.
pub fn extract_tool_results(history: &[Value]) -> Vec<ToolResultEntry> {
    history
        .iter()
        .filter_map(|message| message.get("content").and_then(Value::as_array))
        .flatten()
        .filter_map(|block| block.get("toolResult"))
        .filter_map(ToolResultEntry::decode)
        .collect()
}

fn usable_blocks(entries: &[ToolResultEntry]) -> impl Iterator<Item = &ContentBlock> {
    entries
        .iter()
        .filter(|entry| entry.status.as_deref() != Some(ToolStatus::Error.as_str()))
        .flat_map(|entry| entry.blocks.iter())
}

/// Supporting text across all successful entries, joined by a blank line.
///
/// Per block: a text block contributes its text; a JSON block contributes its
/// `text` field, or failing that its `content` field coerced to a string.
/// Returns `None` when nothing contributed.
pub fn extract_reference(entries: &[ToolResultEntry]) -> Option<String> {
    let parts: Vec<String> = usable_blocks(entries)
        .filter_map(reference_part)
        .filter(|part| !part.trim().is_empty())
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(REFERENCE_SEPARATOR))
    }
}

fn reference_part(block: &ContentBlock) -> Option<String> {
    match block {
        ContentBlock::Text(text) => Some(text.clone()),
        ContentBlock::Json(payload) => {
            if let Some(text) = payload.get("text").and_then(Value::as_str) {
                return Some(text.to_string());
            }
            match payload.get("content")? {
                Value::Null => None,
                Value::String(s) => Some(s.clone()),
                other => Some(other.to_string()),
            }
        }
        ContentBlock::Unknown => None,
    }
}

/// First string value of `key` in any JSON block of a successful entry, in
/// encounter order.
pub fn extract_json_field(entries: &[ToolResultEntry], key: &str) -> Option<String> {
    usable_blocks(entries).find_map(|block| match block {
            ContentBlock::Json(payload) => payload.get(key).and_then(Value::as_str).map(String::from),
            _ => None,
        })
}

/// The `response` field of the first JSON block that has one.
pub fn extract_response(entries: &[ToolResultEntry]) -> Option<String> {
    extract_json_field(entries, "response")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_history() -> Vec<Value> {
        vec![
            json!({"role": "user", "content": [{"text": "오늘 날씨 어땠어?"}]}),
            json!({"role": "assistant", "content": [{"toolUse": {"toolUseId": "t1", "name": "answer_question", "input": {}}}]}),
            json!({"role": "user", "content": [
                {"toolResult": {"toolUseId": "t1", "status": "success", "content": [
                    {"json": {"response": "맑았어요", "reference": "2024-05-01 일기: 맑음"}}
                ]}}
            ]}),
            json!({"role": "user", "content": [
                {"toolResult": {"toolUseId": "t2", "status": "success", "content": [
                    {"text": "passage one"},
                    {"json": {"content": {"score": 0.9}}}
                ]}}
            ]}),
        ]
    }

    #[test]
    fn test_collects_tool_results_in_order() {
        let entries = extract_tool_results(&sample_history());
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].tool_use_id.as_deref(), Some("t1"));
        assert_eq!(entries[1].tool_use_id.as_deref(), Some("t2"));
    }

    #[test]
    fn test_skips_malformed_messages() {
        let mut history = sample_history();
        history.insert(0, json!("garbage"));
        history.insert(1, json!({"role": "user", "content": "not a list"}));
        history.insert(2, json!({"role": "user", "content": [{"toolResult": 17}]}));
        history.push(json!({"role": "user"}));

        let entries = extract_tool_results(&history);
        assert_eq!(entries.len(), 2);
        assert_eq!(extract_response(&entries).as_deref(), Some("맑았어요"));
    }

    #[test]
    fn test_extract_response_and_field() {
        let entries = extract_tool_results(&sample_history());
        assert_eq!(extract_response(&entries).as_deref(), Some("맑았어요"));
        assert_eq!(
            extract_json_field(&entries, "reference").as_deref(),
            Some("2024-05-01 일기: 맑음")
        );
        assert!(extract_json_field(&entries, "missing").is_none());
    }

    #[test]
    fn test_failed_tool_results_are_ignored() {
        let history = vec![json!({"role": "user", "content": [
            {"toolResult": {"toolUseId": "r1", "status": "error", "content": [
                {"text": "Error: retrieval request failed: connection refused"},
                {"json": {"reference": "stale", "response": "stale"}}
            ]}},
            {"toolResult": {"toolUseId": "r2", "status": "success", "content": [
                {"text": "5월 1일: 맑음"},
                {"json": {"reference": "5월 1일 일기", "response": "맑았어요"}}
            ]}}
        ]})];

        let entries = extract_tool_results(&history);
        assert_eq!(entries.len(), 2);
        assert_eq!(extract_reference(&entries).as_deref(), Some("5월 1일: 맑음"));
        assert_eq!(
            extract_json_field(&entries, "reference").as_deref(),
            Some("5월 1일 일기")
        );
        assert_eq!(extract_response(&entries).as_deref(), Some("맑았어요"));
    }

    #[test]
    fn test_extract_reference_policy() {
        let entries = vec![ToolResultEntry {
            tool_use_id: None,
            status: None,
            blocks: vec![
                ContentBlock::Text("plain".into()),
                ContentBlock::Json(json!({"text": "json text", "content": "ignored"})),
                ContentBlock::Json(json!({"content": "json content"})),
                ContentBlock::Json(json!({"content": [1, 2]})),
                ContentBlock::Json(json!({"response": "not a reference"})),
                ContentBlock::Unknown,
            ],
        }];

        assert_eq!(
            extract_reference(&entries).as_deref(),
            Some("plain\n\njson text\n\njson content\n\n[1,2]")
        );
    }

    #[test]
    fn test_extract_reference_none_when_empty() {
        assert!(extract_reference(&[]).is_none());
        let entries = vec![ToolResultEntry {
            blocks: vec![ContentBlock::Json(json!({"response": "x"}))],
            ..Default::default()
        }];
        assert!(extract_reference(&entries).is_none());
    }
}
