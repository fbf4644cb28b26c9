//! Recovering a JSON object from a loosely-structured LLM response
//! (SPEC_FULL.md §4.2 step 4, ported from the original Python's `extract_json_from_text`).

use regex::Regex;
use serde_json::Value;

/// Recovery order: (a) direct parse; (b) first fenced code block containing a JSON
/// object; (c) longest-balanced-brace scan from the first `{`, trying every
/// depth-0-closing `}`. The first strategy to produce valid JSON wins.
pub fn extract_json(text: &str) -> Option<Value> {
    if let Ok(value) = serde_json::from_str::<Value>(text.trim()) {
        return Some(value);
    }

    if let Some(value) = extract_from_fenced_block(text) {
        return Some(value);
    }

    extract_from_brace_scan(text)
}

fn extract_from_fenced_block(text: &str) -> Option<Value> {
    let re = Regex::new(r"(?s)```(?:json)?\s*(\{.*?\})\s*```").ok()?;
    let captured = re.captures(text)?.get(1)?.as_str();
    serde_json::from_str(captured).ok()
}

fn extract_from_brace_scan(text: &str) -> Option<Value> {
    let bytes = text.as_bytes();
    let start = text.find('{')?;

    let mut depth: i32 = 0;
    for (offset, byte) in bytes[start..].iter().enumerate() {
        match *byte as char {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let end = start + offset + 1;
                    if let Ok(value) = serde_json::from_str::<Value>(&text[start..end]) {
                        return Some(value);
                    }
                }
            }
            _ => {}
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_parse() {
        let text = r#"{"most_relevant_segments": []}"#;
        assert!(extract_json(text).is_some());
    }

    #[test]
    fn test_fenced_code_block() {
        let text = "Sure, here you go:\n```json\n{\"most_relevant_segments\": []}\n```\nenjoy";
        let value = extract_json(text).expect("should recover JSON from fenced block");
        assert!(value.get("most_relevant_segments").is_some());
    }

    #[test]
    fn test_fenced_block_without_json_tag() {
        let text = "```\n{\"a\": 1}\n```";
        assert!(extract_json(text).is_some());
    }

    #[test]
    fn test_brace_scan_with_trailing_prose() {
        let text = "Here is the result: {\"a\": {\"b\": 1}} -- hope that helps!";
        let value = extract_json(text).expect("brace scan should recover nested object");
        assert_eq!(value["a"]["b"], 1);
    }

    #[test]
    fn test_unrecoverable_text_returns_none() {
        let text = "Sure, here you go:\n```\nnot-json\n```";
        assert!(extract_json(text).is_none());
    }
}
