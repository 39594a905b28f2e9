//! Recovering a JSON object from free-form model output
//!
//! Models asked for "only JSON" still wrap it in prose or code fences. This is
//! a best-effort heuristic, not a general JSON-in-text parser:
//!
//! 1. Take the span from the first `{` to the last `}` and parse it.
//! 2. If that fails (two objects, or a stray `}` in trailing prose), scan the
//!    balanced brace spans left to right, tracking string literals and
//!    escapes, and return the first one that parses as an object.
//!
//! A reply holding several objects yields the first one that parses on its
//! own; braces inside malformed string literals can still defeat the scan.
//! Only the first [`MAX_SCAN_STARTS`] opening braces are tried as span
//! starts, which keeps pathological replies linear.

use crate::error::{AnalyzerError, Result};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Opening braces tried by the balanced-span fallback
pub const MAX_SCAN_STARTS: usize = 16;

/// Extracts the first JSON object from `text`
pub fn extract_json_object(text: &str) -> Result<Map<String, Value>> {
    let start = text.find('{');
    let end = text.rfind('}');

    let (start, end) = match (start, end) {
        (Some(start), Some(end)) if start < end => (start, end),
        _ => {
            return Err(AnalyzerError::Extraction(
                "No JSON object found in response".to_string(),
            ))
        }
    };

    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(&text[start..=end]) {
        return Ok(map);
    }

    text.match_indices('{')
        .take(MAX_SCAN_STARTS)
        .filter_map(|(open, _)| balanced_span(text, open))
        .find_map(|span| match serde_json::from_str::<Value>(span) {
            Ok(Value::Object(map)) => Some(map),
            _ => None,
        })
        .ok_or_else(|| {
            AnalyzerError::Extraction("No parseable JSON object found in response".to_string())
        })
}

/// Extracts the first JSON object from `text` and deserializes it
pub fn extract_as<T: DeserializeOwned>(text: &str) -> Result<T> {
    let map = extract_json_object(text)?;
    serde_json::from_value(Value::Object(map))
        .map_err(|e| AnalyzerError::Validation(e.to_string()))
}

/// Returns the balanced `{...}` span opening at byte offset `open`
fn balanced_span(text: &str, open: usize) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[open..].char_indices() {
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
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[open..=open + offset]);
                }
            }
            _ => {}
        }
    }

    None
}
