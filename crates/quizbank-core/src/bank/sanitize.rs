//! Response sanitizer
//!
//! Recovers a question list from provider text that may carry commentary,
//! code fences, or a wrapping object. The batch is accepted whole or not at
//! all, so malformed content never reaches the bank.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use thiserror::Error;

use super::item::GeneratedItem;

/// Field names providers use when wrapping the array in an object
const WRAPPER_FIELDS: &[&str] = &["questions", "items", "mcqs", "data"];

/// Outermost fenced block: first opening fence to the last closing fence on its own line
static OUTER_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```[A-Za-z0-9_+-]*[ \t]*\r?\n(.*)\n[ \t]*```").expect("valid fence regex")
});

/// First fenced block, with or without a language tag
static FENCED_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```[A-Za-z0-9_+-]*[ \t]*\r?\n?(.*?)```").expect("valid fence regex")
});

/// Provider text that could not be turned into a question batch
#[derive(Debug, Error)]
pub enum MalformedContent {
    #[error("no JSON array found in response")]
    NoPayload,

    #[error("payload is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("payload is neither an array nor an object wrapping one")]
    UnexpectedShape,

    #[error("payload contains no questions")]
    Empty,

    #[error("record {index} is malformed: {reason}")]
    InvalidRecord { index: usize, reason: String },
}

/// Extract and validate the question batch from raw provider text
pub fn sanitize(raw: &str) -> Result<Vec<GeneratedItem>, MalformedContent> {
    let payload = parse_payload(raw)?;

    let records = match payload {
        Value::Array(records) => records,
        Value::Object(mut map) => WRAPPER_FIELDS
            .iter()
            .find_map(|field| match map.remove(*field) {
                Some(Value::Array(records)) => Some(records),
                _ => None,
            })
            .ok_or(MalformedContent::UnexpectedShape)?,
        _ => return Err(MalformedContent::UnexpectedShape),
    };

    if records.is_empty() {
        return Err(MalformedContent::Empty);
    }

    records
        .into_iter()
        .enumerate()
        .map(|(index, record)| {
            serde_json::from_value::<GeneratedItem>(record).map_err(|e| {
                MalformedContent::InvalidRecord {
                    index,
                    reason: e.to_string(),
                }
            })
        })
        .collect()
}

/// Locate the JSON value in provider text
///
/// Text that already parses is taken as is, so fences inside string values
/// are left alone. Otherwise fenced bodies are tried before the whole text,
/// each first as-is and then sliced to its outermost brackets.
fn parse_payload(raw: &str) -> Result<Value, MalformedContent> {
    let text = raw.trim();
    if let Ok(value) = serde_json::from_str::<Value>(text) {
        return Ok(value);
    }

    let mut bodies: Vec<&str> = [&OUTER_FENCE, &FENCED_BLOCK]
        .iter()
        .filter_map(|fence| fence.captures(text).and_then(|caps| caps.get(1)))
        .map(|m| m.as_str().trim())
        .collect();
    bodies.push(text);

    let mut last_error = None;
    for body in bodies {
        if let Ok(value) = serde_json::from_str::<Value>(body) {
            return Ok(value);
        }
        if let Some(sliced) = slice_brackets(body) {
            match serde_json::from_str::<Value>(sliced) {
                Ok(value) => return Ok(value),
                Err(e) => last_error = Some(e),
            }
        }
    }

    Err(last_error
        .map(MalformedContent::InvalidJson)
        .unwrap_or(MalformedContent::NoPayload))
}

/// Slice from the first `[` to the last `]`, inclusive
fn slice_brackets(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    (end > start).then(|| &text[start..=end])
}
