//! Generated question type

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of answer options every question carries
pub const OPTION_COUNT: usize = 4;

/// Why a record is not a valid question
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ItemError {
    #[error("question text is empty")]
    EmptyText,

    #[error("option {0} is empty")]
    EmptyOption(usize),

    #[error("correct index {0} is out of range 0..4")]
    IndexOutOfRange(usize),

    #[error("topic is empty")]
    EmptyTopic,
}

/// A validated multiple-choice question
///
/// Only constructed through `new` or deserialization, both of which enforce
/// the invariants: four non-empty options and a correct index into them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ItemRecord")]
pub struct GeneratedItem {
    #[serde(rename = "question")]
    text: String,
    options: [String; OPTION_COUNT],
    #[serde(rename = "correctIndex")]
    correct_index: usize,
    explanation: String,
    topic: String,
}

/// Wire shape accepted from providers, before validation
#[derive(Debug, Deserialize)]
struct ItemRecord {
    #[serde(alias = "text")]
    question: String,
    options: [String; OPTION_COUNT],
    #[serde(alias = "correctIndex", alias = "answerIndex", alias = "answer_index")]
    correct_index: usize,
    #[serde(default)]
    explanation: String,
    topic: String,
}

impl TryFrom<ItemRecord> for GeneratedItem {
    type Error = ItemError;

    fn try_from(record: ItemRecord) -> Result<Self, Self::Error> {
        GeneratedItem::new(
            record.question,
            record.options,
            record.correct_index,
            record.explanation,
            record.topic,
        )
    }
}

impl GeneratedItem {
    pub fn new(
        text: String,
        options: [String; OPTION_COUNT],
        correct_index: usize,
        explanation: String,
        topic: String,
    ) -> Result<Self, ItemError> {
        if text.trim().is_empty() {
            return Err(ItemError::EmptyText);
        }
        if let Some(i) = options.iter().position(|o| o.trim().is_empty()) {
            return Err(ItemError::EmptyOption(i));
        }
        if correct_index >= OPTION_COUNT {
            return Err(ItemError::IndexOutOfRange(correct_index));
        }
        if topic.trim().is_empty() {
            return Err(ItemError::EmptyTopic);
        }

        Ok(Self {
            text: text.trim().to_string(),
            options: options.map(|o| o.trim().to_string()),
            correct_index,
            explanation: explanation.trim().to_string(),
            topic: topic.trim().to_string(),
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn options(&self) -> &[String; OPTION_COUNT] {
        &self.options
    }

    pub fn correct_index(&self) -> usize {
        self.correct_index
    }

    pub fn correct_option(&self) -> &str {
        &self.options[self.correct_index]
    }

    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> [String; OPTION_COUNT] {
        ["a", "b", "c", "d"].map(String::from)
    }

    #[test]
    fn test_new_validates_index() {
        let err = GeneratedItem::new("Q?".into(), options(), 4, String::new(), String::new());
        assert_eq!(err, Err(ItemError::IndexOutOfRange(4)));

        let item = GeneratedItem::new("Q?".into(), options(), 3, String::new(), "IAM".into())
            .expect("valid item");
        assert_eq!(item.correct_option(), "d");
    }

    #[test]
    fn test_new_rejects_blank_fields() {
        assert_eq!(
            GeneratedItem::new(" ".into(), options(), 0, String::new(), String::new()),
            Err(ItemError::EmptyText)
        );
        let mut opts = options();
        opts[2] = "  ".into();
        assert_eq!(
            GeneratedItem::new("Q?".into(), opts, 0, String::new(), String::new()),
            Err(ItemError::EmptyOption(2))
        );
    }

    #[test]
    fn test_deserialize_accepts_aliases() {
        let json = r#"{"text":"Q?","options":["a","b","c","d"],"answer_index":1,"topic":"IAM"}"#;
        let item: GeneratedItem = serde_json::from_str(json).expect("valid record");
        assert_eq!(item.text(), "Q?");
        assert_eq!(item.correct_index(), 1);
        assert_eq!(item.explanation(), "");
    }

    #[test]
    fn test_topic_is_required() {
        let missing = r#"{"question":"Q?","options":["a","b","c","d"],"correctIndex":0}"#;
        assert!(serde_json::from_str::<GeneratedItem>(missing).is_err());

        let blank = r#"{"question":"Q?","options":["a","b","c","d"],"correctIndex":0,"topic":" "}"#;
        assert!(serde_json::from_str::<GeneratedItem>(blank).is_err());

        assert_eq!(
            GeneratedItem::new("Q?".into(), options(), 0, String::new(), String::new()),
            Err(ItemError::EmptyTopic)
        );
    }

    #[test]
    fn test_deserialize_rejects_wrong_option_count() {
        let json = r#"{"question":"Q?","options":["a","b","c"],"correctIndex":0}"#;
        assert!(serde_json::from_str::<GeneratedItem>(json).is_err());
    }

    #[test]
    fn test_serialized_form_reads_back() {
        let item = GeneratedItem::new(
            "Which service stores objects?".into(),
            ["S3", "EBS", "EFS", "RDS"].map(String::from),
            0,
            "S3 is object storage.".into(),
            "Storage".into(),
        )
        .expect("valid item");
        let json = serde_json::to_string(&item).expect("serialize");
        assert!(json.contains("\"question\""));
        assert!(json.contains("\"correctIndex\""));
        let back: GeneratedItem = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, item);
    }
}
