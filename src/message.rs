use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

/// Table the inspector reads from.
pub const MESSAGES_TABLE: &str = "interview_messages";

/// Number of characters of a question body shown in the recency view.
pub const PREVIEW_CHARS: usize = 100;

/// Placeholder shown for metadata keys that are absent.
pub const UNKNOWN: &str = "unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    Question,
    Answer,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Question => "question",
            MessageType::Answer => "answer",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
    pub default: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuestionRow {
    pub id: String,
    pub session_id: String,
    pub content: String,
    pub metadata: Option<String>,
    pub timestamp: DateTime<Utc>,
    /// Only populated by the recency query.
    pub hours_ago: Option<f64>,
}

impl QuestionRow {
    /// Returns the content cut to [`PREVIEW_CHARS`] characters, with `...`
    /// appended when anything was cut.
    pub fn preview(&self) -> String {
        truncate_content(&self.content, PREVIEW_CHARS)
    }

    pub fn parsed_metadata(&self) -> Option<Metadata> {
        self.metadata.as_deref().and_then(Metadata::parse)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MessageCounts {
    pub questions: i64,
    pub answers: i64,
}

/// Fields the ingestion side writes into a question's metadata.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct QuestionMetadata {
    #[serde(default)]
    pub source: Option<Value>,
    #[serde(default)]
    pub category: Option<Value>,
    #[serde(default)]
    pub difficulty: Option<Value>,
}

impl QuestionMetadata {
    pub fn source(&self) -> String {
        display_value(self.source.as_ref())
    }

    pub fn category(&self) -> String {
        display_value(self.category.as_ref())
    }

    pub fn difficulty(&self) -> String {
        display_value(self.difficulty.as_ref())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Metadata {
    Parsed(QuestionMetadata),
    /// Value that is not a JSON object, shown verbatim.
    Raw(String),
}

impl Metadata {
    /// Attempts to read `raw` as a JSON object. Returns `None` for values that
    /// carry nothing (empty text, JSON `null`, `{}` or `[]`) so that nothing
    /// gets rendered for them.
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.trim().is_empty() {
            return None;
        }
        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Null) => None,
            Ok(Value::Object(map)) if map.is_empty() => None,
            Ok(Value::Array(items)) if items.is_empty() => None,
            Ok(Value::Object(map)) => {
                match serde_json::from_value::<QuestionMetadata>(Value::Object(map)) {
                    Ok(meta) => Some(Metadata::Parsed(meta)),
                    Err(_) => Some(Metadata::Raw(raw.to_string())),
                }
            }
            Ok(_) | Err(_) => Some(Metadata::Raw(raw.to_string())),
        }
    }
}

fn display_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => UNKNOWN.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

pub fn truncate_content(content: &str, max_chars: usize) -> String {
    match content.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &content[..cut]),
        None => content.to_string(),
    }
}
