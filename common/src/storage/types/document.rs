use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AppError;

/// A raw corpus record as produced by a batch source, before validation.
pub type RawRecord = Value;

/// A validated corpus document. Serialized with the field names used by the index mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "docid")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
}

impl Document {
    pub fn new(id: impl Into<String>, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            body: body.into(),
        }
    }

    /// Validates a raw record: it must be a key/value object carrying a non-empty
    /// `docid` (or `id`). Missing or non-string `title`/`body` become empty strings.
    pub fn from_record(record: &RawRecord) -> Result<Self, AppError> {
        let Value::Object(fields) = record else {
            return Err(AppError::Validation(format!(
                "record is not an object: {}",
                preview(record)
            )));
        };

        let id = fields
            .get("docid")
            .or_else(|| fields.get("id"))
            .and_then(identifier_text)
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| {
                AppError::Validation(format!("record without id: {}", preview(record)))
            })?;

        let text_field = |name: &str| {
            fields
                .get(name)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };

        Ok(Self {
            id,
            title: text_field("title"),
            body: text_field("body"),
        })
    }
}

fn identifier_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn preview(record: &RawRecord) -> String {
    let rendered = record.to_string();
    if rendered.chars().count() > 120 {
        let truncated: String = rendered.chars().take(120).collect();
        format!("{truncated}...")
    } else {
        rendered
    }
}
