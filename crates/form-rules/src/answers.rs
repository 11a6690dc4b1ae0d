use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Answers keyed by question key, as entered by the person filling a form.
pub type AnswerMap = Map<String, Value>;

/// Copies the answer map out of a JSON document; anything other than an
/// object is treated as "no answers".
pub fn answer_map(value: &Value) -> AnswerMap {
    value.as_object().cloned().unwrap_or_default()
}

/// Looks up an answer, treating `null` and the empty string as unanswered.
pub fn answer<'a>(answers: &'a AnswerMap, key: &str) -> Option<&'a Value> {
    answers.get(key).filter(|value| !is_blank(value))
}

pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.is_empty(),
        _ => false,
    }
}

/// Renders a scalar answer the way the comparison rules see it.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => "null".to_string(),
        Value::Array(items) => items.iter().map(stringify).collect::<Vec<_>>().join(","),
        other => other.to_string(),
    }
}

/// Validation error metadata reported to the submitter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ValidationError {
    pub question_key: String,
    pub label: String,
    pub message: String,
    pub code: String,
}

/// Result of validating one submission against a form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Default)]
pub struct ValidationResult {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ValidationError>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_required: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unknown_fields: Vec<String>,
}

impl ValidationResult {
    /// Message shown to the submitter when the submission is rejected.
    pub fn first_message(&self) -> Option<&str> {
        self.errors.first().map(|error| error.message.as_str())
    }
}
