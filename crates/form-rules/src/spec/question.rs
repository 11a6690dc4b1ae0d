use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::spec::rules::RuleSet;

/// Upstream column kinds a question can be bound to.
///
/// Type names outside the supported set are kept verbatim so authoring can
/// report them instead of failing to parse the whole form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum QuestionType {
    SingleLineText,
    MultilineText,
    SingleSelect,
    MultipleSelects,
    MultipleAttachments,
    Unsupported(String),
}

impl QuestionType {
    pub const SUPPORTED: [QuestionType; 5] = [
        QuestionType::SingleLineText,
        QuestionType::MultilineText,
        QuestionType::SingleSelect,
        QuestionType::MultipleSelects,
        QuestionType::MultipleAttachments,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            QuestionType::SingleLineText => "singleLineText",
            QuestionType::MultilineText => "multilineText",
            QuestionType::SingleSelect => "singleSelect",
            QuestionType::MultipleSelects => "multipleSelects",
            QuestionType::MultipleAttachments => "multipleAttachments",
            QuestionType::Unsupported(other) => other,
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, QuestionType::Unsupported(_))
    }
}

impl From<String> for QuestionType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "singleLineText" => QuestionType::SingleLineText,
            "multilineText" => QuestionType::MultilineText,
            "singleSelect" => QuestionType::SingleSelect,
            "multipleSelects" => QuestionType::MultipleSelects,
            "multipleAttachments" => QuestionType::MultipleAttachments,
            _ => QuestionType::Unsupported(value),
        }
    }
}

impl From<QuestionType> for String {
    fn from(value: QuestionType) -> Self {
        match value {
            QuestionType::Unsupported(other) => other,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Definition of a single question inside a form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuestionSpec {
    pub question_key: String,
    /// Upstream column the answer is written to.
    #[serde(default)]
    pub airtable_field_id: String,
    pub label: String,
    #[serde(rename = "type")]
    #[schemars(with = "String")]
    pub kind: QuestionType,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditional_rules: Option<RuleSet>,
}

impl QuestionSpec {
    pub fn new(
        question_key: impl Into<String>,
        label: impl Into<String>,
        kind: QuestionType,
    ) -> Self {
        let question_key = question_key.into();
        Self {
            airtable_field_id: question_key.clone(),
            question_key,
            label: label.into(),
            kind,
            required: false,
            options: Vec::new(),
            conditional_rules: None,
        }
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn with_field_id(mut self, field_id: impl Into<String>) -> Self {
        self.airtable_field_id = field_id.into();
        self
    }

    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_rules(mut self, rules: RuleSet) -> Self {
        self.conditional_rules = Some(rules);
        self
    }
}
