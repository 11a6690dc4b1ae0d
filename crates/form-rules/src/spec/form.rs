use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::spec::question::QuestionSpec;

pub const DEFAULT_FORM_NAME: &str = "Untitled Form";

/// A form bound to one upstream table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FormSpec {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
    #[serde(default)]
    pub airtable_base_id: String,
    #[serde(default)]
    pub airtable_table_id: String,
    #[serde(default)]
    pub questions: Vec<QuestionSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl FormSpec {
    pub fn new(
        base_id: impl Into<String>,
        table_id: impl Into<String>,
        questions: Vec<QuestionSpec>,
    ) -> Self {
        Self {
            id: String::new(),
            name: DEFAULT_FORM_NAME.to_string(),
            owner_id: None,
            airtable_base_id: base_id.into(),
            airtable_table_id: table_id.into(),
            questions,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn question(&self, key: &str) -> Option<&QuestionSpec> {
        self.questions
            .iter()
            .find(|question| question.question_key == key)
    }

    pub fn question_mut(&mut self, key: &str) -> Option<&mut QuestionSpec> {
        self.questions
            .iter_mut()
            .find(|question| question.question_key == key)
    }

    /// Finds the question bound to an upstream column.
    pub fn question_for_field(&self, field_id: &str) -> Option<&QuestionSpec> {
        self.questions
            .iter()
            .find(|question| question.airtable_field_id == field_id)
    }

    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            DEFAULT_FORM_NAME
        } else {
            &self.name
        }
    }
}
