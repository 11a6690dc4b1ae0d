use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// How the results of a rule-set's conditions are combined.
///
/// Values other than `AND`/`OR` are kept verbatim so stored forms round-trip;
/// evaluation treats them as "no rule".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Logic {
    #[default]
    And,
    Or,
    Other(String),
}

impl Logic {
    pub fn as_str(&self) -> &str {
        match self {
            Logic::And => "AND",
            Logic::Or => "OR",
            Logic::Other(other) => other,
        }
    }
}

impl From<String> for Logic {
    fn from(value: String) -> Self {
        match value.as_str() {
            "AND" => Logic::And,
            "OR" => Logic::Or,
            _ => Logic::Other(value),
        }
    }
}

impl From<Logic> for String {
    fn from(value: Logic) -> Self {
        match value {
            Logic::Other(other) => other,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Logic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Comparison applied by a single condition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Operator {
    #[default]
    Equals,
    NotEquals,
    Contains,
    Other(String),
}

impl Operator {
    pub fn as_str(&self) -> &str {
        match self {
            Operator::Equals => "equals",
            Operator::NotEquals => "notEquals",
            Operator::Contains => "contains",
            Operator::Other(other) => other,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Operator::Other(_))
    }
}

impl From<String> for Operator {
    fn from(value: String) -> Self {
        match value.as_str() {
            "equals" => Operator::Equals,
            "notEquals" => Operator::NotEquals,
            "contains" => Operator::Contains,
            _ => Operator::Other(value),
        }
    }
}

impl From<Operator> for String {
    fn from(value: Operator) -> Self {
        match value {
            Operator::Other(other) => other,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Literal a condition compares against: one string, or a set of strings for
/// multi-select questions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum ConditionValue {
    Text(String),
    List(Vec<String>),
}

impl Default for ConditionValue {
    fn default() -> Self {
        ConditionValue::Text(String::new())
    }
}

impl From<&str> for ConditionValue {
    fn from(value: &str) -> Self {
        ConditionValue::Text(value.to_string())
    }
}

impl From<String> for ConditionValue {
    fn from(value: String) -> Self {
        ConditionValue::Text(value)
    }
}

impl From<Vec<String>> for ConditionValue {
    fn from(value: Vec<String>) -> Self {
        ConditionValue::List(value)
    }
}

impl From<Vec<&str>> for ConditionValue {
    fn from(value: Vec<&str>) -> Self {
        ConditionValue::List(value.into_iter().map(str::to_string).collect())
    }
}

/// Compares another question's answer against a literal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Key of the question whose answer is inspected.
    #[serde(default)]
    pub question_key: String,
    #[serde(default)]
    #[schemars(with = "String")]
    pub operator: Operator,
    #[serde(default)]
    pub value: ConditionValue,
}

impl Condition {
    pub fn new(
        question_key: impl Into<String>,
        operator: Operator,
        value: impl Into<ConditionValue>,
    ) -> Self {
        Self {
            question_key: question_key.into(),
            operator,
            value: value.into(),
        }
    }

    pub fn equals(question_key: impl Into<String>, value: impl Into<ConditionValue>) -> Self {
        Self::new(question_key, Operator::Equals, value)
    }

    pub fn not_equals(question_key: impl Into<String>, value: impl Into<ConditionValue>) -> Self {
        Self::new(question_key, Operator::NotEquals, value)
    }

    pub fn contains(question_key: impl Into<String>, value: impl Into<ConditionValue>) -> Self {
        Self::new(question_key, Operator::Contains, value)
    }
}

/// Visibility gate attached to a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RuleSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<String>")]
    pub logic: Option<Logic>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

impl RuleSet {
    pub fn new(logic: Logic, conditions: Vec<Condition>) -> Self {
        Self {
            logic: Some(logic),
            conditions,
        }
    }

    pub fn all(conditions: Vec<Condition>) -> Self {
        Self::new(Logic::And, conditions)
    }

    pub fn any(conditions: Vec<Condition>) -> Self {
        Self::new(Logic::Or, conditions)
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}
