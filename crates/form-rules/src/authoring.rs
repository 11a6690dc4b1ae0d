//! Checks and edits applied while a form is being built, before it is saved.

use std::collections::BTreeSet;

use thiserror::Error;

use crate::answers::AnswerMap;
use crate::spec::form::FormSpec;
use crate::spec::question::QuestionSpec;
use crate::spec::rules::{Condition, ConditionValue, Logic, Operator, RuleSet};
use crate::visibility::{VisibilityMap, resolve_visibility};

/// A question whose type is not one of the supported upstream field kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsupportedField {
    pub label: String,
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthoringError {
    #[error("form must name an upstream base and table")]
    MissingTable,
    #[error("form has no questions")]
    EmptyForm,
    #[error("question key '{0}' is used more than once")]
    DuplicateKey(String),
    #[error("unsupported field types: {}", describe_unsupported(.0))]
    UnsupportedTypes(Vec<UnsupportedField>),
    #[error("invalid conditions for {label}")]
    EmptyConditions { label: String },
    #[error("incomplete condition in {label}")]
    IncompleteCondition { label: String },
    #[error("condition in {label} references non-existent field '{key}'")]
    DanglingReference { label: String, key: String },
    #[error("field {label} cannot reference itself")]
    SelfReference { label: String },
    #[error("conditions for {label} use unknown logic '{logic}'")]
    UnknownLogic { label: String, logic: String },
    #[error("question {label} has no condition at index {index}")]
    NoSuchCondition { label: String, index: usize },
}

impl AuthoringError {
    /// Stable snake_case identifier for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            AuthoringError::MissingTable => "missing_table",
            AuthoringError::EmptyForm => "empty_form",
            AuthoringError::DuplicateKey(_) => "duplicate_key",
            AuthoringError::UnsupportedTypes(_) => "unsupported_types",
            AuthoringError::EmptyConditions { .. } => "empty_conditions",
            AuthoringError::IncompleteCondition { .. } => "incomplete_condition",
            AuthoringError::DanglingReference { .. } => "dangling_reference",
            AuthoringError::SelfReference { .. } => "self_reference",
            AuthoringError::UnknownLogic { .. } => "unknown_logic",
            AuthoringError::NoSuchCondition { .. } => "no_such_condition",
        }
    }
}

fn describe_unsupported(fields: &[UnsupportedField]) -> String {
    fields
        .iter()
        .map(|field| format!("{} ({})", field.label, field.kind))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Rejects forms that cannot be saved.
pub fn check_form(spec: &FormSpec) -> Result<(), AuthoringError> {
    if spec.airtable_base_id.trim().is_empty() || spec.airtable_table_id.trim().is_empty() {
        return Err(AuthoringError::MissingTable);
    }
    if spec.questions.is_empty() {
        return Err(AuthoringError::EmptyForm);
    }

    let mut seen = BTreeSet::new();
    for question in &spec.questions {
        if !seen.insert(question.question_key.as_str()) {
            return Err(AuthoringError::DuplicateKey(question.question_key.clone()));
        }
    }

    let unsupported = spec
        .questions
        .iter()
        .filter(|question| !question.kind.is_supported())
        .map(|question| UnsupportedField {
            label: question.label.clone(),
            kind: question.kind.to_string(),
        })
        .collect::<Vec<_>>();
    if !unsupported.is_empty() {
        return Err(AuthoringError::UnsupportedTypes(unsupported));
    }

    for question in &spec.questions {
        if let Some(rules) = &question.conditional_rules {
            check_rules(spec, question, rules)?;
        }
    }

    Ok(())
}

fn check_rules(
    spec: &FormSpec,
    question: &QuestionSpec,
    rules: &RuleSet,
) -> Result<(), AuthoringError> {
    let label = || question.label.clone();

    if rules.conditions.is_empty() {
        return Err(AuthoringError::EmptyConditions { label: label() });
    }

    for condition in &rules.conditions {
        if condition.question_key.trim().is_empty() || !condition.operator.is_known() {
            return Err(AuthoringError::IncompleteCondition { label: label() });
        }
        if spec.question(&condition.question_key).is_none() {
            return Err(AuthoringError::DanglingReference {
                label: label(),
                key: condition.question_key.clone(),
            });
        }
        if condition.question_key == question.question_key {
            return Err(AuthoringError::SelfReference { label: label() });
        }
    }

    match &rules.logic {
        Some(Logic::And | Logic::Or) => Ok(()),
        Some(Logic::Other(logic)) => Err(AuthoringError::UnknownLogic {
            label: label(),
            logic: logic.clone(),
        }),
        None => Err(AuthoringError::UnknownLogic {
            label: label(),
            logic: String::new(),
        }),
    }
}

/// Questions a condition on `key` may depend on: every other question.
pub fn dependency_candidates<'a>(spec: &'a FormSpec, key: &str) -> Vec<&'a QuestionSpec> {
    spec.questions
        .iter()
        .filter(|question| question.question_key != key)
        .collect()
}

/// What the author sees for a set of sample answers. Same evaluation as
/// rendering and submission.
pub fn preview(spec: &FormSpec, answers: &AnswerMap) -> VisibilityMap {
    resolve_visibility(spec, answers)
}

/// Partial update of one condition.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConditionPatch {
    pub question_key: Option<String>,
    pub operator: Option<Operator>,
    pub value: Option<ConditionValue>,
}

/// Edits a question's rule-set the way the form builder does.
///
/// A rule-set never ends up with zero conditions: removing the last one
/// removes the rule-set.
pub struct RuleEditor<'a> {
    question: &'a mut QuestionSpec,
}

impl<'a> RuleEditor<'a> {
    pub fn new(question: &'a mut QuestionSpec) -> Self {
        Self { question }
    }

    pub fn rules(&self) -> Option<&RuleSet> {
        self.question.conditional_rules.as_ref()
    }

    /// Appends a blank `equals` condition, creating an `AND` rule-set first
    /// when the question has none. Returns the new condition's index.
    pub fn add_condition(&mut self) -> usize {
        let rules = self
            .question
            .conditional_rules
            .get_or_insert_with(|| RuleSet::all(Vec::new()));
        rules.conditions.push(Condition::default());
        rules.conditions.len() - 1
    }

    pub fn update_condition(
        &mut self,
        index: usize,
        patch: ConditionPatch,
    ) -> Result<(), AuthoringError> {
        let condition = self.condition_mut(index)?;
        if let Some(key) = patch.question_key {
            condition.question_key = key;
        }
        if let Some(operator) = patch.operator {
            condition.operator = operator;
        }
        if let Some(value) = patch.value {
            condition.value = value;
        }
        Ok(())
    }

    pub fn remove_condition(&mut self, index: usize) -> Result<Condition, AuthoringError> {
        let label = self.question.label.clone();
        let Some(rules) = self
            .question
            .conditional_rules
            .as_mut()
            .filter(|rules| index < rules.conditions.len())
        else {
            return Err(AuthoringError::NoSuchCondition { label, index });
        };
        let removed = rules.conditions.remove(index);
        if rules.conditions.is_empty() {
            self.question.conditional_rules = None;
        }
        Ok(removed)
    }

    /// Sets the combinator; no-op when the question has no rule-set.
    pub fn set_logic(&mut self, logic: Logic) {
        if let Some(rules) = self.question.conditional_rules.as_mut() {
            rules.logic = Some(logic);
        }
    }

    pub fn clear(&mut self) {
        self.question.conditional_rules = None;
    }

    fn condition_mut(&mut self, index: usize) -> Result<&mut Condition, AuthoringError> {
        let label = self.question.label.clone();
        self.question
            .conditional_rules
            .as_mut()
            .and_then(|rules| rules.conditions.get_mut(index))
            .ok_or(AuthoringError::NoSuchCondition { label, index })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::question::QuestionType;

    fn question(key: &str) -> QuestionSpec {
        QuestionSpec::new(key, key.to_uppercase(), QuestionType::SingleLineText)
    }

    #[test]
    fn editor_creates_and_clears_rule_set() {
        let mut q = question("state");
        let mut editor = RuleEditor::new(&mut q);
        assert_eq!(editor.add_condition(), 0);
        assert_eq!(editor.add_condition(), 1);
        assert_eq!(editor.rules().map(|rules| rules.logic.clone()), Some(Some(Logic::And)));

        editor
            .update_condition(
                0,
                ConditionPatch {
                    question_key: Some("country".into()),
                    value: Some("USA".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        editor.set_logic(Logic::Or);

        editor.remove_condition(1).unwrap();
        let rules = editor.rules().cloned().unwrap();
        assert_eq!(rules.logic, Some(Logic::Or));
        assert_eq!(rules.conditions, vec![Condition::equals("country", "USA")]);

        editor.remove_condition(0).unwrap();
        assert!(editor.rules().is_none());
        assert!(q.conditional_rules.is_none());
    }

    #[test]
    fn editor_rejects_out_of_range_index() {
        let mut q = question("a");
        let mut editor = RuleEditor::new(&mut q);
        assert!(matches!(
            editor.remove_condition(0),
            Err(AuthoringError::NoSuchCondition { index: 0, .. })
        ));
        editor.add_condition();
        assert!(editor.update_condition(3, ConditionPatch::default()).is_err());
    }

    #[test]
    fn candidates_exclude_the_question_itself() {
        let spec = FormSpec::new("app", "tbl", vec![question("a"), question("b"), question("c")]);
        let keys = dependency_candidates(&spec, "b")
            .iter()
            .map(|question| question.question_key.as_str())
            .collect::<Vec<_>>();
        assert_eq!(keys, vec!["a", "c"]);
    }
}
