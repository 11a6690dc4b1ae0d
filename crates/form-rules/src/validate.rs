use serde_json::Value;

use crate::answers::{AnswerMap, ValidationError, ValidationResult, answer};
use crate::spec::form::FormSpec;
use crate::spec::question::{QuestionSpec, QuestionType};
use crate::visibility::resolve_visibility;

/// Server-side check of a submission.
///
/// Only questions visible for these answers are checked; a hidden required
/// question with no answer is not an error.
pub fn validate_submission(spec: &FormSpec, answers: &AnswerMap) -> ValidationResult {
    let visibility = resolve_visibility(spec, answers);

    let mut errors = Vec::new();
    let mut missing_required = Vec::new();

    for question in &spec.questions {
        if !visibility.is_visible(&question.question_key) {
            continue;
        }

        match answer(answers, &question.question_key) {
            None => {
                if question.required {
                    missing_required.push(question.question_key.clone());
                    errors.push(base_error(
                        question,
                        format!("{} is required", question.label),
                        "required",
                    ));
                }
            }
            Some(Value::Array(items)) if items.is_empty() => {
                if question.required {
                    missing_required.push(question.question_key.clone());
                    errors.push(base_error(
                        question,
                        format!("{} requires at least one selection", question.label),
                        "empty_selection",
                    ));
                }
            }
            Some(value) => {
                if let Some(error) = validate_value(question, value) {
                    errors.push(error);
                }
            }
        }
    }

    let unknown_fields = answers
        .keys()
        .filter(|key| spec.question(key).is_none())
        .cloned()
        .collect::<Vec<_>>();

    ValidationResult {
        valid: errors.is_empty(),
        errors,
        missing_required,
        unknown_fields,
    }
}

fn validate_value(question: &QuestionSpec, value: &Value) -> Option<ValidationError> {
    match &question.kind {
        QuestionType::SingleLineText | QuestionType::MultilineText => {
            (!value.is_string()).then(|| type_mismatch(question))
        }
        QuestionType::SingleSelect => {
            let Some(choice) = value.as_str() else {
                return Some(type_mismatch(question));
            };
            check_option(question, choice)
        }
        QuestionType::MultipleSelects => {
            let Some(items) = value.as_array() else {
                return Some(type_mismatch(question));
            };
            for item in items {
                let Some(choice) = item.as_str() else {
                    return Some(type_mismatch(question));
                };
                if let Some(error) = check_option(question, choice) {
                    return Some(error);
                }
            }
            None
        }
        QuestionType::MultipleAttachments => {
            (!value.is_array()).then(|| type_mismatch(question))
        }
        QuestionType::Unsupported(_) => None,
    }
}

fn check_option(question: &QuestionSpec, choice: &str) -> Option<ValidationError> {
    if question.options.is_empty() || question.options.iter().any(|option| option == choice) {
        None
    } else {
        Some(base_error(
            question,
            format!("{} has no option '{}'", question.label, choice),
            "invalid_option",
        ))
    }
}

fn type_mismatch(question: &QuestionSpec) -> ValidationError {
    base_error(
        question,
        format!("{} expects a {} answer", question.label, question.kind),
        "type_mismatch",
    )
}

fn base_error(question: &QuestionSpec, message: String, code: &str) -> ValidationError {
    ValidationError {
        question_key: question.question_key.clone(),
        label: question.label.clone(),
        message,
        code: code.into(),
    }
}
