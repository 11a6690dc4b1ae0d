//! Conditional visibility rules.
//!
//! Every call site (authoring preview, rendering, submission validation) goes
//! through [`should_show`], so the client preview and the server decision can
//! never disagree for the same rule-set and answers.

use serde_json::Value;
use tracing::warn;

use crate::answers::{AnswerMap, answer, stringify};
use crate::spec::rules::{Condition, ConditionValue, Logic, Operator, RuleSet};

/// Decides whether a single condition holds for the given answers.
///
/// An unanswered dependency (missing, `null` or `""`) never satisfies a
/// condition, whatever the operator; `notEquals` included.
pub fn evaluate_condition(condition: &Condition, answers: &AnswerMap) -> bool {
    let Some(current) = answer(answers, &condition.question_key) else {
        return false;
    };

    match &condition.operator {
        Operator::Equals => values_equal(current, &condition.value),
        Operator::NotEquals => !values_equal(current, &condition.value),
        Operator::Contains => contains_value(current, &condition.value),
        Operator::Other(operator) => {
            warn!(
                question_key = %condition.question_key,
                operator = %operator,
                "unrecognised condition operator; condition does not match"
            );
            false
        }
    }
}

/// Decides whether a question gated by `rules` is currently visible.
///
/// No rule-set, or one without conditions, means always visible. A missing or
/// unrecognised `logic` value fails open.
pub fn should_show(rules: Option<&RuleSet>, answers: &AnswerMap) -> bool {
    let Some(rules) = rules else {
        return true;
    };
    if rules.conditions.is_empty() {
        return true;
    }

    let results = rules
        .conditions
        .iter()
        .map(|condition| evaluate_condition(condition, answers))
        .collect::<Vec<_>>();

    match &rules.logic {
        Some(Logic::And) => results.iter().all(|matched| *matched),
        Some(Logic::Or) => results.iter().any(|matched| *matched),
        Some(Logic::Other(logic)) => {
            warn!(logic = %logic, "unrecognised rule logic; treating question as visible");
            true
        }
        None => {
            warn!("rule-set has no logic; treating question as visible");
            true
        }
    }
}

impl Condition {
    pub fn evaluate(&self, answers: &AnswerMap) -> bool {
        evaluate_condition(self, answers)
    }
}

impl RuleSet {
    pub fn should_show(&self, answers: &AnswerMap) -> bool {
        should_show(Some(self), answers)
    }
}

fn values_equal(current: &Value, expected: &ConditionValue) -> bool {
    match (current, expected) {
        (Value::Array(items), ConditionValue::List(expected)) => {
            let Some(mut actual) = items
                .iter()
                .map(|item| item.as_str())
                .collect::<Option<Vec<_>>>()
            else {
                return false;
            };
            let mut expected = expected.iter().map(String::as_str).collect::<Vec<_>>();
            actual.sort_unstable();
            expected.sort_unstable();
            actual == expected
        }
        (Value::Array(items), ConditionValue::Text(expected)) => {
            items.iter().any(|item| item.as_str() == Some(expected.as_str()))
        }
        (Value::String(_) | Value::Number(_) | Value::Bool(_), ConditionValue::Text(expected)) => {
            stringify(current).to_lowercase() == expected.to_lowercase()
        }
        _ => false,
    }
}

fn contains_value(current: &Value, expected: &ConditionValue) -> bool {
    match (current, expected) {
        (Value::Array(items), expected) => {
            let needle = condition_text(expected).to_lowercase();
            items
                .iter()
                .any(|item| stringify(item).to_lowercase().contains(&needle))
        }
        (Value::String(text), ConditionValue::Text(expected)) => {
            text.to_lowercase().contains(&expected.to_lowercase())
        }
        _ => false,
    }
}

fn condition_text(value: &ConditionValue) -> String {
    match value {
        ConditionValue::Text(text) => text.clone(),
        ConditionValue::List(items) => items.join(","),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::answers::answer_map;
    use serde_json::json;

    fn answers(value: Value) -> AnswerMap {
        answer_map(&value)
    }

    #[test]
    fn absent_answer_never_matches() {
        let empty = answers(json!({ "q": null, "r": "" }));
        for key in ["q", "r", "missing"] {
            assert!(!Condition::equals(key, "x").evaluate(&empty));
            assert!(!Condition::not_equals(key, "x").evaluate(&empty));
            assert!(!Condition::contains(key, "x").evaluate(&empty));
        }
    }

    #[test]
    fn scalar_equality_ignores_case() {
        let given = answers(json!({ "country": "usa" }));
        assert!(Condition::equals("country", "USA").evaluate(&given));
        assert!(!Condition::not_equals("country", "USA").evaluate(&given));
        assert!(Condition::not_equals("country", "Other").evaluate(&given));
    }

    #[test]
    fn numbers_and_booleans_compare_by_string_form() {
        let given = answers(json!({ "n": 42, "b": true }));
        assert!(Condition::equals("n", "42").evaluate(&given));
        assert!(Condition::equals("b", "TRUE").evaluate(&given));
    }

    #[test]
    fn list_answers_compare_as_unordered_sets() {
        let given = answers(json!({ "q": ["b", "a"] }));
        assert!(Condition::equals("q", vec!["a", "b"]).evaluate(&given));
        assert!(!Condition::equals("q", vec!["a"]).evaluate(&given));
        assert!(!Condition::equals("q", vec!["a", "b", "b"]).evaluate(&given));
        assert!(Condition::not_equals("q", vec!["a", "c"]).evaluate(&given));
    }

    #[test]
    fn list_answer_against_scalar_checks_membership() {
        let given = answers(json!({ "q": ["Red", "Green"] }));
        assert!(Condition::equals("q", "Green").evaluate(&given));
        assert!(!Condition::equals("q", "green").evaluate(&given));
        assert!(Condition::not_equals("q", "Blue").evaluate(&given));
    }

    #[test]
    fn scalar_answer_against_list_value_is_unequal() {
        let given = answers(json!({ "q": "a" }));
        assert!(!Condition::equals("q", vec!["a"]).evaluate(&given));
        assert!(Condition::not_equals("q", vec!["a"]).evaluate(&given));
    }

    #[test]
    fn contains_is_case_insensitive_substring() {
        let given = answers(json!({ "q": "this has FOO in it", "tags": ["alpha", "BetaMax"] }));
        assert!(Condition::contains("q", "Foo").evaluate(&given));
        assert!(!Condition::contains("q", "bar").evaluate(&given));
        assert!(Condition::contains("tags", "max").evaluate(&given));
        assert!(!Condition::contains("tags", "gamma").evaluate(&given));
    }

    #[test]
    fn contains_on_other_shapes_is_false() {
        let given = answers(json!({ "n": 123, "obj": { "a": "b" }, "q": "abc" }));
        assert!(!Condition::contains("n", "2").evaluate(&given));
        assert!(!Condition::contains("obj", "a").evaluate(&given));
        assert!(!Condition::contains("q", vec!["a"]).evaluate(&given));
    }

    #[test]
    fn unknown_operator_is_false() {
        let given = answers(json!({ "q": "x" }));
        let condition = Condition::new("q", Operator::Other("startsWith".into()), "x");
        assert!(!condition.evaluate(&given));
    }

    #[test]
    fn missing_or_empty_rules_show_question() {
        let given = answers(json!({}));
        assert!(should_show(None, &given));
        assert!(should_show(Some(&RuleSet::all(vec![])), &given));
        assert!(should_show(Some(&RuleSet::any(vec![])), &given));
    }

    #[test]
    fn and_requires_every_condition() {
        let rules = RuleSet::all(vec![
            Condition::equals("a", "1"),
            Condition::equals("b", "2"),
        ]);
        assert!(rules.should_show(&answers(json!({ "a": "1", "b": "2" }))));
        assert!(!rules.should_show(&answers(json!({ "a": "1", "b": "3" }))));
        assert!(!rules.should_show(&answers(json!({ "a": "1" }))));
    }

    #[test]
    fn or_requires_any_condition() {
        let rules = RuleSet::any(vec![
            Condition::equals("a", "1"),
            Condition::equals("b", "2"),
        ]);
        assert!(rules.should_show(&answers(json!({ "b": "2" }))));
        assert!(!rules.should_show(&answers(json!({ "a": "0", "b": "0" }))));
        assert!(!rules.should_show(&answers(json!({}))));
    }

    #[test]
    fn unrecognised_or_missing_logic_fails_open() {
        let given = answers(json!({}));
        let mut rules = RuleSet::new(
            Logic::Other("XOR".into()),
            vec![Condition::equals("a", "1")],
        );
        assert!(rules.should_show(&given));
        rules.logic = None;
        assert!(rules.should_show(&given));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn answer_value() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            "[a-cA-C]{0,3}".prop_map(Value::String),
            prop::collection::vec("[a-c]{1,2}", 0..4)
                .prop_map(|items| Value::Array(items.into_iter().map(Value::String).collect())),
        ]
    }

    fn condition() -> impl Strategy<Value = Condition> {
        let operator = prop_oneof![
            Just(Operator::Equals),
            Just(Operator::NotEquals),
            Just(Operator::Contains),
            Just(Operator::Other("matches".into())),
        ];
        let value = prop_oneof![
            "[a-cA-C]{0,2}".prop_map(ConditionValue::Text),
            prop::collection::vec("[a-c]{1,2}", 0..3).prop_map(ConditionValue::List),
        ];
        ("[pqr]", operator, value).prop_map(|(key, operator, value)| Condition {
            question_key: key,
            operator,
            value,
        })
    }

    fn answer_map() -> impl Strategy<Value = AnswerMap> {
        prop::collection::btree_map("[pqr]", answer_value(), 0..3)
            .prop_map(|entries| entries.into_iter().collect())
    }

    proptest! {
        #[test]
        fn evaluation_is_deterministic_and_pure(
            conditions in prop::collection::vec(condition(), 1..4),
            or_logic in any::<bool>(),
            answers in answer_map(),
        ) {
            let rules = if or_logic { RuleSet::any(conditions) } else { RuleSet::all(conditions) };
            let rules_before = rules.clone();
            let answers_before = answers.clone();

            let first = should_show(Some(&rules), &answers);
            let second = should_show(Some(&rules), &answers);

            prop_assert_eq!(first, second);
            prop_assert_eq!(&rules, &rules_before);
            prop_assert_eq!(&answers, &answers_before);
        }

        #[test]
        fn logic_combines_condition_results(
            first in condition(),
            second in condition(),
            answers in answer_map(),
        ) {
            let a = first.evaluate(&answers);
            let b = second.evaluate(&answers);
            let both = RuleSet::all(vec![first.clone(), second.clone()]);
            let either = RuleSet::any(vec![first, second]);

            prop_assert_eq!(both.should_show(&answers), a && b);
            prop_assert_eq!(either.should_show(&answers), a || b);
        }

        #[test]
        fn not_equals_negates_equals_only_when_answered(
            key in "[pqr]",
            value in "[a-c]{1,2}",
            answers in answer_map(),
        ) {
            let equals = Condition::equals(key.clone(), value.clone()).evaluate(&answers);
            let not_equals = Condition::not_equals(key.clone(), value).evaluate(&answers);
            if answer(&answers, &key).is_some() {
                prop_assert_eq!(not_equals, !equals);
            } else {
                prop_assert!(!equals && !not_equals);
            }
        }
    }
}
