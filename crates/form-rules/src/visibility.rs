use std::collections::BTreeMap;

use tracing::debug;

use crate::answers::AnswerMap;
use crate::evaluate::should_show;
use crate::spec::form::FormSpec;
use crate::spec::question::QuestionSpec;

/// Visibility of every question in a form for one set of answers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisibilityMap(BTreeMap<String, bool>);

impl VisibilityMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unknown keys count as visible, matching the "no rule" default.
    pub fn is_visible(&self, key: &str) -> bool {
        self.0.get(key).copied().unwrap_or(true)
    }

    pub fn insert(&mut self, key: impl Into<String>, visible: bool) {
        self.0.insert(key.into(), visible);
    }

    pub fn visible_count(&self) -> usize {
        self.0.values().filter(|visible| **visible).count()
    }

    pub fn hidden_keys(&self) -> impl Iterator<Item = &str> {
        self.0
            .iter()
            .filter(|(_, visible)| !**visible)
            .map(|(key, _)| key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.0.iter().map(|(key, visible)| (key.as_str(), *visible))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, const N: usize> From<[(K, bool); N]> for VisibilityMap {
    fn from(entries: [(K, bool); N]) -> Self {
        let mut map = VisibilityMap::new();
        for (key, visible) in entries {
            map.insert(key, visible);
        }
        map
    }
}

/// Applies each question's rule-set to the answers, independently.
pub fn resolve_visibility(spec: &FormSpec, answers: &AnswerMap) -> VisibilityMap {
    let mut map = VisibilityMap::new();

    for question in &spec.questions {
        let visible = should_show(question.conditional_rules.as_ref(), answers);
        debug!(question_key = %question.question_key, visible, "resolved visibility");
        map.insert(question.question_key.clone(), visible);
    }

    map
}

/// Questions currently shown, in form order.
pub fn active_questions<'a>(spec: &'a FormSpec, answers: &AnswerMap) -> Vec<&'a QuestionSpec> {
    let visibility = resolve_visibility(spec, answers);
    spec.questions
        .iter()
        .filter(|question| visibility.is_visible(&question.question_key))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::answers::answer_map;
    use crate::spec::question::QuestionType;
    use crate::spec::rules::{Condition, RuleSet};
    use serde_json::json;

    fn form() -> FormSpec {
        FormSpec::new(
            "app1",
            "tbl1",
            vec![
                QuestionSpec::new("topic", "Topic", QuestionType::SingleSelect)
                    .with_options(["Bug", "Idea"]),
                QuestionSpec::new("steps", "Steps to reproduce", QuestionType::MultilineText)
                    .with_rules(RuleSet::all(vec![Condition::equals("topic", "Bug")])),
            ],
        )
    }

    #[test]
    fn questions_without_rules_are_visible() {
        let visibility = resolve_visibility(&form(), &AnswerMap::new());
        assert!(visibility.is_visible("topic"));
        assert!(!visibility.is_visible("steps"));
        assert_eq!(visibility.visible_count(), 1);
        assert_eq!(visibility.hidden_keys().collect::<Vec<_>>(), vec!["steps"]);
    }

    #[test]
    fn answers_reveal_dependent_questions() {
        let spec = form();
        let answers = answer_map(&json!({ "topic": "bug" }));
        let active = active_questions(&spec, &answers);
        let keys = active
            .iter()
            .map(|question| question.question_key.as_str())
            .collect::<Vec<_>>();
        assert_eq!(keys, vec!["topic", "steps"]);
    }

    #[test]
    fn unknown_keys_default_to_visible() {
        assert!(VisibilityMap::new().is_visible("nope"));
        let map = VisibilityMap::from([("a", false)]);
        assert!(!map.is_visible("a"));
    }
}
