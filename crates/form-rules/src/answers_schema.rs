use serde_json::{Map, Value, json};

use crate::spec::form::FormSpec;
use crate::spec::question::{QuestionSpec, QuestionType};
use crate::visibility::VisibilityMap;

/// JSON Schema for the answer map; only visible required questions are listed
/// as required.
pub fn generate(spec: &FormSpec, visibility: &VisibilityMap) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();

    for question in &spec.questions {
        properties.insert(question.question_key.clone(), question_schema(question));
        if question.required && visibility.is_visible(&question.question_key) {
            required.push(Value::String(question.question_key.clone()));
        }
    }

    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": spec.display_name(),
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": true,
    })
}

fn question_schema(question: &QuestionSpec) -> Value {
    let mut schema = match &question.kind {
        QuestionType::SingleLineText | QuestionType::MultilineText => json!({ "type": "string" }),
        QuestionType::SingleSelect => {
            let mut schema = json!({ "type": "string" });
            if !question.options.is_empty() {
                schema["enum"] = json!(question.options);
            }
            schema
        }
        QuestionType::MultipleSelects => {
            let mut items = json!({ "type": "string" });
            if !question.options.is_empty() {
                items["enum"] = json!(question.options);
            }
            json!({ "type": "array", "items": items })
        }
        QuestionType::MultipleAttachments => json!({
            "type": "array",
            "items": {
                "type": "object",
                "properties": {
                    "url": { "type": "string" },
                    "filename": { "type": "string" }
                }
            }
        }),
        QuestionType::Unsupported(_) => json!({}),
    };

    if let Some(map) = schema.as_object_mut() {
        map.insert("title".into(), Value::String(question.label.clone()));
    }
    schema
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::answers::answer_map;
    use crate::spec::rules::{Condition, RuleSet};
    use crate::visibility::resolve_visibility;

    #[test]
    fn hidden_required_questions_are_optional() {
        let spec = FormSpec::new(
            "app",
            "tbl",
            vec![
                QuestionSpec::new("kind", "Kind", QuestionType::SingleSelect)
                    .required(true)
                    .with_options(["a", "b"]),
                QuestionSpec::new("detail", "Detail", QuestionType::SingleLineText)
                    .required(true)
                    .with_rules(RuleSet::all(vec![Condition::equals("kind", "b")])),
            ],
        );

        let hidden = generate(&spec, &resolve_visibility(&spec, &answer_map(&json!({}))));
        assert_eq!(hidden["required"], json!(["kind"]));
        assert_eq!(hidden["properties"]["kind"]["enum"], json!(["a", "b"]));

        let shown = generate(
            &spec,
            &resolve_visibility(&spec, &answer_map(&json!({ "kind": "b" }))),
        );
        assert_eq!(shown["required"], json!(["kind", "detail"]));
    }
}
