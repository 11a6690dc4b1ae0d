use serde_json::{Map, Value};

use crate::answers::AnswerMap;
use crate::spec::form::FormSpec;
use crate::spec::question::QuestionType;
use crate::visibility::VisibilityMap;

/// Upstream cell values for a validated submission, keyed by field id.
///
/// Only questions visible under `visibility` are written, since hidden ones
/// were never validated. Attachment answers are left out unless
/// `include_attachments` is set; null answers are never written.
pub fn record_fields(
    spec: &FormSpec,
    answers: &AnswerMap,
    visibility: &VisibilityMap,
    include_attachments: bool,
) -> Map<String, Value> {
    let mut fields = Map::new();
    for question in &spec.questions {
        if !visibility.is_visible(&question.question_key) {
            continue;
        }
        if matches!(question.kind, QuestionType::MultipleAttachments) && !include_attachments {
            continue;
        }
        match answers.get(&question.question_key) {
            None | Some(Value::Null) => {}
            Some(value) => {
                fields.insert(question.airtable_field_id.clone(), value.clone());
            }
        }
    }
    fields
}
