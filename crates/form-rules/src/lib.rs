#![allow(missing_docs)]

pub mod answers;
pub mod answers_schema;
pub mod authoring;
pub mod evaluate;
pub mod record;
pub mod render;
pub mod spec;
pub mod validate;
pub mod visibility;

pub use answers::{AnswerMap, ValidationError, ValidationResult, answer_map};
pub use answers_schema::generate as answers_schema;
pub use authoring::{AuthoringError, ConditionPatch, RuleEditor, check_form};
pub use evaluate::{evaluate_condition, should_show};
pub use record::record_fields;
pub use render::{
    RenderPayload, RenderProgress, RenderQuestion, RenderStatus, build_render_payload,
    render_json_ui, render_text,
};
pub use spec::{
    Condition, ConditionValue, DEFAULT_FORM_NAME, FormSpec, Logic, Operator, QuestionSpec,
    QuestionType, RuleSet,
};
pub use validate::validate_submission;
pub use visibility::{VisibilityMap, active_questions, resolve_visibility};
