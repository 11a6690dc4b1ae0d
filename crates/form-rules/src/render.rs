use serde_json::{Map, Value, json};

use crate::{
    answers::{AnswerMap, answer, stringify},
    spec::{form::FormSpec, question::QuestionType},
    visibility::resolve_visibility,
};

/// Whether the form can be submitted as currently answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStatus {
    /// A visible required question is still unanswered.
    NeedInput,
    /// Every visible required question has an answer.
    Complete,
}

impl RenderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderStatus::NeedInput => "need_input",
            RenderStatus::Complete => "complete",
        }
    }
}

#[derive(Debug, Clone)]
pub struct RenderProgress {
    pub answered: usize,
    pub total: usize,
}

/// One question as the form page shows it.
#[derive(Debug, Clone)]
pub struct RenderQuestion {
    pub key: String,
    pub label: String,
    pub kind: QuestionType,
    /// Required and currently visible.
    pub required: bool,
    pub visible: bool,
    pub current_value: Option<Value>,
    pub options: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct RenderPayload {
    pub form_id: String,
    pub form_name: String,
    pub status: RenderStatus,
    pub next_question_key: Option<String>,
    pub progress: RenderProgress,
    pub questions: Vec<RenderQuestion>,
}

impl RenderPayload {
    pub fn visible_questions(&self) -> impl Iterator<Item = &RenderQuestion> {
        self.questions.iter().filter(|question| question.visible)
    }
}

/// Builds what the form page shows for the current answers. Re-run on every
/// answer change.
pub fn build_render_payload(spec: &FormSpec, answers: &AnswerMap) -> RenderPayload {
    let visibility = resolve_visibility(spec, answers);

    let questions = spec
        .questions
        .iter()
        .map(|question| {
            let visible = visibility.is_visible(&question.question_key);
            RenderQuestion {
                key: question.question_key.clone(),
                label: question.label.clone(),
                kind: question.kind.clone(),
                required: question.required && visible,
                visible,
                current_value: answer(answers, &question.question_key).cloned(),
                options: question.options.clone(),
            }
        })
        .collect::<Vec<_>>();

    let answered = questions
        .iter()
        .filter(|question| question.visible && is_answered(question))
        .count();
    let total = visibility.visible_count();

    let next_question_key = questions
        .iter()
        .find(|question| question.required && !is_answered(question))
        .map(|question| question.key.clone());

    let status = if next_question_key.is_some() {
        RenderStatus::NeedInput
    } else {
        RenderStatus::Complete
    };

    RenderPayload {
        form_id: spec.id.clone(),
        form_name: spec.display_name().to_string(),
        status,
        next_question_key,
        progress: RenderProgress { answered, total },
        questions,
    }
}

fn is_answered(question: &RenderQuestion) -> bool {
    match &question.current_value {
        None => false,
        Some(Value::Array(items)) => !items.is_empty(),
        Some(_) => true,
    }
}

/// JSON view of the payload for the form page, with camelCase keys.
pub fn render_json_ui(payload: &RenderPayload) -> Value {
    let questions = payload
        .questions
        .iter()
        .map(|question| {
            let mut map = Map::new();
            map.insert("questionKey".into(), Value::String(question.key.clone()));
            map.insert("label".into(), Value::String(question.label.clone()));
            map.insert("type".into(), Value::String(question.kind.to_string()));
            map.insert("required".into(), Value::Bool(question.required));
            map.insert("visible".into(), Value::Bool(question.visible));
            if let Some(current_value) = &question.current_value {
                map.insert("currentValue".into(), current_value.clone());
            }
            if !question.options.is_empty() {
                map.insert("options".into(), json!(question.options));
            }
            Value::Object(map)
        })
        .collect::<Vec<_>>();

    json!({
        "formId": payload.form_id,
        "formName": payload.form_name,
        "status": payload.status.as_str(),
        "nextQuestionKey": payload.next_question_key,
        "progress": {
            "answered": payload.progress.answered,
            "total": payload.progress.total,
        },
        "questions": questions,
    })
}

/// Plain-text summary of the payload.
pub fn render_text(payload: &RenderPayload) -> String {
    let mut lines = Vec::new();
    lines.push(format!("Form: {} ({})", payload.form_name, payload.form_id));
    lines.push(format!(
        "Status: {} ({}/{})",
        payload.status.as_str(),
        payload.progress.answered,
        payload.progress.total
    ));

    match &payload.next_question_key {
        Some(key) => lines.push(format!("Next required question: {}", key)),
        None => lines.push("All visible required questions are answered.".to_string()),
    }

    lines.push("Visible questions:".to_string());
    for question in payload.visible_questions() {
        let mut entry = format!(" - {} ({})", question.key, question.label);
        if question.required {
            entry.push_str(" [required]");
        }
        if let Some(current_value) = &question.current_value {
            entry.push_str(&format!(" = {}", stringify(current_value)));
        }
        lines.push(entry);
    }

    let hidden = payload
        .questions
        .iter()
        .filter(|question| !question.visible)
        .map(|question| question.key.as_str())
        .collect::<Vec<_>>();
    if !hidden.is_empty() {
        lines.push(format!("Hidden questions: {}", hidden.join(", ")));
    }

    lines.join("\n")
}
