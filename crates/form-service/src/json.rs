//! JSON-in, JSON-out endpoints.
//!
//! Every function returns a JSON document; failures are reported as
//! `{"error": ..., "code": ...}` instead of a Rust error.

use form_rules::{AnswerMap, FormSpec, answer_map, build_render_payload, render_json_ui};
use serde_json::{Map, Value, json};

use crate::context::RequestContext;
use crate::error::ServiceError;
use crate::record_writer::RecordWriter;
use crate::registrar::WebhookRegistrar;
use crate::service::FormService;
use crate::store::{FormStore, ResponseStore};
use crate::webhook::WebhookNotification;

fn parse_context(ctx_json: &str) -> RequestContext {
    serde_json::from_str(ctx_json).unwrap_or_default()
}

/// Parses submitted answers; blank input means no answers.
///
/// A document is treated as the `{"answers": {...}}` envelope only when
/// `answers` is its sole key and holds an object. Anything else is the
/// answer map itself, so a question keyed `answers` still round-trips.
pub fn parse_answers(answers_json: &str) -> Result<AnswerMap, ServiceError> {
    if answers_json.trim().is_empty() {
        return Ok(Map::new());
    }
    let value: Value = serde_json::from_str(answers_json).map_err(ServiceError::Json)?;
    Ok(match &value {
        Value::Object(map) if map.len() == 1 => match map.get("answers") {
            Some(inner @ Value::Object(_)) => answer_map(inner),
            _ => answer_map(&value),
        },
        _ => answer_map(&value),
    })
}

fn parse_form(form_json: &str) -> Result<FormSpec, ServiceError> {
    serde_json::from_str(form_json).map_err(ServiceError::Json)
}

fn encode<T: serde::Serialize>(value: &T) -> Result<Value, ServiceError> {
    serde_json::to_value(value).map_err(ServiceError::Json)
}

pub fn respond(result: Result<Value, ServiceError>) -> String {
    match result {
        Ok(value) => serde_json::to_string(&value).unwrap_or_else(|error| {
            json!({ "error": format!("json encode: {}", error), "code": "invalid_json" })
                .to_string()
        }),
        Err(err) => error_body(&err).to_string(),
    }
}

fn error_body(err: &ServiceError) -> Value {
    let mut body = json!({ "error": err.to_string(), "code": err.code() });
    if let ServiceError::Rejected { validation, .. } = err
        && let Ok(validation) = serde_json::to_value(validation)
    {
        body["validation"] = validation;
    }
    body
}

pub fn create_form<S, W, R>(
    service: &FormService<S, W, R>,
    ctx_json: &str,
    form_json: &str,
) -> String
where
    S: FormStore + ResponseStore,
    W: RecordWriter,
    R: WebhookRegistrar,
{
    respond(parse_form(form_json).and_then(|draft| {
        let form = service.create_form(&parse_context(ctx_json), draft)?;
        Ok(json!({ "form": encode(&form)? }))
    }))
}

pub fn list_forms<S, W, R>(service: &FormService<S, W, R>, ctx_json: &str) -> String
where
    S: FormStore + ResponseStore,
    W: RecordWriter,
    R: WebhookRegistrar,
{
    respond(
        service
            .list_forms(&parse_context(ctx_json))
            .and_then(|forms| Ok(json!({ "forms": encode(&forms)? }))),
    )
}

pub fn get_form<S, W, R>(service: &FormService<S, W, R>, form_id: &str) -> String
where
    S: FormStore + ResponseStore,
    W: RecordWriter,
    R: WebhookRegistrar,
{
    respond(
        service
            .get_form(form_id)
            .and_then(|form| Ok(json!({ "form": encode(&form)? }))),
    )
}

pub fn submit<S, W, R>(service: &FormService<S, W, R>, form_id: &str, answers_json: &str) -> String
where
    S: FormStore + ResponseStore,
    W: RecordWriter,
    R: WebhookRegistrar,
{
    respond(parse_answers(answers_json).and_then(|answers| {
        let response = service.submit(form_id, &answers)?;
        Ok(json!({ "response": encode(&response)? }))
    }))
}

pub fn list_responses<S, W, R>(
    service: &FormService<S, W, R>,
    ctx_json: &str,
    form_id: &str,
) -> String
where
    S: FormStore + ResponseStore,
    W: RecordWriter,
    R: WebhookRegistrar,
{
    respond(
        service
            .list_responses(&parse_context(ctx_json), form_id)
            .and_then(|responses| Ok(json!({ "responses": encode(&responses)? }))),
    )
}

pub fn apply_webhook<S, W, R>(service: &FormService<S, W, R>, notification_json: &str) -> String
where
    S: FormStore + ResponseStore,
    W: RecordWriter,
    R: WebhookRegistrar,
{
    respond(
        serde_json::from_str::<WebhookNotification>(notification_json)
            .map_err(ServiceError::Json)
            .and_then(|notification| service.apply_webhook(&notification))
            .and_then(|report| encode(&report)),
    )
}

/// Live visibility for the form page; stateless, needs only the form.
pub fn visibility(form_json: &str, answers_json: &str) -> String {
    respond(parse_form(form_json).and_then(|form| {
        let answers = parse_answers(answers_json)?;
        Ok(render_json_ui(&build_render_payload(&form, &answers)))
    }))
}
