//! Upstream change notifications.
//!
//! Each notification is applied as an upsert keyed by the upstream record id,
//! so replaying a notification leaves stored answers unchanged.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::error::ServiceError;
use crate::store::{FormStore, ResponseStore};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookNotification {
    #[serde(default)]
    pub payloads: Vec<WebhookPayload>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookPayload {
    #[serde(default)]
    pub changed_tables_by_id: BTreeMap<String, TableChanges>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableChanges {
    #[serde(default)]
    pub changed_records_by_id: BTreeMap<String, RecordChange>,
    #[serde(default)]
    pub destroyed_record_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordChange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<CellValues>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellValues {
    #[serde(default)]
    pub cell_values_by_field_id: Map<String, Value>,
}

/// Counts of what a notification changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub updated: usize,
    pub deleted: usize,
    pub skipped: usize,
}

pub(crate) fn apply<S>(
    store: &S,
    notification: &WebhookNotification,
    now: &str,
) -> Result<SyncReport, ServiceError>
where
    S: FormStore + ResponseStore,
{
    let mut report = SyncReport::default();

    for payload in &notification.payloads {
        for changes in payload.changed_tables_by_id.values() {
            for (record_id, change) in &changes.changed_records_by_id {
                if apply_update(store, record_id, change, now)? {
                    report.updated += 1;
                } else {
                    report.skipped += 1;
                }
            }
            for record_id in &changes.destroyed_record_ids {
                if apply_delete(store, record_id, now)? {
                    report.deleted += 1;
                } else {
                    report.skipped += 1;
                }
            }
        }
    }

    info!(
        updated = report.updated,
        deleted = report.deleted,
        skipped = report.skipped,
        "applied webhook notification"
    );
    Ok(report)
}

fn apply_update<S>(
    store: &S,
    record_id: &str,
    change: &RecordChange,
    now: &str,
) -> Result<bool, ServiceError>
where
    S: FormStore + ResponseStore,
{
    let Some(mut response) = store.find_by_record_id(record_id)? else {
        warn!(record_id, "no stored response for updated record");
        return Ok(false);
    };
    let Some(current) = &change.current else {
        return Ok(false);
    };
    let Some(form) = store.get_form(&response.form_id)? else {
        warn!(record_id, form_id = %response.form_id, "response refers to a missing form");
        return Ok(false);
    };

    for (field_id, value) in &current.cell_values_by_field_id {
        if let Some(question) = form.question_for_field(field_id) {
            response
                .answers
                .insert(question.question_key.clone(), value.clone());
        }
    }
    response.updated_at = now.to_string();
    store.update_response(response)?;
    Ok(true)
}

fn apply_delete<S>(store: &S, record_id: &str, now: &str) -> Result<bool, ServiceError>
where
    S: ResponseStore,
{
    let Some(mut response) = store.find_by_record_id(record_id)? else {
        warn!(record_id, "no stored response for destroyed record");
        return Ok(false);
    };
    response.deleted_in_airtable = true;
    response.updated_at = now.to_string();
    info!(response_id = %response.id, record_id, "marked response deleted upstream");
    store.update_response(response)?;
    Ok(true)
}
