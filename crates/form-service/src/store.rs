use std::collections::BTreeMap;
use std::sync::RwLock;

use form_rules::{AnswerMap, FormSpec};
use serde::{Deserialize, Serialize};

use crate::error::ServiceError;

/// A submission that was written upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredResponse {
    pub id: String,
    pub form_id: String,
    /// Upstream record id; the key webhook notifications refer to.
    pub airtable_record_id: String,
    pub answers: AnswerMap,
    #[serde(default)]
    pub deleted_in_airtable: bool,
    pub created_at: String,
    pub updated_at: String,
}

pub trait FormStore: Send + Sync {
    fn insert_form(&self, form: FormSpec) -> Result<(), ServiceError>;
    fn get_form(&self, form_id: &str) -> Result<Option<FormSpec>, ServiceError>;
    fn forms_for_owner(&self, owner_id: &str) -> Result<Vec<FormSpec>, ServiceError>;
}

pub trait ResponseStore: Send + Sync {
    fn insert_response(&self, response: StoredResponse) -> Result<(), ServiceError>;
    fn find_by_record_id(&self, record_id: &str) -> Result<Option<StoredResponse>, ServiceError>;
    /// Replaces the stored response with the same id.
    fn update_response(&self, response: StoredResponse) -> Result<(), ServiceError>;
    fn responses_for_form(&self, form_id: &str) -> Result<Vec<StoredResponse>, ServiceError>;
}

/// Process-local store for forms and responses.
#[derive(Debug, Default)]
pub struct MemoryStore {
    forms: RwLock<BTreeMap<String, FormSpec>>,
    responses: RwLock<Vec<StoredResponse>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store, e.g. from files loaded by the CLI.
    pub fn from_parts(forms: Vec<FormSpec>, responses: Vec<StoredResponse>) -> Self {
        let forms = forms
            .into_iter()
            .map(|form| (form.id.clone(), form))
            .collect();
        Self {
            forms: RwLock::new(forms),
            responses: RwLock::new(responses),
        }
    }

    /// Snapshot of every stored response, deleted ones included.
    pub fn responses(&self) -> Result<Vec<StoredResponse>, ServiceError> {
        Ok(self.responses.read().map_err(poisoned)?.clone())
    }
}

fn poisoned<T>(_: T) -> ServiceError {
    ServiceError::Store("lock poisoned".into())
}

impl FormStore for MemoryStore {
    fn insert_form(&self, form: FormSpec) -> Result<(), ServiceError> {
        self.forms
            .write()
            .map_err(poisoned)?
            .insert(form.id.clone(), form);
        Ok(())
    }

    fn get_form(&self, form_id: &str) -> Result<Option<FormSpec>, ServiceError> {
        Ok(self.forms.read().map_err(poisoned)?.get(form_id).cloned())
    }

    fn forms_for_owner(&self, owner_id: &str) -> Result<Vec<FormSpec>, ServiceError> {
        Ok(self
            .forms
            .read()
            .map_err(poisoned)?
            .values()
            .filter(|form| form.owner_id.as_deref() == Some(owner_id))
            .cloned()
            .collect())
    }
}

impl ResponseStore for MemoryStore {
    fn insert_response(&self, response: StoredResponse) -> Result<(), ServiceError> {
        self.responses.write().map_err(poisoned)?.push(response);
        Ok(())
    }

    fn find_by_record_id(&self, record_id: &str) -> Result<Option<StoredResponse>, ServiceError> {
        Ok(self
            .responses
            .read()
            .map_err(poisoned)?
            .iter()
            .find(|response| response.airtable_record_id == record_id)
            .cloned())
    }

    fn update_response(&self, response: StoredResponse) -> Result<(), ServiceError> {
        let mut responses = self.responses.write().map_err(poisoned)?;
        let slot = responses
            .iter_mut()
            .find(|existing| existing.id == response.id)
            .ok_or_else(|| ServiceError::NotFound(format!("response {}", response.id)))?;
        *slot = response;
        Ok(())
    }

    fn responses_for_form(&self, form_id: &str) -> Result<Vec<StoredResponse>, ServiceError> {
        Ok(self
            .responses
            .read()
            .map_err(poisoned)?
            .iter()
            .filter(|response| response.form_id == form_id)
            .cloned()
            .collect())
    }
}
