use form_rules::{
    AnswerMap, FormSpec, check_form, record_fields, resolve_visibility, validate_submission,
};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::ServiceConfig;
use crate::context::RequestContext;
use crate::error::ServiceError;
use crate::record_writer::RecordWriter;
use crate::registrar::{MemoryWebhookRegistrar, WebhookRegistrar};
use crate::store::{FormStore, ResponseStore, StoredResponse};
use crate::webhook::{self, SyncReport, WebhookNotification};

/// Form endpoints over a store, an upstream record writer and the upstream
/// webhook registrar.
pub struct FormService<S, W, R = MemoryWebhookRegistrar> {
    store: S,
    writer: W,
    registrar: R,
    config: ServiceConfig,
}

impl<S, W> FormService<S, W>
where
    S: FormStore + ResponseStore,
    W: RecordWriter,
{
    pub fn new(store: S, writer: W, config: ServiceConfig) -> Self {
        Self::with_registrar(store, writer, MemoryWebhookRegistrar::default(), config)
    }
}

impl<S, W, R> FormService<S, W, R>
where
    S: FormStore + ResponseStore,
    W: RecordWriter,
    R: WebhookRegistrar,
{
    pub fn with_registrar(store: S, writer: W, registrar: R, config: ServiceConfig) -> Self {
        Self {
            store,
            writer,
            registrar,
            config,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    pub fn registrar(&self) -> &R {
        &self.registrar
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Saves a new form owned by the requesting user.
    pub fn create_form(
        &self,
        ctx: &RequestContext,
        draft: FormSpec,
    ) -> Result<FormSpec, ServiceError> {
        let user_id = ctx.require_user()?;
        check_form(&draft)?;

        let now = timestamp();
        let mut form = draft;
        form.id = Uuid::new_v4().to_string();
        form.owner_id = Some(user_id.to_string());
        if form.name.trim().is_empty() {
            form.name = self.config.default_form_name.clone();
        }
        form.created_at = Some(now.clone());
        form.updated_at = Some(now);

        self.store.insert_form(form.clone())?;
        info!(form_id = %form.id, owner = user_id, questions = form.questions.len(), "created form");

        // Registration failures never fail form creation.
        match self
            .registrar
            .ensure_webhook(user_id, &form.airtable_base_id)
        {
            Ok(webhook_id) => {
                info!(base_id = %form.airtable_base_id, webhook_id = %webhook_id, "webhook ready")
            }
            Err(err) => {
                warn!(base_id = %form.airtable_base_id, error = %err, "webhook setup failed")
            }
        }
        Ok(form)
    }

    pub fn list_forms(&self, ctx: &RequestContext) -> Result<Vec<FormSpec>, ServiceError> {
        let user_id = ctx.require_user()?;
        self.store.forms_for_owner(user_id)
    }

    /// Public: anyone holding the link can load a form to fill it in.
    pub fn get_form(&self, form_id: &str) -> Result<FormSpec, ServiceError> {
        self.store
            .get_form(form_id)?
            .ok_or_else(|| ServiceError::NotFound(format!("form {}", form_id)))
    }

    /// Validates a submission server-side, writes it upstream and stores it.
    ///
    /// Visibility is recomputed here from the stored form; whatever the
    /// client showed is not trusted.
    pub fn submit(
        &self,
        form_id: &str,
        answers: &AnswerMap,
    ) -> Result<StoredResponse, ServiceError> {
        let form = self.get_form(form_id)?;

        let validation = validate_submission(&form, answers);
        if !validation.valid {
            let message = validation
                .first_message()
                .unwrap_or("submission rejected")
                .to_string();
            warn!(form_id, reason = %message, "rejected submission");
            return Err(ServiceError::Rejected {
                message,
                validation,
            });
        }

        let visibility = resolve_visibility(&form, answers);
        let fields = record_fields(&form, answers, &visibility, self.config.write_attachments);
        let record_id = self.writer.create_record(
            &form.airtable_base_id,
            &form.airtable_table_id,
            &fields,
        )?;

        let now = timestamp();
        let response = StoredResponse {
            id: Uuid::new_v4().to_string(),
            form_id: form.id.clone(),
            airtable_record_id: record_id,
            answers: answers.clone(),
            deleted_in_airtable: false,
            created_at: now.clone(),
            updated_at: now,
        };
        self.store.insert_response(response.clone())?;
        info!(
            form_id,
            response_id = %response.id,
            record_id = %response.airtable_record_id,
            "stored response"
        );
        Ok(response)
    }

    /// Responses of a form owned by the requesting user, minus those deleted
    /// upstream.
    pub fn list_responses(
        &self,
        ctx: &RequestContext,
        form_id: &str,
    ) -> Result<Vec<StoredResponse>, ServiceError> {
        let user_id = ctx.require_user()?;
        let form = self.get_form(form_id)?;
        if form.owner_id.as_deref() != Some(user_id) {
            return Err(ServiceError::NotFound(format!("form {}", form_id)));
        }

        Ok(self
            .store
            .responses_for_form(form_id)?
            .into_iter()
            .filter(|response| !response.deleted_in_airtable)
            .collect())
    }

    pub fn apply_webhook(
        &self,
        notification: &WebhookNotification,
    ) -> Result<SyncReport, ServiceError> {
        webhook::apply(&self.store, notification, &timestamp())
    }
}

fn timestamp() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default()
}
