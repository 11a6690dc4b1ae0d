use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::debug;

use crate::error::ServiceError;

/// Makes sure upstream change notifications are delivered for a base.
///
/// The upstream API allows one notification subscription per base and user,
/// so implementations must hand back the existing id instead of registering
/// twice.
pub trait WebhookRegistrar: Send + Sync {
    fn ensure_webhook(&self, owner_id: &str, base_id: &str) -> Result<String, ServiceError>;
}

/// A subscription held by [`MemoryWebhookRegistrar`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredWebhook {
    pub webhook_id: String,
    pub owner_id: String,
    pub base_id: String,
}

/// Keeps one subscription per owner and base in memory.
#[derive(Debug)]
pub struct MemoryWebhookRegistrar {
    prefix: String,
    next_id: AtomicUsize,
    webhooks: Mutex<BTreeMap<(String, String), String>>,
}

impl MemoryWebhookRegistrar {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next_id: AtomicUsize::new(1),
            webhooks: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn webhooks(&self) -> Vec<RegisteredWebhook> {
        self.webhooks
            .lock()
            .map(|webhooks| {
                webhooks
                    .iter()
                    .map(|((owner_id, base_id), webhook_id)| RegisteredWebhook {
                        webhook_id: webhook_id.clone(),
                        owner_id: owner_id.clone(),
                        base_id: base_id.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl Default for MemoryWebhookRegistrar {
    fn default() -> Self {
        Self::new("ach")
    }
}

impl WebhookRegistrar for MemoryWebhookRegistrar {
    fn ensure_webhook(&self, owner_id: &str, base_id: &str) -> Result<String, ServiceError> {
        let mut webhooks = self
            .webhooks
            .lock()
            .map_err(|_| ServiceError::Registration("webhook registry poisoned".into()))?;
        let key = (owner_id.to_string(), base_id.to_string());
        if let Some(existing) = webhooks.get(&key) {
            debug!(base_id, webhook_id = %existing, "webhook already registered");
            return Ok(existing.clone());
        }

        let sequence = self.next_id.fetch_add(1, Ordering::SeqCst);
        let webhook_id = format!("{}{:014}", self.prefix, sequence);
        webhooks.insert(key, webhook_id.clone());
        Ok(webhook_id)
    }
}
