pub mod config;
pub mod context;
pub mod error;
pub mod json;
pub mod record_writer;
pub mod registrar;
pub mod service;
pub mod store;
pub mod webhook;

pub use config::ServiceConfig;
pub use context::RequestContext;
pub use error::ServiceError;
pub use record_writer::{MemoryRecordWriter, RecordWriter, WrittenRecord};
pub use registrar::{MemoryWebhookRegistrar, RegisteredWebhook, WebhookRegistrar};
pub use service::FormService;
pub use store::{FormStore, MemoryStore, ResponseStore, StoredResponse};
pub use webhook::{SyncReport, WebhookNotification};

/// Service wired to the in-memory store and record writer.
pub fn in_memory(config: ServiceConfig) -> FormService<MemoryStore, MemoryRecordWriter> {
    let writer = MemoryRecordWriter::new(config.record_id_prefix.clone());
    FormService::new(MemoryStore::new(), writer, config)
}
