use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::{Map, Value};

use crate::error::ServiceError;

/// Creates rows in the upstream table. The REST client lives outside this
/// crate; it only has to hand back the new record's id.
pub trait RecordWriter: Send + Sync {
    fn create_record(
        &self,
        base_id: &str,
        table_id: &str,
        fields: &Map<String, Value>,
    ) -> Result<String, ServiceError>;
}

/// A record accepted by [`MemoryRecordWriter`].
#[derive(Debug, Clone, PartialEq)]
pub struct WrittenRecord {
    pub record_id: String,
    pub base_id: String,
    pub table_id: String,
    pub fields: Map<String, Value>,
}

/// Keeps records in memory and issues sequential ids.
#[derive(Debug)]
pub struct MemoryRecordWriter {
    prefix: String,
    next_id: AtomicUsize,
    records: Mutex<Vec<WrittenRecord>>,
}

impl MemoryRecordWriter {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next_id: AtomicUsize::new(1),
            records: Mutex::new(Vec::new()),
        }
    }

    pub fn records(&self) -> Vec<WrittenRecord> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }
}

impl Default for MemoryRecordWriter {
    fn default() -> Self {
        Self::new("rec")
    }
}

impl RecordWriter for MemoryRecordWriter {
    fn create_record(
        &self,
        base_id: &str,
        table_id: &str,
        fields: &Map<String, Value>,
    ) -> Result<String, ServiceError> {
        let sequence = self.next_id.fetch_add(1, Ordering::SeqCst);
        let record_id = format!("{}{:014}", self.prefix, sequence);
        self.records
            .lock()
            .map_err(|_| ServiceError::RecordWrite("record log poisoned".into()))?
            .push(WrittenRecord {
                record_id: record_id.clone(),
                base_id: base_id.to_string(),
                table_id: table_id.to_string(),
                fields: fields.clone(),
            });
        Ok(record_id)
    }
}
