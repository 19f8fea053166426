//! Audit Sinks - where records go
//!
//! Log format for the file sink: JSON Lines (.jsonl), append-only.

use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;

use super::record::AuditRecord;
use crate::constants::AUDIT_TARGET;
use crate::error::AuditError;

/// Accepts audit records; delivery is best-effort
pub trait AuditSink: Send + Sync {
    fn emit(&self, record: &AuditRecord) -> Result<(), AuditError>;
}

// ============================================================================
// TRACING
// ============================================================================

/// Structured `prediction_log` event on the tracing pipeline
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl AuditSink for TracingSink {
    fn emit(&self, record: &AuditRecord) -> Result<(), AuditError> {
        let probabilities = match &record.probabilities {
            Some(p) => serde_json::to_string(p)?,
            None => "null".to_string(),
        };

        tracing::info!(
            target: AUDIT_TARGET,
            timestamp = %record.timestamp.to_rfc3339(),
            model_name = %record.model_name,
            model_version = %record.model_version,
            request_id = record.request_id.as_deref().unwrap_or(""),
            input_feature_hash = %record.input_feature_hash,
            prediction = %record.prediction,
            probabilities = %probabilities,
            "prediction_log"
        );

        Ok(())
    }
}

// ============================================================================
// JSON LINES FILE
// ============================================================================

/// Appends one JSON object per line
pub struct JsonlSink {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonlSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }
}

impl AuditSink for JsonlSink {
    fn emit(&self, record: &AuditRecord) -> Result<(), AuditError> {
        let line = serde_json::to_string(record)?;

        let _guard = self.lock.lock();

        // Ensure parent directory exists
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let mut writer = BufWriter::new(file);
        writeln!(writer, "{}", line)?;
        writer.flush()?;

        Ok(())
    }
}

// ============================================================================
// IN-MEMORY
// ============================================================================

/// Keeps records in process; used by tests and embedders
#[derive(Default)]
pub struct MemorySink {
    records: Mutex<Vec<AuditRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

impl AuditSink for MemorySink {
    fn emit(&self, record: &AuditRecord) -> Result<(), AuditError> {
        self.records.lock().push(record.clone());
        Ok(())
    }
}

// ============================================================================
// FAN-OUT
// ============================================================================

/// Sends each record to every sink; a failing or panicking sink does not
/// stop the rest. Reports the first failure.
#[derive(Default)]
pub struct MultiSink {
    sinks: Vec<Arc<dyn AuditSink>>,
}

impl MultiSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl AuditSink for MultiSink {
    fn emit(&self, record: &AuditRecord) -> Result<(), AuditError> {
        let mut first_error = None;
        for sink in &self.sinks {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| sink.emit(record)))
                .unwrap_or(Err(AuditError::SinkPanicked));
            if let Err(e) = outcome {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}
