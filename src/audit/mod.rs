//! Audit Module - prediction traceability without storing raw inputs
//!
//! Each prediction yields one record carrying a truncated SHA-256 of the
//! canonical input map. Audit failures are logged and swallowed: the
//! serving path never waits on, or fails because of, the audit sink.

pub mod record;
pub mod sink;

use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use chrono::Utc;
use sha2::{Digest, Sha256};

use crate::constants::AUDIT_HASH_LEN;
use crate::error::AuditError;
use crate::features::FieldValue;
use crate::model::ClassDistribution;

// Re-export common types
pub use record::AuditRecord;
pub use sink::{AuditSink, JsonlSink, MemorySink, MultiSink, TracingSink};

/// Hash of the input map, independent of key insertion order
pub fn feature_hash(features: &BTreeMap<String, FieldValue>) -> Result<String, AuditError> {
    // BTreeMap serializes keys in sorted order
    let canonical = serde_json::to_string(features)?;
    let digest = Sha256::digest(canonical.as_bytes());
    let mut hash = hex::encode(digest);
    hash.truncate(AUDIT_HASH_LEN);
    Ok(hash)
}

/// One prediction event, as handed to the logger
#[derive(Debug, Clone, Copy)]
pub struct AuditEvent<'a> {
    pub model_name: &'a str,
    pub model_version: &'a str,
    pub request_id: Option<&'a str>,
    pub features: &'a BTreeMap<String, FieldValue>,
    pub prediction: &'a str,
    pub probabilities: Option<&'a ClassDistribution>,
}

/// Feature-flagged, failure-proof audit front end
#[derive(Clone)]
pub struct AuditLogger {
    enabled: bool,
    sink: Arc<dyn AuditSink>,
}

impl AuditLogger {
    pub fn new(enabled: bool, sink: Arc<dyn AuditSink>) -> Self {
        Self { enabled, sink }
    }

    pub fn disabled() -> Self {
        Self::new(false, Arc::new(TracingSink))
    }

    /// Record a prediction; never fails
    pub fn record(&self, event: AuditEvent<'_>) {
        if !self.enabled {
            return;
        }

        if let Err(e) = self.try_record(event) {
            tracing::warn!(error = %e, model_name = event.model_name, "prediction_log_failed");
        }
    }

    fn try_record(&self, event: AuditEvent<'_>) -> Result<(), AuditError> {
        let record = AuditRecord {
            timestamp: Utc::now(),
            model_name: event.model_name.to_string(),
            model_version: event.model_version.to_string(),
            request_id: event.request_id.map(str::to_string),
            input_feature_hash: feature_hash(event.features)?,
            prediction: event.prediction.to_string(),
            probabilities: event.probabilities.cloned(),
        };

        let sink = &self.sink;
        panic::catch_unwind(AssertUnwindSafe(|| sink.emit(&record)))
            .unwrap_or(Err(AuditError::SinkPanicked))
    }
}
