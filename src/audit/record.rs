//! Audit record - one prediction event

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ClassDistribution;

/// Written once per prediction, never updated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub timestamp: DateTime<Utc>,
    pub model_name: String,
    pub model_version: String,
    pub request_id: Option<String>,
    /// Truncated SHA-256 of the canonical input map (raw inputs are not stored)
    pub input_feature_hash: String,
    pub prediction: String,
    pub probabilities: Option<ClassDistribution>,
}
