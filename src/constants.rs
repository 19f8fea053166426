//! Central Configuration Constants
//!
//! Single source of truth for service defaults.
//! Environment overrides are read in `config.rs`.

/// Service title reported by the index route
pub const APP_NAME: &str = "Hospital Prediction API";

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 8000;

/// Default model version when none is configured
pub const DEFAULT_MODEL_VERSION: &str = "1.0.0";

/// Default artifact locations
pub const DEFAULT_MODELS_DIR: &str = "models";
pub const DEFAULT_ARTIFACTS_DIR: &str = "artifacts";
pub const DEFAULT_RISK_MODEL_FILENAME: &str = "visit_risk_model.bin";
pub const DEFAULT_CLAIM_MODEL_FILENAME: &str = "claim_outcome_model.bin";
pub const DEFAULT_FEATURE_SCHEMA_FILENAME: &str = "feature_schema.json";

/// Maximum number of requests in one batch call
pub const MAX_BATCH_SIZE: usize = 100;

/// Length of the truncated audit input hash (hex characters)
pub const AUDIT_HASH_LEN: usize = 16;

/// Tracing target for audit events
pub const AUDIT_TARGET: &str = "prediction_log";
