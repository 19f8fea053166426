//! Configuration module

use std::env;
use std::path::PathBuf;

use crate::constants::{
    DEFAULT_ARTIFACTS_DIR, DEFAULT_CLAIM_MODEL_FILENAME, DEFAULT_FEATURE_SCHEMA_FILENAME,
    DEFAULT_MODELS_DIR, DEFAULT_MODEL_VERSION, DEFAULT_PORT, DEFAULT_RISK_MODEL_FILENAME,
};
use crate::prediction::ModelKind;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding trained model artifacts
    pub models_dir: PathBuf,

    /// Directory holding auxiliary artifacts (feature schema)
    pub artifacts_dir: PathBuf,

    pub risk_model_filename: String,
    pub claim_model_filename: String,
    pub feature_schema_filename: String,

    /// Versions reported with every prediction and audit record
    pub risk_model_version: String,
    pub claim_model_version: String,

    /// Emit an audit record per prediction
    pub log_predictions: bool,

    /// Optional JSON Lines audit file (in addition to the tracing sink)
    pub audit_log_path: Option<PathBuf>,

    /// Server port
    pub port: u16,

    /// Environment (development, production)
    pub environment: String,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let string_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Self {
            models_dir: PathBuf::from(string_or("MODELS_DIR", DEFAULT_MODELS_DIR)),
            artifacts_dir: PathBuf::from(string_or("ARTIFACTS_DIR", DEFAULT_ARTIFACTS_DIR)),

            risk_model_filename: string_or("RISK_MODEL_FILENAME", DEFAULT_RISK_MODEL_FILENAME),
            claim_model_filename: string_or("CLAIM_MODEL_FILENAME", DEFAULT_CLAIM_MODEL_FILENAME),
            feature_schema_filename: string_or("FEATURE_SCHEMA_FILENAME", DEFAULT_FEATURE_SCHEMA_FILENAME),

            risk_model_version: string_or("RISK_MODEL_VERSION", DEFAULT_MODEL_VERSION),
            claim_model_version: string_or("CLAIM_MODEL_VERSION", DEFAULT_MODEL_VERSION),

            log_predictions: lookup("LOG_PREDICTIONS")
                .map(|v| v.trim().eq_ignore_ascii_case("true"))
                .unwrap_or(true),

            audit_log_path: lookup("AUDIT_LOG_PATH")
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),

            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_PORT),

            environment: string_or("ENVIRONMENT", "development"),
        }
    }

    pub fn risk_model_path(&self) -> PathBuf {
        self.models_dir.join(&self.risk_model_filename)
    }

    pub fn claim_model_path(&self) -> PathBuf {
        self.models_dir.join(&self.claim_model_filename)
    }

    pub fn feature_schema_path(&self) -> PathBuf {
        self.artifacts_dir.join(&self.feature_schema_filename)
    }

    /// Artifact path for a model kind
    pub fn model_path(&self, kind: ModelKind) -> PathBuf {
        match kind {
            ModelKind::Risk => self.risk_model_path(),
            ModelKind::Claim => self.claim_model_path(),
        }
    }

    /// Configured version string for a model kind
    pub fn model_version(&self, kind: ModelKind) -> &str {
        match kind {
            ModelKind::Risk => &self.risk_model_version,
            ModelKind::Claim => &self.claim_model_version,
        }
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();

        assert_eq!(config.risk_model_path(), PathBuf::from("models/visit_risk_model.bin"));
        assert_eq!(config.claim_model_path(), PathBuf::from("models/claim_outcome_model.bin"));
        assert_eq!(config.feature_schema_path(), PathBuf::from("artifacts/feature_schema.json"));
        assert_eq!(config.model_version(ModelKind::Risk), "1.0.0");
        assert!(config.log_predictions);
        assert!(config.audit_log_path.is_none());
        assert_eq!(config.port, 8000);
        assert!(!config.is_production());
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("MODELS_DIR", "/srv/models"),
            ("CLAIM_MODEL_FILENAME", "claims.json"),
            ("CLAIM_MODEL_VERSION", "2.3.1"),
            ("LOG_PREDICTIONS", "FALSE"),
            ("AUDIT_LOG_PATH", "/var/log/predictions.jsonl"),
            ("PORT", "9100"),
        ]));

        assert_eq!(config.model_path(ModelKind::Claim), PathBuf::from("/srv/models/claims.json"));
        assert_eq!(config.model_version(ModelKind::Claim), "2.3.1");
        assert!(!config.log_predictions);
        assert_eq!(config.audit_log_path, Some(PathBuf::from("/var/log/predictions.jsonl")));
        assert_eq!(config.port, 9100);
    }

    #[test]
    fn test_log_predictions_only_true_enables() {
        let config = Config::from_lookup(lookup_from(&[("LOG_PREDICTIONS", "yes")]));
        assert!(!config.log_predictions);

        let config = Config::from_lookup(lookup_from(&[("LOG_PREDICTIONS", "True")]));
        assert!(config.log_predictions);
    }

    #[test]
    fn test_bad_port_falls_back() {
        let config = Config::from_lookup(lookup_from(&[("PORT", "not-a-port")]));
        assert_eq!(config.port, 8000);
    }
}
