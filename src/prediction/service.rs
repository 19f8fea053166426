//! Prediction Service - the public predict / batch predict surface
//!
//! Flow per request: model cache -> schema resolution -> reconciliation ->
//! scoring -> label normalization -> audit. No step returns an error to the
//! caller; each failure has a degraded answer.

use std::sync::Arc;

use serde::Serialize;

use super::kind::{CanonicalLabel, ModelKind};
use super::normalize::normalize;
use super::scorer::{score, ScoredOutput};
use crate::audit::{AuditEvent, AuditLogger, JsonlSink, MultiSink, TracingSink};
use crate::config::Config;
use crate::constants::{DEFAULT_MODEL_VERSION, MAX_BATCH_SIZE};
use crate::error::BatchError;
use crate::features::{build, build_passthrough, PredictionRequest};
use crate::model::{resolve, ClassDistribution, ModelCache, SchemaDocumentCache};

/// One canonical answer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalPrediction {
    pub label: CanonicalLabel,
    pub distribution: Option<ClassDistribution>,
    pub model_version: String,
    pub correlation_id: Option<String>,
    /// False when the raw label fell through the alias table
    pub label_recognized: bool,
    /// True when no model output was used (artifact or scoring failure)
    pub fallback: bool,
}

/// Batch answer; predictions are in request order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchPrediction {
    pub predictions: Vec<CanonicalPrediction>,
    pub model_version: String,
    pub correlation_id: Option<String>,
}

pub struct PredictionService {
    models: ModelCache,
    schemas: SchemaDocumentCache,
    risk_version: String,
    claim_version: String,
    audit: AuditLogger,
}

impl PredictionService {
    pub fn new(models: ModelCache, schemas: SchemaDocumentCache, audit: AuditLogger) -> Self {
        Self {
            models,
            schemas,
            risk_version: DEFAULT_MODEL_VERSION.to_string(),
            claim_version: DEFAULT_MODEL_VERSION.to_string(),
            audit,
        }
    }

    pub fn with_versions(mut self, risk: impl Into<String>, claim: impl Into<String>) -> Self {
        self.risk_version = risk.into();
        self.claim_version = claim.into();
        self
    }

    /// Wire caches, versions and audit sinks from configuration
    pub fn from_config(config: &Config) -> Self {
        let mut sinks = MultiSink::new().with(Arc::new(TracingSink));
        if let Some(path) = &config.audit_log_path {
            sinks = sinks.with(Arc::new(JsonlSink::new(path)));
        }

        Self::new(
            ModelCache::from_config(config),
            SchemaDocumentCache::new(config.feature_schema_path()),
            AuditLogger::new(config.log_predictions, Arc::new(sinks)),
        )
        .with_versions(
            config.model_version(ModelKind::Risk),
            config.model_version(ModelKind::Claim),
        )
    }

    pub fn models(&self) -> &ModelCache {
        &self.models
    }

    pub fn schemas(&self) -> &SchemaDocumentCache {
        &self.schemas
    }

    pub fn model_version(&self, kind: ModelKind) -> &str {
        match kind {
            ModelKind::Risk => &self.risk_version,
            ModelKind::Claim => &self.claim_version,
        }
    }

    /// Score one request; never fails
    pub fn predict(
        &self,
        kind: ModelKind,
        request: &PredictionRequest,
        correlation_id: Option<&str>,
    ) -> CanonicalPrediction {
        let model_version = self.model_version(kind);

        let (label, distribution, label_recognized, fallback) = match self.score_request(kind, request) {
            Some(output) => {
                let normalized = normalize(kind, &output.label);
                if !normalized.recognized {
                    tracing::warn!(
                        model = %kind,
                        raw_label = %output.label,
                        fallback = %normalized.label,
                        "Unrecognized model label"
                    );
                }
                (normalized.label, output.distribution, normalized.recognized, false)
            }
            None => (kind.fallback_label(), None, true, true),
        };

        let features = request.present_fields();
        self.audit.record(AuditEvent {
            model_name: kind.model_name(),
            model_version,
            request_id: correlation_id,
            features: &features,
            prediction: label.as_str(),
            probabilities: distribution.as_ref(),
        });

        CanonicalPrediction {
            label,
            distribution,
            model_version: model_version.to_string(),
            correlation_id: correlation_id.map(str::to_string),
            label_recognized,
            fallback,
        }
    }

    /// Score each request in order under one correlation id
    pub fn predict_batch(
        &self,
        kind: ModelKind,
        requests: &[PredictionRequest],
        correlation_id: Option<&str>,
    ) -> Result<BatchPrediction, BatchError> {
        if requests.len() > MAX_BATCH_SIZE {
            return Err(BatchError::TooLarge {
                size: requests.len(),
                max: MAX_BATCH_SIZE,
            });
        }

        let predictions = requests
            .iter()
            .map(|request| self.predict(kind, request, correlation_id))
            .collect();

        Ok(BatchPrediction {
            predictions,
            model_version: self.model_version(kind).to_string(),
            correlation_id: correlation_id.map(str::to_string),
        })
    }

    /// Raw model output, or `None` when the fallback label applies
    fn score_request(&self, kind: ModelKind, request: &PredictionRequest) -> Option<ScoredOutput> {
        let handle = match self.models.get(kind) {
            Ok(handle) => handle,
            Err(e) => {
                tracing::warn!(model = %kind, error = %e, "Model unavailable, using fallback label");
                return None;
            }
        };

        let row = match resolve(&handle, self.schemas.get(), kind.key()) {
            Some(resolved) => {
                tracing::debug!(model = %kind, source = ?resolved.source, "Resolved model schema");
                build(&resolved.schema, request, kind.aliases())
            }
            None => build_passthrough(request),
        };

        match score(&handle, &row) {
            Ok(output) => Some(output),
            Err(e) => {
                tracing::warn!(model = %kind, error = %e, "Scoring failed, using fallback label");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::MemorySink;
    use crate::model::estimators::{LogisticRegression, ModelArtifact, NearestCentroid};
    use crate::model::{FeatureSchemaDocument, ModelHandle};
    use crate::prediction::{ClaimStatus, RiskScore};

    struct Fixture {
        _dir: tempfile::TempDir,
        service: PredictionService,
        audit: Arc<MemorySink>,
    }

    fn fixture(schemas: SchemaDocumentCache) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let audit = Arc::new(MemorySink::new());
        let service = PredictionService::new(
            ModelCache::new(dir.path().join("risk.bin"), dir.path().join("claim.bin")),
            schemas,
            AuditLogger::new(true, audit.clone()),
        )
        .with_versions("2.1.0", "0.9.0");

        Fixture {
            _dir: dir,
            service,
            audit,
        }
    }

    fn empty_fixture() -> Fixture {
        fixture(SchemaDocumentCache::preloaded(FeatureSchemaDocument::default()))
    }

    fn risk_logit(feature_names_in: Option<Vec<String>>) -> LogisticRegression {
        // High iff 0.1 * age - 1 > 0
        LogisticRegression {
            classes: vec!["Low".into(), "High".into()],
            coef: vec![vec![0.0, 0.0, 0.1]],
            intercept: vec![-1.0],
            feature_names_in,
        }
    }

    fn gender_age_schema() -> Vec<String> {
        vec!["gender_F".into(), "gender_M".into(), "age".into()]
    }

    fn patient(age: f64) -> PredictionRequest {
        PredictionRequest::new().with("gender", "F").with("age", age)
    }

    #[test]
    fn test_missing_artifact_falls_back_and_audits_once() {
        let f = empty_fixture();

        let prediction = f.service.predict(ModelKind::Risk, &patient(45.0), Some("abc"));

        assert_eq!(prediction.label, CanonicalLabel::Risk(RiskScore::Low));
        assert!(prediction.distribution.is_none());
        assert!(prediction.fallback);
        assert_eq!(prediction.model_version, "2.1.0");
        assert_eq!(prediction.correlation_id.as_deref(), Some("abc"));

        let records = f.audit.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].prediction, "Low");
        assert_eq!(records[0].model_name, "risk_model");
        assert_eq!(records[0].request_id.as_deref(), Some("abc"));
    }

    #[test]
    fn test_missing_claim_artifact_is_pending() {
        let f = empty_fixture();

        let prediction = f.service.predict(ModelKind::Claim, &PredictionRequest::new(), None);

        assert_eq!(prediction.label, CanonicalLabel::Claim(ClaimStatus::Pending));
        assert_eq!(prediction.model_version, "0.9.0");
        assert_eq!(f.audit.records()[0].model_name, "claim_model");
    }

    #[test]
    fn test_json_artifact_on_disk_end_to_end() {
        let f = empty_fixture();
        let path = f.service.models().artifact_path(ModelKind::Risk).to_path_buf();
        let artifact = serde_json::json!({
            "model": ModelArtifact::LogisticRegression(risk_logit(Some(gender_age_schema()))),
            "trained_at": "2024-01-01"
        });
        std::fs::write(&path, serde_json::to_vec(&artifact).unwrap()).unwrap();

        let old = f.service.predict(ModelKind::Risk, &patient(45.0), None);
        let young = f.service.predict(ModelKind::Risk, &patient(5.0), None);

        assert_eq!(old.label, CanonicalLabel::Risk(RiskScore::High));
        assert!(!old.fallback);
        assert!(old.label_recognized);
        let dist = old.distribution.unwrap();
        assert_eq!(dist.entries()[0].0, "Low");
        assert!(dist.get("High").unwrap() > 0.9);

        assert_eq!(young.label, CanonicalLabel::Risk(RiskScore::Low));
        assert!(!young.fallback);
    }

    #[test]
    fn test_schema_document_used_when_model_declares_none() {
        let mut doc = FeatureSchemaDocument::default();
        doc.insert("risk", gender_age_schema());
        let f = fixture(SchemaDocumentCache::preloaded(doc));
        f.service
            .models()
            .install(ModelKind::Risk, ModelHandle::from_scorable(risk_logit(None)))
            .unwrap();

        // extra fields are ignored once a schema is known
        let request = patient(50.0).with("department", "Cardiology");
        let prediction = f.service.predict(ModelKind::Risk, &request, None);

        assert_eq!(prediction.label, CanonicalLabel::Risk(RiskScore::High));
        assert!(!prediction.fallback);
    }

    #[test]
    fn test_unrecognized_label_is_flagged() {
        let f = empty_fixture();
        let model = NearestCentroid {
            classes: vec!["Critical".into()],
            centroids: vec![vec![0.0]],
            feature_names_in: Some(vec!["age".into()]),
        };
        f.service
            .models()
            .install(ModelKind::Risk, ModelHandle::from_scorable(model))
            .unwrap();

        let prediction = f.service.predict(ModelKind::Risk, &patient(45.0), None);

        assert_eq!(prediction.label, CanonicalLabel::Risk(RiskScore::Low));
        assert!(!prediction.label_recognized);
        assert!(!prediction.fallback);
        assert!(prediction.distribution.is_none());
    }

    #[test]
    fn test_scoring_failure_degrades_to_fallback() {
        let f = empty_fixture();
        // No declared schema, no document: the passthrough row has 2 fields
        let model = NearestCentroid {
            classes: vec!["Rejected".into()],
            centroids: vec![vec![0.0, 0.0, 0.0, 0.0]],
            feature_names_in: None,
        };
        f.service
            .models()
            .install(ModelKind::Claim, ModelHandle::from_scorable(model))
            .unwrap();

        let request = PredictionRequest::new().with("billing_amount", 1200.0).with("payer", "Medicare");
        let prediction = f.service.predict(ModelKind::Claim, &request, Some("r1"));

        assert_eq!(prediction.label, CanonicalLabel::Claim(ClaimStatus::Pending));
        assert!(prediction.fallback);
        assert_eq!(f.audit.records()[0].prediction, "Pending");
    }

    #[test]
    fn test_passthrough_scores_when_widths_agree() {
        let f = empty_fixture();
        let model = NearestCentroid {
            classes: vec!["Paid".into(), "Rejected".into()],
            centroids: vec![vec![1000.0, 0.0], vec![0.0, 1.0]],
            feature_names_in: None,
        };
        f.service
            .models()
            .install(ModelKind::Claim, ModelHandle::from_scorable(model))
            .unwrap();

        // key order: billing_amount, is_emergency
        let request = PredictionRequest::new()
            .with("is_emergency", false)
            .with("billing_amount", 990.0);
        let prediction = f.service.predict(ModelKind::Claim, &request, None);

        assert_eq!(prediction.label, CanonicalLabel::Claim(ClaimStatus::Paid));
        assert!(!prediction.fallback);
    }

    #[test]
    fn test_batch_preserves_order_and_shares_id() {
        let f = empty_fixture();
        f.service
            .models()
            .install(
                ModelKind::Risk,
                ModelHandle::from_scorable(risk_logit(Some(gender_age_schema()))),
            )
            .unwrap();

        let requests = vec![patient(80.0), patient(1.0), patient(70.0)];
        let batch = f
            .service
            .predict_batch(ModelKind::Risk, &requests, Some("batch-7"))
            .unwrap();

        let labels: Vec<&str> = batch.predictions.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["High", "Low", "High"]);
        assert_eq!(batch.correlation_id.as_deref(), Some("batch-7"));
        assert_eq!(batch.model_version, "2.1.0");
        assert!(batch
            .predictions
            .iter()
            .all(|p| p.correlation_id.as_deref() == Some("batch-7")));
        assert_eq!(f.audit.len(), 3);
    }

    #[test]
    fn test_batch_limit() {
        let f = empty_fixture();

        let at_limit = vec![PredictionRequest::new(); MAX_BATCH_SIZE];
        assert_eq!(
            f.service
                .predict_batch(ModelKind::Claim, &at_limit, None)
                .unwrap()
                .predictions
                .len(),
            MAX_BATCH_SIZE
        );

        let before = f.audit.len();
        let too_many = vec![PredictionRequest::new(); MAX_BATCH_SIZE + 1];
        assert_eq!(
            f.service.predict_batch(ModelKind::Claim, &too_many, None),
            Err(BatchError::TooLarge {
                size: MAX_BATCH_SIZE + 1,
                max: MAX_BATCH_SIZE
            })
        );
        assert_eq!(f.audit.len(), before);
    }

    #[test]
    fn test_audit_disabled_still_predicts() {
        let dir = tempfile::tempdir().unwrap();
        let service = PredictionService::new(
            ModelCache::new(dir.path().join("risk.bin"), dir.path().join("claim.bin")),
            SchemaDocumentCache::new(dir.path().join("schema.json")),
            AuditLogger::disabled(),
        );

        let prediction = service.predict(ModelKind::Risk, &patient(45.0), None);

        assert_eq!(prediction.label.as_str(), "Low");
        assert_eq!(prediction.model_version, DEFAULT_MODEL_VERSION);
    }
}
