//! Request / response bodies for the HTTP surface
//!
//! Documented fields are typed and validated; any other scalar fields the
//! caller sends are kept and handed to the reconciler untouched.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::features::{FieldValue, PredictionRequest};
use crate::model::ClassDistribution;
use crate::prediction::{BatchPrediction, CanonicalLabel, CanonicalPrediction};

/// Accumulates `(name, value)` pairs, recording absent optionals as null
struct Fields(Vec<(String, Option<FieldValue>)>);

impl Fields {
    fn new(extra: BTreeMap<String, Option<FieldValue>>) -> Self {
        Self(extra.into_iter().collect())
    }

    fn put<V: Into<FieldValue>>(mut self, name: &str, value: Option<V>) -> Self {
        self.0.push((name.to_string(), value.map(Into::into)));
        self
    }

    fn finish(self) -> PredictionRequest {
        self.0.into_iter().collect()
    }
}

// ============================================================================
// RISK
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RiskPredictionRequest {
    /// Department code or name
    pub department: String,
    /// Type of visit (e.g. Inpatient, Outpatient)
    pub visit_type: String,
    pub length_of_stay_hours: Option<f64>,
    pub city: Option<String>,
    pub gender: Option<String>,
    pub insurance_provider: Option<String>,
    /// Attending doctor identifier
    pub doctor_id: Option<String>,
    pub visit_frequency: Option<f64>,
    /// Patient average length of stay; renamed for the model
    pub avg_length_of_stay_patient: Option<f64>,
    /// Used only if the model was trained with it
    pub age: Option<f64>,
    /// Chronic condition flag 0/1; used only if the model was trained with it
    pub chronic_flag: Option<f64>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Option<FieldValue>>,
}

impl From<RiskPredictionRequest> for PredictionRequest {
    fn from(r: RiskPredictionRequest) -> Self {
        Fields::new(r.extra)
            .put("department", Some(r.department))
            .put("visit_type", Some(r.visit_type))
            .put("length_of_stay_hours", r.length_of_stay_hours)
            .put("city", r.city)
            .put("gender", r.gender)
            .put("insurance_provider", r.insurance_provider)
            .put("doctor_id", r.doctor_id)
            .put("visit_frequency", r.visit_frequency)
            .put("avg_length_of_stay_patient", r.avg_length_of_stay_patient)
            .put("age", r.age)
            .put("chronic_flag", r.chronic_flag)
            .finish()
    }
}

#[derive(Debug, Serialize)]
pub struct RiskPredictionResponse {
    /// Low, Medium or High
    pub risk_score: CanonicalLabel,
    pub probabilities: Option<ClassDistribution>,
    pub model_version: String,
    pub request_id: Option<String>,
}

impl From<CanonicalPrediction> for RiskPredictionResponse {
    fn from(p: CanonicalPrediction) -> Self {
        Self {
            risk_score: p.label,
            probabilities: p.distribution,
            model_version: p.model_version,
            request_id: p.correlation_id,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct RiskPredictionBatchRequest {
    #[validate(length(max = 100), nested)]
    pub requests: Vec<RiskPredictionRequest>,
    pub request_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RiskPredictionBatchResponse {
    pub predictions: Vec<RiskPredictionResponse>,
    pub model_version: String,
    pub request_id: Option<String>,
}

impl From<BatchPrediction> for RiskPredictionBatchResponse {
    fn from(b: BatchPrediction) -> Self {
        Self {
            predictions: b.predictions.into_iter().map(Into::into).collect(),
            model_version: b.model_version,
            request_id: b.correlation_id,
        }
    }
}

// ============================================================================
// CLAIM
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ClaimPredictionRequest {
    /// Department code or name
    pub department: String,
    #[validate(range(min = 0.0))]
    pub billed_amount: f64,
    /// Approved amount if known
    #[validate(range(min = 0.0))]
    pub approved_amount: Option<f64>,
    pub insurance_provider: String,
    /// Payment delay in days
    #[validate(range(min = 0.0))]
    pub payment_days: Option<f64>,
    pub visit_type: Option<String>,
    #[validate(range(min = 0.0))]
    pub length_of_stay_hours: Option<f64>,
    pub city: Option<String>,
    pub gender: Option<String>,
    /// approved_amount / billed_amount
    #[validate(range(min = 0.0, max = 1.0))]
    pub revenue_realization_ratio: Option<f64>,
    /// Historical rejection rate for the provider
    #[validate(range(min = 0.0, max = 1.0))]
    pub provider_rejection_rate: Option<f64>,
    pub age: Option<f64>,
    pub chronic_flag: Option<f64>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Option<FieldValue>>,
}

impl From<ClaimPredictionRequest> for PredictionRequest {
    fn from(r: ClaimPredictionRequest) -> Self {
        Fields::new(r.extra)
            .put("department", Some(r.department))
            .put("billed_amount", Some(r.billed_amount))
            .put("approved_amount", r.approved_amount)
            .put("insurance_provider", Some(r.insurance_provider))
            .put("payment_days", r.payment_days)
            .put("visit_type", r.visit_type)
            .put("length_of_stay_hours", r.length_of_stay_hours)
            .put("city", r.city)
            .put("gender", r.gender)
            .put("revenue_realization_ratio", r.revenue_realization_ratio)
            .put("provider_rejection_rate", r.provider_rejection_rate)
            .put("age", r.age)
            .put("chronic_flag", r.chronic_flag)
            .finish()
    }
}

#[derive(Debug, Serialize)]
pub struct ClaimPredictionResponse {
    /// Paid, Pending or Rejected
    pub claim_status: CanonicalLabel,
    pub probabilities: Option<ClassDistribution>,
    pub model_version: String,
    pub request_id: Option<String>,
}

impl From<CanonicalPrediction> for ClaimPredictionResponse {
    fn from(p: CanonicalPrediction) -> Self {
        Self {
            claim_status: p.label,
            probabilities: p.distribution,
            model_version: p.model_version,
            request_id: p.correlation_id,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct ClaimPredictionBatchRequest {
    #[validate(length(max = 100), nested)]
    pub requests: Vec<ClaimPredictionRequest>,
    pub request_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ClaimPredictionBatchResponse {
    pub predictions: Vec<ClaimPredictionResponse>,
    pub model_version: String,
    pub request_id: Option<String>,
}

impl From<BatchPrediction> for ClaimPredictionBatchResponse {
    fn from(b: BatchPrediction) -> Self {
        Self {
            predictions: b.predictions.into_iter().map(Into::into).collect(),
            model_version: b.model_version,
            request_id: b.correlation_id,
        }
    }
}

// ============================================================================
// HEALTH
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// "ok" or "degraded"
    pub status: String,
    pub version: String,
    pub risk_model_loaded: bool,
    pub claim_model_loaded: bool,
    pub feature_schema_loaded: bool,
}
