//! Model kinds and their output vocabularies

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::features::{FieldAlias, CLAIM_FIELD_ALIASES, RISK_FIELD_ALIASES};

/// The two served classifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    /// Visit risk classification
    Risk,
    /// Claim outcome classification
    Claim,
}

impl ModelKind {
    pub const ALL: [ModelKind; 2] = [ModelKind::Risk, ModelKind::Claim];

    /// Key in the feature-schema document
    pub fn key(&self) -> &'static str {
        match self {
            ModelKind::Risk => "risk",
            ModelKind::Claim => "claim",
        }
    }

    /// Model name in audit records
    pub fn model_name(&self) -> &'static str {
        match self {
            ModelKind::Risk => "risk_model",
            ModelKind::Claim => "claim_model",
        }
    }

    /// API field renames for this model
    pub fn aliases(&self) -> &'static [FieldAlias] {
        match self {
            ModelKind::Risk => RISK_FIELD_ALIASES,
            ModelKind::Claim => CLAIM_FIELD_ALIASES,
        }
    }

    /// Safe answer when the model cannot be used
    pub fn fallback_label(&self) -> CanonicalLabel {
        match self {
            ModelKind::Risk => CanonicalLabel::Risk(RiskScore::Low),
            ModelKind::Claim => CanonicalLabel::Claim(ClaimStatus::Pending),
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskScore {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClaimStatus {
    Paid,
    Pending,
    Rejected,
}

/// A model output mapped into the service vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum CanonicalLabel {
    Risk(RiskScore),
    Claim(ClaimStatus),
}

impl CanonicalLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalLabel::Risk(RiskScore::Low) => "Low",
            CanonicalLabel::Risk(RiskScore::Medium) => "Medium",
            CanonicalLabel::Risk(RiskScore::High) => "High",
            CanonicalLabel::Claim(ClaimStatus::Paid) => "Paid",
            CanonicalLabel::Claim(ClaimStatus::Pending) => "Pending",
            CanonicalLabel::Claim(ClaimStatus::Rejected) => "Rejected",
        }
    }

    pub fn kind(&self) -> ModelKind {
        match self {
            CanonicalLabel::Risk(_) => ModelKind::Risk,
            CanonicalLabel::Claim(_) => ModelKind::Claim,
        }
    }
}

impl fmt::Display for CanonicalLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
