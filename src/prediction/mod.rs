//! Prediction Module - scoring, label normalization, service surface

pub mod kind;
pub mod normalize;
pub mod scorer;
pub mod service;

// Re-export common types
pub use kind::{CanonicalLabel, ClaimStatus, ModelKind, RiskScore};
pub use normalize::{normalize, NormalizedLabel};
pub use scorer::{score, ScoredOutput};
pub use service::{BatchPrediction, CanonicalPrediction, PredictionService};
