//! Features Module - Request Reconciliation Engine
//!
//! Turns a partial, loosely typed request into the exact numeric row a
//! trained model was fit on.

pub mod layout;
pub mod reconcile;
pub mod request;
pub mod vector;


// Re-export common types
pub use layout::ModelSchema;
pub use reconcile::{
    build, build_passthrough, FeatureSource, FieldAlias, CLAIM_FIELD_ALIASES, RISK_FIELD_ALIASES,
};
pub use request::{FieldValue, PredictionRequest};
pub use vector::FeatureRow;
