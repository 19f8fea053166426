//! Hospital Prediction Service
//!
//! Serves two pre-trained classifiers (visit risk, claim outcome) over HTTP.
//!
//! # Architecture
//!
//! ```text
//! HTTP (Axum) ──► PredictionService
//!                   ├─► ModelCache ──────► artifact (bincode / json)
//!                   ├─► SchemaResolver ──► feature_schema.json
//!                   ├─► FeatureReconciler
//!                   ├─► Scorer ──► LabelNormalizer
//!                   └─► AuditLogger ─────► tracing / JSONL
//! ```

pub mod audit;
pub mod config;
pub mod constants;
pub mod error;
pub mod features;
pub mod handlers;
pub mod model;
pub mod prediction;
pub mod schemas;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{CorsLayer, Any},
    trace::TraceLayer,
    compression::CompressionLayer,
};

pub use error::{AppError, AppResult};

use prediction::PredictionService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<PredictionService>,
}

impl AppState {
    pub fn from_config(config: &config::Config) -> Self {
        Self {
            service: Arc::new(PredictionService::from_config(config)),
        }
    }
}

/// Create the main router with all routes
pub fn create_router(state: AppState) -> Router {
    let health_routes = Router::new()
        .route("/", get(handlers::health::index))
        .route("/health", get(handlers::health::check))
        .route("/live", get(handlers::health::live));

    let prediction_routes = Router::new()
        .route("/predict/risk", post(handlers::predictions::risk))
        .route("/predict/claim", post(handlers::predictions::claim))
        .route("/predict/risk/batch", post(handlers::predictions::risk_batch))
        .route("/predict/claim/batch", post(handlers::predictions::claim_batch));

    Router::new()
        .merge(health_routes)
        .merge(prediction_routes)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}
