//! Health check handlers

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::constants::{APP_NAME, APP_VERSION};
use crate::prediction::ModelKind;
use crate::schemas::HealthResponse;
use crate::AppState;

/// Service index
pub async fn index() -> Json<Value> {
    Json(json!({
        "service": APP_NAME,
        "version": APP_VERSION,
        "health": "/health",
        "predict_risk": "POST /predict/risk",
        "predict_claim": "POST /predict/claim",
    }))
}

/// Readiness: artifacts present (or already loaded) for both models
pub async fn check(State(state): State<AppState>) -> Json<HealthResponse> {
    let models = state.service.models();
    let risk_loaded = models.is_available(ModelKind::Risk);
    let claim_loaded = models.is_available(ModelKind::Claim);

    Json(HealthResponse {
        status: if risk_loaded && claim_loaded { "ok" } else { "degraded" }.to_string(),
        version: APP_VERSION.to_string(),
        risk_model_loaded: risk_loaded,
        claim_model_loaded: claim_loaded,
        feature_schema_loaded: state.service.schemas().is_available(),
    })
}

/// Liveness only, no dependency checks
pub async fn live() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
