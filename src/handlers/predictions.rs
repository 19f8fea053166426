//! Prediction handlers
//!
//! Scoring is synchronous and may read an artifact from disk on first use,
//! so every call runs on the blocking pool.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderMap,
    Json,
};
use validator::Validate;

use crate::features::PredictionRequest;
use crate::prediction::{BatchPrediction, CanonicalPrediction, ModelKind};
use crate::schemas::{
    ClaimPredictionBatchRequest, ClaimPredictionBatchResponse, ClaimPredictionRequest,
    ClaimPredictionResponse, RiskPredictionBatchRequest, RiskPredictionBatchResponse,
    RiskPredictionRequest, RiskPredictionResponse,
};
use crate::{AppResult, AppState};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

fn header_request_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

async fn predict_one(
    state: AppState,
    kind: ModelKind,
    request: PredictionRequest,
    request_id: Option<String>,
) -> AppResult<CanonicalPrediction> {
    let service = state.service.clone();
    let prediction = tokio::task::spawn_blocking(move || {
        service.predict(kind, &request, request_id.as_deref())
    })
    .await?;

    Ok(prediction)
}

async fn predict_many(
    state: AppState,
    kind: ModelKind,
    requests: Vec<PredictionRequest>,
    request_id: Option<String>,
) -> AppResult<BatchPrediction> {
    let service = state.service.clone();
    let batch = tokio::task::spawn_blocking(move || {
        service.predict_batch(kind, &requests, request_id.as_deref())
    })
    .await??;

    Ok(batch)
}

/// Predict visit risk (Low / Medium / High)
pub async fn risk(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<RiskPredictionRequest>, JsonRejection>,
) -> AppResult<Json<RiskPredictionResponse>> {
    let Json(body) = payload?;
    body.validate()?;

    let prediction = predict_one(state, ModelKind::Risk, body.into(), header_request_id(&headers)).await?;
    Ok(Json(prediction.into()))
}

/// Predict claim outcome (Paid / Pending / Rejected)
pub async fn claim(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<ClaimPredictionRequest>, JsonRejection>,
) -> AppResult<Json<ClaimPredictionResponse>> {
    let Json(body) = payload?;
    body.validate()?;

    let prediction = predict_one(state, ModelKind::Claim, body.into(), header_request_id(&headers)).await?;
    Ok(Json(prediction.into()))
}

/// Batch risk predictions; body `request_id` wins over the header
pub async fn risk_batch(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<RiskPredictionBatchRequest>, JsonRejection>,
) -> AppResult<Json<RiskPredictionBatchResponse>> {
    let Json(body) = payload?;
    body.validate()?;

    let request_id = body.request_id.or_else(|| header_request_id(&headers));
    let requests = body.requests.into_iter().map(Into::into).collect();

    let batch = predict_many(state, ModelKind::Risk, requests, request_id).await?;
    Ok(Json(batch.into()))
}

/// Batch claim predictions; body `request_id` wins over the header
pub async fn claim_batch(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<ClaimPredictionBatchRequest>, JsonRejection>,
) -> AppResult<Json<ClaimPredictionBatchResponse>> {
    let Json(body) = payload?;
    body.validate()?;

    let request_id = body.request_id.or_else(|| header_request_id(&headers));
    let requests = body.requests.into_iter().map(Into::into).collect();

    let batch = predict_many(state, ModelKind::Claim, requests, request_id).await?;
    Ok(Json(batch.into()))
}
