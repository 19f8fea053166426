//! Error handling
//!
//! Core errors never reach a caller of `predict`: each one has a degraded
//! behavior in the prediction service. `AppError` is the HTTP-facing error.

use std::path::PathBuf;

use axum::{
    extract::rejection::JsonRejection,
    response::{IntoResponse, Response},
    http::StatusCode,
    Json,
};
use serde_json::json;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

// ============================================================================
// CORE ERRORS
// ============================================================================

/// A model artifact could not be turned into a scorable handle.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("model artifact not found at {0}")]
    NotFound(PathBuf),

    #[error("failed to read model artifact {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("model artifact could not be decoded (bincode: {binary}; json: {json})")]
    Decode { binary: String, json: String },
}

/// Scoring an assembled row failed inside the estimator.
#[derive(Debug, Error, PartialEq)]
pub enum ScoringError {
    #[error("estimator expects {expected} features, row has {actual}")]
    FeatureCountMismatch { expected: usize, actual: usize },

    #[error("malformed estimator: {0}")]
    MalformedModel(String),

    #[error("estimator returned an empty label sequence")]
    EmptyPrediction,

    #[error("estimator has no probability output")]
    DistributionUnsupported,
}

/// Audit record could not be hashed or delivered.
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("failed to canonicalize feature map: {0}")]
    Canonicalize(#[from] serde_json::Error),

    #[error("audit sink I/O failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("audit sink panicked")]
    SinkPanicked,
}

/// Batch prediction rejected before any scoring happened.
#[derive(Debug, Error, PartialEq)]
pub enum BatchError {
    #[error("batch of {size} requests exceeds the maximum of {max}")]
    TooLarge { size: usize, max: usize },
}

// ============================================================================
// HTTP ERRORS
// ============================================================================

#[derive(Debug)]
pub enum AppError {
    // Validation errors
    ValidationError(String),

    // Generic errors
    InternalError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::ValidationError(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.as_str()),
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::ValidationError(err.to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(err: JsonRejection) -> Self {
        AppError::ValidationError(err.body_text())
    }
}

impl From<BatchError> for AppError {
    fn from(err: BatchError) -> Self {
        AppError::ValidationError(err.to_string())
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::InternalError(err.to_string())
    }
}
