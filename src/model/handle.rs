//! Model Handle - shared, immutable scoring adapter
//!
//! Capabilities are captured once when the handle is built; the optional
//! operations below answer `None` instead of probing the estimator again.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use super::artifact::ArtifactEncoding;
use super::estimator::{Capabilities, ClassDistribution, RawLabel, Scorable, StageSchema};
use crate::error::ScoringError;
use crate::features::ModelSchema;

/// Where a handle came from
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArtifactOrigin {
    /// `None` for handles installed in-process
    pub path: Option<PathBuf>,
    pub encoding: Option<ArtifactEncoding>,
    /// Estimator was taken out of a container
    pub unwrapped: bool,
}

struct HandleInner {
    model: Box<dyn Scorable>,
    capabilities: Capabilities,
    origin: ArtifactOrigin,
}

/// Cheaply clonable reference to a loaded model
#[derive(Clone)]
pub struct ModelHandle {
    inner: Arc<HandleInner>,
}

impl ModelHandle {
    pub fn new<S: Scorable + 'static>(model: S, origin: ArtifactOrigin) -> Self {
        let capabilities = model.capabilities();
        Self {
            inner: Arc::new(HandleInner {
                model: Box::new(model),
                capabilities,
                origin,
            }),
        }
    }

    /// Wrap an in-process estimator (no artifact file)
    pub fn from_scorable<S: Scorable + 'static>(model: S) -> Self {
        Self::new(model, ArtifactOrigin::default())
    }

    pub fn capabilities(&self) -> Capabilities {
        self.inner.capabilities
    }

    pub fn origin(&self) -> &ArtifactOrigin {
        &self.inner.origin
    }

    pub fn estimator_type(&self) -> &str {
        self.inner.model.estimator_type()
    }

    pub fn score_label(&self, row: &[f64]) -> Result<RawLabel, ScoringError> {
        self.inner.model.score_label(row)
    }

    /// `None` when the estimator has no probability output
    pub fn score_distribution(&self, row: &[f64]) -> Option<Result<ClassDistribution, ScoringError>> {
        if !self.inner.capabilities.distribution {
            return None;
        }
        Some(self.inner.model.score_distribution(row))
    }

    pub fn declared_schema(&self) -> Option<ModelSchema> {
        if !self.inner.capabilities.declared_schema {
            return None;
        }
        self.inner.model.declared_schema()
    }

    /// Stage schemas in fit order; empty unless the model is a pipeline
    pub fn stage_schemas(&self) -> Vec<StageSchema> {
        if !self.inner.capabilities.pipeline {
            return Vec::new();
        }
        self.inner.model.stage_schemas()
    }

    pub fn classes(&self) -> Option<Vec<String>> {
        self.inner.model.classes()
    }

    /// Same underlying model instance
    pub fn ptr_eq(&self, other: &ModelHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelHandle")
            .field("estimator", &self.estimator_type())
            .field("capabilities", &self.inner.capabilities)
            .field("origin", &self.inner.origin)
            .finish()
    }
}
