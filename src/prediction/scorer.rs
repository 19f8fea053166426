//! Scorer - run a handle against one row

use serde::Serialize;

use crate::error::ScoringError;
use crate::features::FeatureRow;
use crate::model::{ClassDistribution, ModelHandle};

/// Raw label plus optional class probabilities
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredOutput {
    pub label: String,
    /// Absent when the estimator has no probability output
    pub distribution: Option<ClassDistribution>,
}

/// Distribution first (when supported), then the top label
pub fn score(handle: &ModelHandle, row: &FeatureRow) -> Result<ScoredOutput, ScoringError> {
    let values = row.values();

    let distribution = handle.score_distribution(&values).transpose()?;
    let label = handle.score_label(&values)?.into_label_string()?;

    Ok(ScoredOutput { label, distribution })
}
