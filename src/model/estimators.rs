//! Built-in Estimators - serde-described trained models
//!
//! Artifacts hold one of these, bare or inside a container. Each estimator
//! scores positionally: the row must be in the order it was fit with.

use serde::{Deserialize, Serialize};

use super::estimator::{Capabilities, ClassDistribution, LabelValue, RawLabel, Scorable, StageSchema};
use crate::error::ScoringError;
use crate::features::ModelSchema;

// ============================================================================
// ARTIFACT MODEL
// ============================================================================

/// A trained estimator as stored in an artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelArtifact {
    LogisticRegression(LogisticRegression),
    DecisionTree(DecisionTree),
    NearestCentroid(NearestCentroid),
    Pipeline(Pipeline),
}

/// Linear classifier: sigmoid for one coefficient row, softmax otherwise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    pub classes: Vec<String>,
    pub coef: Vec<Vec<f64>>,
    pub intercept: Vec<f64>,
    #[serde(default)]
    pub feature_names_in: Option<Vec<String>>,
}

/// Flat binary tree; leaves hold per-class weights
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub classes: Vec<String>,
    pub nodes: Vec<TreeNode>,
    #[serde(default)]
    pub feature_names_in: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeNode {
    /// Go left when `row[feature] <= threshold`
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: Vec<f64>,
    },
}

/// Nearest class centroid; label only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearestCentroid {
    pub classes: Vec<String>,
    pub centroids: Vec<Vec<f64>>,
    #[serde(default)]
    pub feature_names_in: Option<Vec<String>>,
}

/// Named stages applied in order; the last one must be a classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pipeline {
    pub steps: Vec<PipelineStep>,
    #[serde(default)]
    pub feature_names_in: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineStep {
    pub name: String,
    pub stage: Stage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    StandardScaler(StandardScaler),
    Classifier(Box<ModelArtifact>),
}

/// `(x - mean) / scale` per feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
    #[serde(default)]
    pub feature_names_in: Option<Vec<String>>,
}

// ============================================================================
// HELPERS
// ============================================================================

fn check_width(expected: usize, row: &[f64]) -> Result<(), ScoringError> {
    if expected != row.len() {
        return Err(ScoringError::FeatureCountMismatch {
            expected,
            actual: row.len(),
        });
    }
    Ok(())
}

fn schema_of(names: &Option<Vec<String>>) -> Option<ModelSchema> {
    names.as_ref().map(|n| ModelSchema::new(n.iter().cloned()))
}

/// First index of the maximum; NaN never wins
fn argmax(values: &[f64]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (i, &v)| match best {
            Some((_, b)) if !(v > b) => best,
            _ if v.is_nan() => best,
            _ => Some((i, v)),
        })
        .map(|(i, _)| i)
}

fn label_at(classes: &[String], index: Option<usize>) -> Result<RawLabel, ScoringError> {
    index
        .and_then(|i| classes.get(i))
        .map(|c| RawLabel::Sequence(vec![LabelValue::Text(c.clone())]))
        .ok_or_else(|| ScoringError::MalformedModel("predicted class index out of range".to_string()))
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

fn softmax(z: &[f64]) -> Vec<f64> {
    let max = z.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = z.iter().map(|v| (v - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

// ============================================================================
// LOGISTIC REGRESSION
// ============================================================================

impl LogisticRegression {
    pub fn n_features(&self) -> usize {
        self.coef.first().map(Vec::len).unwrap_or(0)
    }

    pub fn predict_proba(&self, row: &[f64]) -> Result<Vec<f64>, ScoringError> {
        check_width(self.n_features(), row)?;
        if self.coef.len() != self.intercept.len() {
            return Err(ScoringError::MalformedModel(
                "coefficient rows and intercepts differ in length".to_string(),
            ));
        }

        let decision: Vec<f64> = self
            .coef
            .iter()
            .zip(&self.intercept)
            .map(|(w, b)| w.iter().zip(row).map(|(w, x)| w * x).sum::<f64>() + b)
            .collect();

        match (self.classes.len(), decision.len()) {
            (2, 1) => {
                let p = sigmoid(decision[0]);
                Ok(vec![1.0 - p, p])
            }
            (n, m) if n == m && n > 0 => Ok(softmax(&decision)),
            (n, m) => Err(ScoringError::MalformedModel(format!(
                "{} classes but {} coefficient rows",
                n, m
            ))),
        }
    }
}

impl Scorable for LogisticRegression {
    fn estimator_type(&self) -> &str {
        "logistic_regression"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            distribution: true,
            declared_schema: self.feature_names_in.is_some(),
            pipeline: false,
        }
    }

    fn score_label(&self, row: &[f64]) -> Result<RawLabel, ScoringError> {
        let proba = self.predict_proba(row)?;
        label_at(&self.classes, argmax(&proba))
    }

    fn score_distribution(&self, row: &[f64]) -> Result<ClassDistribution, ScoringError> {
        let proba = self.predict_proba(row)?;
        Ok(ClassDistribution::from_classes(&self.classes, &proba))
    }

    fn declared_schema(&self) -> Option<ModelSchema> {
        schema_of(&self.feature_names_in)
    }

    fn classes(&self) -> Option<Vec<String>> {
        Some(self.classes.clone())
    }
}

// ============================================================================
// DECISION TREE
// ============================================================================

impl DecisionTree {
    /// Leaf weights reached by `row`
    fn leaf_value(&self, row: &[f64]) -> Result<&[f64], ScoringError> {
        let mut index = 0usize;
        // A well-formed tree reaches a leaf in fewer steps than it has nodes
        for _ in 0..=self.nodes.len() {
            match self.nodes.get(index) {
                Some(TreeNode::Leaf { value }) => return Ok(value.as_slice()),
                Some(TreeNode::Split { feature, threshold, left, right }) => {
                    let x = row.get(*feature).ok_or(ScoringError::FeatureCountMismatch {
                        expected: feature + 1,
                        actual: row.len(),
                    })?;
                    index = if *x <= *threshold { *left } else { *right };
                }
                None => {
                    return Err(ScoringError::MalformedModel(format!(
                        "tree node {} does not exist",
                        index
                    )))
                }
            }
        }
        Err(ScoringError::MalformedModel("tree contains a cycle".to_string()))
    }

    pub fn predict_proba(&self, row: &[f64]) -> Result<Vec<f64>, ScoringError> {
        if let Some(names) = &self.feature_names_in {
            check_width(names.len(), row)?;
        }

        let value = self.leaf_value(row)?;
        if value.len() != self.classes.len() {
            return Err(ScoringError::MalformedModel(format!(
                "leaf has {} weights for {} classes",
                value.len(),
                self.classes.len()
            )));
        }

        let total: f64 = value.iter().sum();
        if total <= 0.0 {
            let uniform = 1.0 / value.len().max(1) as f64;
            return Ok(vec![uniform; value.len()]);
        }
        Ok(value.iter().map(|v| v / total).collect())
    }
}

impl Scorable for DecisionTree {
    fn estimator_type(&self) -> &str {
        "decision_tree"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            distribution: true,
            declared_schema: self.feature_names_in.is_some(),
            pipeline: false,
        }
    }

    fn score_label(&self, row: &[f64]) -> Result<RawLabel, ScoringError> {
        let proba = self.predict_proba(row)?;
        label_at(&self.classes, argmax(&proba))
    }

    fn score_distribution(&self, row: &[f64]) -> Result<ClassDistribution, ScoringError> {
        let proba = self.predict_proba(row)?;
        Ok(ClassDistribution::from_classes(&self.classes, &proba))
    }

    fn declared_schema(&self) -> Option<ModelSchema> {
        schema_of(&self.feature_names_in)
    }

    fn classes(&self) -> Option<Vec<String>> {
        Some(self.classes.clone())
    }
}

// ============================================================================
// NEAREST CENTROID
// ============================================================================

impl Scorable for NearestCentroid {
    fn estimator_type(&self) -> &str {
        "nearest_centroid"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            distribution: false,
            declared_schema: self.feature_names_in.is_some(),
            pipeline: false,
        }
    }

    fn score_label(&self, row: &[f64]) -> Result<RawLabel, ScoringError> {
        let width = self.centroids.first().map(Vec::len).unwrap_or(0);
        check_width(width, row)?;

        // Negated distance so argmax picks the nearest
        let closeness: Vec<f64> = self
            .centroids
            .iter()
            .map(|c| -c.iter().zip(row).map(|(c, x)| (c - x).powi(2)).sum::<f64>())
            .collect();

        label_at(&self.classes, argmax(&closeness))
    }

    fn declared_schema(&self) -> Option<ModelSchema> {
        schema_of(&self.feature_names_in)
    }

    fn classes(&self) -> Option<Vec<String>> {
        Some(self.classes.clone())
    }
}

// ============================================================================
// PIPELINE
// ============================================================================

impl StandardScaler {
    pub fn transform(&self, row: &[f64]) -> Result<Vec<f64>, ScoringError> {
        check_width(self.mean.len(), row)?;
        if self.scale.len() != self.mean.len() {
            return Err(ScoringError::MalformedModel(
                "scaler mean and scale differ in length".to_string(),
            ));
        }
        Ok(row
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (m, s))| if *s == 0.0 { x - m } else { (x - m) / s })
            .collect())
    }
}

impl Pipeline {
    /// Run every transformer, return the row and the terminal classifier
    fn transform(&self, row: &[f64]) -> Result<(Vec<f64>, &ModelArtifact), ScoringError> {
        let (last, transformers) = self
            .steps
            .split_last()
            .ok_or_else(|| ScoringError::MalformedModel("pipeline has no steps".to_string()))?;

        let mut current = row.to_vec();
        for step in transformers {
            current = match &step.stage {
                Stage::StandardScaler(scaler) => scaler.transform(&current)?,
                Stage::Classifier(_) => {
                    return Err(ScoringError::MalformedModel(format!(
                        "classifier '{}' is not the final step",
                        step.name
                    )))
                }
            };
        }

        match &last.stage {
            Stage::Classifier(model) => Ok((current, &**model)),
            Stage::StandardScaler(_) => Err(ScoringError::MalformedModel(format!(
                "final step '{}' is not a classifier",
                last.name
            ))),
        }
    }

    fn terminal_classifier(&self) -> Option<&ModelArtifact> {
        match self.steps.last().map(|s| &s.stage) {
            Some(Stage::Classifier(model)) => Some(&**model),
            _ => None,
        }
    }
}

impl Stage {
    fn declared_schema(&self) -> Option<ModelSchema> {
        match self {
            Stage::StandardScaler(scaler) => schema_of(&scaler.feature_names_in),
            Stage::Classifier(model) => model.declared_schema(),
        }
    }
}

impl Scorable for Pipeline {
    fn estimator_type(&self) -> &str {
        "pipeline"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            distribution: self
                .terminal_classifier()
                .map(|m| m.capabilities().distribution)
                .unwrap_or(false),
            declared_schema: self.feature_names_in.is_some(),
            pipeline: true,
        }
    }

    fn score_label(&self, row: &[f64]) -> Result<RawLabel, ScoringError> {
        let (transformed, model) = self.transform(row)?;
        model.score_label(&transformed)
    }

    fn score_distribution(&self, row: &[f64]) -> Result<ClassDistribution, ScoringError> {
        let (transformed, model) = self.transform(row)?;
        model.score_distribution(&transformed)
    }

    fn declared_schema(&self) -> Option<ModelSchema> {
        schema_of(&self.feature_names_in)
    }

    fn stage_schemas(&self) -> Vec<StageSchema> {
        self.steps
            .iter()
            .map(|step| StageSchema {
                name: step.name.clone(),
                schema: step.stage.declared_schema(),
            })
            .collect()
    }

    fn classes(&self) -> Option<Vec<String>> {
        self.terminal_classifier().and_then(|m| m.classes())
    }
}

// ============================================================================
// DISPATCH
// ============================================================================

impl ModelArtifact {
    fn inner(&self) -> &dyn Scorable {
        match self {
            ModelArtifact::LogisticRegression(m) => m,
            ModelArtifact::DecisionTree(m) => m,
            ModelArtifact::NearestCentroid(m) => m,
            ModelArtifact::Pipeline(m) => m,
        }
    }
}

impl Scorable for ModelArtifact {
    fn estimator_type(&self) -> &str {
        self.inner().estimator_type()
    }

    fn capabilities(&self) -> Capabilities {
        self.inner().capabilities()
    }

    fn score_label(&self, row: &[f64]) -> Result<RawLabel, ScoringError> {
        self.inner().score_label(row)
    }

    fn score_distribution(&self, row: &[f64]) -> Result<ClassDistribution, ScoringError> {
        self.inner().score_distribution(row)
    }

    fn declared_schema(&self) -> Option<ModelSchema> {
        self.inner().declared_schema()
    }

    fn stage_schemas(&self) -> Vec<StageSchema> {
        self.inner().stage_schemas()
    }

    fn classes(&self) -> Option<Vec<String>> {
        self.inner().classes()
    }
}
