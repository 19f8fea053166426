//! Estimator capability interface
//!
//! Every loaded model is reached through `Scorable`. Label scoring is
//! mandatory; probability output and a declared schema are optional and
//! reported once through `capabilities()` so call sites never probe.

use std::fmt;

use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::error::ScoringError;
use crate::features::ModelSchema;

// ============================================================================
// OUTPUT TYPES
// ============================================================================

/// One label as an estimator reports it
#[derive(Debug, Clone, PartialEq)]
pub enum LabelValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
}

impl fmt::Display for LabelValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LabelValue::Text(s) => f.write_str(s),
            LabelValue::Integer(i) => write!(f, "{}", i),
            LabelValue::Float(x) => write!(f, "{}", x),
            LabelValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

/// Raw `predict` output: a scalar, or a batch-of-one sequence
#[derive(Debug, Clone, PartialEq)]
pub enum RawLabel {
    Scalar(LabelValue),
    Sequence(Vec<LabelValue>),
}

impl RawLabel {
    /// Coerce to the label string; sequences yield their first element
    pub fn into_label_string(self) -> Result<String, ScoringError> {
        match self {
            RawLabel::Scalar(value) => Ok(value.to_string()),
            RawLabel::Sequence(values) => values
                .into_iter()
                .next()
                .map(|v| v.to_string())
                .ok_or(ScoringError::EmptyPrediction),
        }
    }
}

/// Class -> probability, in the estimator's declared class order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassDistribution {
    entries: Vec<(String, f64)>,
}

impl ClassDistribution {
    pub fn new(entries: Vec<(String, f64)>) -> Self {
        Self { entries }
    }

    /// Pair class identifiers with probabilities positionally
    pub fn from_classes<T: ToString>(classes: &[T], probabilities: &[f64]) -> Self {
        Self {
            entries: classes
                .iter()
                .zip(probabilities)
                .map(|(c, p)| (c.to_string(), *p))
                .collect(),
        }
    }

    pub fn get(&self, class: &str) -> Option<f64> {
        self.entries.iter().find(|(c, _)| c == class).map(|(_, p)| *p)
    }

    pub fn entries(&self) -> &[(String, f64)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for ClassDistribution {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (class, p) in &self.entries {
            map.serialize_entry(class, p)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ClassDistribution {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct DistributionVisitor;

        impl<'de> Visitor<'de> for DistributionVisitor {
            type Value = ClassDistribution;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of class label to probability")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((class, p)) = access.next_entry::<String, f64>()? {
                    entries.push((class, p));
                }
                Ok(ClassDistribution { entries })
            }
        }

        deserializer.deserialize_map(DistributionVisitor)
    }
}

// ============================================================================
// CAPABILITIES
// ============================================================================

/// Optional operations an estimator supports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub distribution: bool,
    pub declared_schema: bool,
    pub pipeline: bool,
}

/// Schema declared by one named pipeline stage
#[derive(Debug, Clone, PartialEq)]
pub struct StageSchema {
    pub name: String,
    pub schema: Option<ModelSchema>,
}

/// Scoring surface of a loaded estimator
pub trait Scorable: Send + Sync {
    /// Short type name for logs and inspection
    fn estimator_type(&self) -> &str;

    /// Which optional operations are available
    fn capabilities(&self) -> Capabilities;

    /// Top label for one row
    fn score_label(&self, row: &[f64]) -> Result<RawLabel, ScoringError>;

    /// Class probabilities for one row
    fn score_distribution(&self, _row: &[f64]) -> Result<ClassDistribution, ScoringError> {
        Err(ScoringError::DistributionUnsupported)
    }

    /// Feature names the estimator was fit with
    fn declared_schema(&self) -> Option<ModelSchema> {
        None
    }

    /// Stage schemas in fit order (pipelines only)
    fn stage_schemas(&self) -> Vec<StageSchema> {
        Vec::new()
    }

    /// Declared classes, when known
    fn classes(&self) -> Option<Vec<String>> {
        None
    }
}
