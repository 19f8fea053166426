//! Prediction Request - loosely typed field set from a caller
//!
//! Fields are optional scalars. Known fields and unknown extras are kept
//! side by side; nothing is dropped on the way in.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A single request scalar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl FieldValue {
    /// Numeric value, excluding booleans
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) if n.is_finite() => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Number, or 1.0/0.0 for a flag
    pub fn as_number_or_flag(&self) -> Option<f64> {
        match self {
            FieldValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            other => other.as_number(),
        }
    }

    /// Best-effort numeric coercion; text becomes 0.0
    pub fn coerce_numeric(&self) -> f64 {
        self.as_number_or_flag().unwrap_or(0.0)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Number(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Number(v as f64)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Text(v)
    }
}

/// Field name -> optional scalar. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PredictionRequest {
    fields: BTreeMap<String, Option<FieldValue>>,
}

impl PredictionRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.into(), Some(value.into()));
        self
    }

    /// Builder-style insert of an explicit null
    pub fn with_null(mut self, name: impl Into<String>) -> Self {
        self.fields.insert(name.into(), None);
        self
    }

    /// Non-null value of a field
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name).and_then(Option::as_ref)
    }

    /// Numeric (non-boolean) value of a field
    pub fn number(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(FieldValue::as_number)
    }

    /// String value of a field
    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(FieldValue::as_text)
    }

    /// Non-null fields in key order
    pub fn present(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields
            .iter()
            .filter_map(|(k, v)| v.as_ref().map(|v| (k.as_str(), v)))
    }

    /// Non-null fields as an owned map (the audited input)
    pub fn present_fields(&self) -> BTreeMap<String, FieldValue> {
        self.present()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FromIterator<(String, Option<FieldValue>)> for PredictionRequest {
    fn from_iter<I: IntoIterator<Item = (String, Option<FieldValue>)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}
