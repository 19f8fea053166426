//! Model Schema - fit-time feature layout
//!
//! **The schema controls the row shape**
//!
//! A trained estimator scores positionally, so the order of names here is
//! the order of values in every row built for it. Names are unique.

use serde::{Deserialize, Serialize};

/// Ordered, unique feature names a model expects
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct ModelSchema {
    names: Vec<String>,
}

impl ModelSchema {
    /// Build from names; later duplicates are dropped
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for name in names {
            let name = name.into();
            if unique.contains(&name) {
                tracing::warn!("Duplicate feature name '{}' in schema, keeping first", name);
                continue;
            }
            unique.push(name);
        }
        Self { names: unique }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Position of a feature in the row
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }
}

impl From<Vec<String>> for ModelSchema {
    fn from(names: Vec<String>) -> Self {
        Self::new(names)
    }
}

impl From<ModelSchema> for Vec<String> {
    fn from(schema: ModelSchema) -> Self {
        schema.names
    }
}
