//! Schema Resolution - which feature layout does this model expect?
//!
//! Resolution order, first hit wins:
//! 1. the estimator's own fit-time names
//! 2. a pipeline's terminal stage
//! 3. the most recently added named stage that declares names
//! 4. the external feature-schema document, keyed by model kind
//!
//! No hit means degraded mode (raw field pass-through).

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::handle::ModelHandle;
use crate::features::ModelSchema;

/// Where a resolved schema came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaSource {
    Declared,
    TerminalStage(String),
    NamedStage(String),
    Document,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSchema {
    pub schema: ModelSchema,
    pub source: SchemaSource,
}

// ============================================================================
// FEATURE-SCHEMA DOCUMENT
// ============================================================================

/// `{"risk": {"features": [...]}, "claim": {...}}`
///
/// Read leniently: unrelated top-level keys and entries without a string
/// `features` array are ignored rather than failing the whole document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureSchemaDocument {
    entries: BTreeMap<String, Value>,
}

impl FeatureSchemaDocument {
    pub fn insert(&mut self, key: impl Into<String>, features: Vec<String>) {
        self.entries.insert(key.into(), json!({ "features": features }));
    }

    /// Non-empty feature list for a model kind key
    ///
    /// `None` unless `<key>.features` is a non-empty array of strings.
    pub fn features_for(&self, key: &str) -> Option<ModelSchema> {
        let features = self.entries.get(key)?.get("features")?.as_array()?;
        let names = features
            .iter()
            .map(|f| f.as_str().map(str::to_string))
            .collect::<Option<Vec<String>>>()?;

        if names.is_empty() {
            return None;
        }
        Some(ModelSchema::new(names))
    }

    pub fn from_file(path: &Path) -> Result<Self, SchemaDocumentError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SchemaDocumentError {
    #[error("feature schema not found at {0}")]
    NotFound(PathBuf),
    #[error("could not read feature schema: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not parse feature schema: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Lazily loaded schema document; same retry-until-success rule as models
pub struct SchemaDocumentCache {
    path: PathBuf,
    cell: OnceCell<FeatureSchemaDocument>,
}

impl SchemaDocumentCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cell: OnceCell::new(),
        }
    }

    /// Already-parsed document (tests and embedders)
    pub fn preloaded(document: FeatureSchemaDocument) -> Self {
        Self {
            path: PathBuf::new(),
            cell: OnceCell::with_value(document),
        }
    }

    /// Document, or `None` when absent or unreadable
    pub fn get(&self) -> Option<&FeatureSchemaDocument> {
        let loaded = self.cell.get_or_try_init(|| {
            if !self.path.exists() {
                return Err(SchemaDocumentError::NotFound(self.path.clone()));
            }
            FeatureSchemaDocument::from_file(&self.path)
        });

        match loaded {
            Ok(document) => Some(document),
            Err(SchemaDocumentError::NotFound(_)) => None,
            Err(e) => {
                tracing::warn!("Could not load feature schema: {}", e);
                None
            }
        }
    }

    /// Present on disk or already loaded
    pub fn is_available(&self) -> bool {
        self.cell.get().is_some() || self.path.exists()
    }
}

// ============================================================================
// RESOLUTION
// ============================================================================

/// Ordered feature names `handle` expects, if anything declares them
pub fn resolve(
    handle: &ModelHandle,
    document: Option<&FeatureSchemaDocument>,
    kind_key: &str,
) -> Option<ResolvedSchema> {
    if let Some(schema) = handle.declared_schema() {
        return Some(ResolvedSchema {
            schema,
            source: SchemaSource::Declared,
        });
    }

    let stages = handle.stage_schemas();

    if let Some(last) = stages.last() {
        if let Some(schema) = &last.schema {
            return Some(ResolvedSchema {
                schema: schema.clone(),
                source: SchemaSource::TerminalStage(last.name.clone()),
            });
        }
    }

    if let Some(stage) = stages.iter().rev().find(|s| s.schema.is_some()) {
        if let Some(schema) = &stage.schema {
            return Some(ResolvedSchema {
                schema: schema.clone(),
                source: SchemaSource::NamedStage(stage.name.clone()),
            });
        }
    }

    if let Some(schema) = document.and_then(|d| d.features_for(kind_key)) {
        return Some(ResolvedSchema {
            schema,
            source: SchemaSource::Document,
        });
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::estimators::{
        LogisticRegression, ModelArtifact, Pipeline, PipelineStep, Stage, StandardScaler,
    };

    fn names(list: &[&str]) -> Option<Vec<String>> {
        Some(list.iter().map(|s| s.to_string()).collect())
    }

    fn logit(feature_names_in: Option<Vec<String>>) -> LogisticRegression {
        LogisticRegression {
            classes: vec!["Low".into(), "High".into()],
            coef: vec![vec![1.0, 1.0]],
            intercept: vec![0.0],
            feature_names_in,
        }
    }

    fn scaler(feature_names_in: Option<Vec<String>>) -> Stage {
        Stage::StandardScaler(StandardScaler {
            mean: vec![0.0, 0.0],
            scale: vec![1.0, 1.0],
            feature_names_in,
        })
    }

    fn pipeline(steps: Vec<(&str, Stage)>, own: Option<Vec<String>>) -> ModelHandle {
        ModelHandle::from_scorable(Pipeline {
            steps: steps
                .into_iter()
                .map(|(name, stage)| PipelineStep { name: name.into(), stage })
                .collect(),
            feature_names_in: own,
        })
    }

    fn document() -> FeatureSchemaDocument {
        let mut doc = FeatureSchemaDocument::default();
        doc.insert("risk", vec!["doc_a".into(), "doc_b".into()]);
        doc.insert("claim", vec![]);
        doc
    }

    #[test]
    fn test_declared_schema_wins() {
        let handle = ModelHandle::from_scorable(logit(names(&["age", "gender_F"])));

        let resolved = resolve(&handle, Some(&document()), "risk").unwrap();

        assert_eq!(resolved.source, SchemaSource::Declared);
        assert_eq!(resolved.schema, ModelSchema::new(["age", "gender_F"]));
    }

    #[test]
    fn test_pipeline_own_names_beat_stages() {
        let handle = pipeline(
            vec![("clf", Stage::Classifier(Box::new(ModelArtifact::LogisticRegression(logit(names(&["x", "y"]))))))],
            names(&["p", "q"]),
        );

        assert_eq!(resolve(&handle, None, "risk").unwrap().source, SchemaSource::Declared);
    }

    #[test]
    fn test_terminal_stage() {
        let handle = pipeline(
            vec![
                ("scale", scaler(names(&["raw_a", "raw_b"]))),
                ("clf", Stage::Classifier(Box::new(ModelArtifact::LogisticRegression(logit(names(&["a", "b"])))))),
            ],
            None,
        );

        let resolved = resolve(&handle, None, "risk").unwrap();

        assert_eq!(resolved.source, SchemaSource::TerminalStage("clf".into()));
        assert_eq!(resolved.schema, ModelSchema::new(["a", "b"]));
    }

    #[test]
    fn test_named_stage_in_reverse() {
        let handle = pipeline(
            vec![
                ("impute", scaler(names(&["first", "second"]))),
                ("scale", scaler(names(&["los", "age"]))),
                ("clf", Stage::Classifier(Box::new(ModelArtifact::LogisticRegression(logit(None))))),
            ],
            None,
        );

        let resolved = resolve(&handle, Some(&document()), "risk").unwrap();

        assert_eq!(resolved.source, SchemaSource::NamedStage("scale".into()));
        assert_eq!(resolved.schema, ModelSchema::new(["los", "age"]));
    }

    #[test]
    fn test_document_fallback() {
        let handle = ModelHandle::from_scorable(logit(None));

        let resolved = resolve(&handle, Some(&document()), "risk").unwrap();

        assert_eq!(resolved.source, SchemaSource::Document);
        assert_eq!(resolved.schema, ModelSchema::new(["doc_a", "doc_b"]));
    }

    #[test]
    fn test_unresolved() {
        let handle = ModelHandle::from_scorable(logit(None));

        assert!(resolve(&handle, None, "risk").is_none());
        // empty list in the document counts as absent
        assert!(resolve(&handle, Some(&document()), "claim").is_none());
    }

    #[test]
    fn test_document_cache_retries_until_present() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("feature_schema.json");
        let cache = SchemaDocumentCache::new(&path);

        assert!(cache.get().is_none());
        assert!(!cache.is_available());

        std::fs::write(&path, r#"{"risk": {"features": ["age", "gender_F"]}}"#).unwrap();

        let doc = cache.get().unwrap();
        assert_eq!(doc.features_for("risk"), Some(ModelSchema::new(["age", "gender_F"])));
        assert_eq!(doc.features_for("claim"), None);
    }

    #[test]
    fn test_document_ignores_unrelated_keys_and_partial_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("feature_schema.json");
        std::fs::write(
            &path,
            r#"{
                "version": "1.0",
                "risk": {"features": ["age", "gender_F"]},
                "claim": {"target": "claim_status"}
            }"#,
        )
        .unwrap();

        let cache = SchemaDocumentCache::new(&path);
        let doc = cache.get().unwrap();

        assert_eq!(doc.features_for("risk"), Some(ModelSchema::new(["age", "gender_F"])));
        assert_eq!(doc.features_for("claim"), None);
        assert_eq!(doc.features_for("version"), None);
    }

    #[test]
    fn test_document_features_must_be_strings() {
        let doc: FeatureSchemaDocument =
            serde_json::from_str(r#"{"risk": {"features": ["age", 3]}, "claim": {"features": "age"}}"#)
                .unwrap();

        assert_eq!(doc.features_for("risk"), None);
        assert_eq!(doc.features_for("claim"), None);
    }

    #[test]
    fn test_document_cache_bad_json_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("feature_schema.json");
        std::fs::write(&path, "{not json").unwrap();

        assert!(SchemaDocumentCache::new(&path).get().is_none());
    }
}
