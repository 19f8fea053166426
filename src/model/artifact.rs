//! Artifact Loading - bytes on disk -> scorable handle
//!
//! Two decoding strategies, first success wins:
//! 1. bincode `BinaryArtifact`
//! 2. JSON, either a bare estimator or an object with a `"model"` key
//!
//! Both resolve into `LoadedArtifact` before a handle is built.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::estimators::ModelArtifact;
use super::handle::{ArtifactOrigin, ModelHandle};
use crate::error::ArtifactError;

/// Which strategy decoded an artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactEncoding {
    Bincode,
    Json,
}

/// bincode on-disk layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BinaryArtifact {
    Bare(ModelArtifact),
    Container {
        model: ModelArtifact,
        metadata: BTreeMap<String, String>,
    },
}

/// A decoded artifact, before unwrapping
#[derive(Debug, Clone, PartialEq)]
pub enum LoadedArtifact {
    Bare(ModelArtifact),
    /// Container with a `"model"` entry; `extra_keys` lists its other entries
    Container {
        model: ModelArtifact,
        extra_keys: Vec<String>,
    },
}

impl LoadedArtifact {
    pub fn is_container(&self) -> bool {
        matches!(self, LoadedArtifact::Container { .. })
    }

    pub fn extra_keys(&self) -> &[String] {
        match self {
            LoadedArtifact::Bare(_) => &[],
            LoadedArtifact::Container { extra_keys, .. } => extra_keys,
        }
    }

    pub fn model(&self) -> &ModelArtifact {
        match self {
            LoadedArtifact::Bare(model) | LoadedArtifact::Container { model, .. } => model,
        }
    }

    /// Unwrap the estimator
    pub fn into_model(self) -> ModelArtifact {
        match self {
            LoadedArtifact::Bare(model) | LoadedArtifact::Container { model, .. } => model,
        }
    }
}

impl From<BinaryArtifact> for LoadedArtifact {
    fn from(artifact: BinaryArtifact) -> Self {
        match artifact {
            BinaryArtifact::Bare(model) => LoadedArtifact::Bare(model),
            BinaryArtifact::Container { model, metadata } => LoadedArtifact::Container {
                model,
                extra_keys: metadata.into_keys().collect(),
            },
        }
    }
}

// ============================================================================
// DECODING
// ============================================================================

/// Decode artifact bytes with each strategy in turn
pub fn decode_artifact(bytes: &[u8]) -> Result<(LoadedArtifact, ArtifactEncoding), ArtifactError> {
    let binary_err = match bincode::deserialize::<BinaryArtifact>(bytes) {
        Ok(artifact) => return Ok((artifact.into(), ArtifactEncoding::Bincode)),
        Err(e) => e.to_string(),
    };

    match decode_json(bytes) {
        Ok(artifact) => Ok((artifact, ArtifactEncoding::Json)),
        Err(json_err) => Err(ArtifactError::Decode {
            binary: binary_err,
            json: json_err.to_string(),
        }),
    }
}

fn decode_json(bytes: &[u8]) -> Result<LoadedArtifact, serde_json::Error> {
    let value: serde_json::Value = serde_json::from_slice(bytes)?;

    match value {
        serde_json::Value::Object(mut map) if map.contains_key("model") => {
            let inner = map.remove("model").unwrap_or_default();
            let model = serde_json::from_value(inner)?;
            Ok(LoadedArtifact::Container {
                model,
                extra_keys: map.keys().cloned().collect(),
            })
        }
        other => Ok(LoadedArtifact::Bare(serde_json::from_value(other)?)),
    }
}

/// Read and decode an artifact file
pub fn read_artifact(path: &Path) -> Result<(LoadedArtifact, ArtifactEncoding), ArtifactError> {
    if !path.exists() {
        return Err(ArtifactError::NotFound(path.to_path_buf()));
    }

    let bytes = fs::read(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    decode_artifact(&bytes)
}

/// Load an artifact file into a handle
pub fn load_handle(path: &Path) -> Result<ModelHandle, ArtifactError> {
    let (artifact, encoding) = read_artifact(path)?;
    let unwrapped = artifact.is_container();

    if unwrapped {
        tracing::info!(
            "Model loaded from {} (unwrapped from container, {:?})",
            path.display(),
            encoding
        );
    } else {
        tracing::info!("Model loaded from {} ({:?})", path.display(), encoding);
    }

    let handle = ModelHandle::new(
        artifact.into_model(),
        ArtifactOrigin {
            path: Some(path.to_path_buf()),
            encoding: Some(encoding),
            unwrapped,
        },
    );

    if !handle.capabilities().distribution {
        tracing::warn!(
            "Model at {} has no probability output; responses will have probabilities=null",
            path.display()
        );
    }

    Ok(handle)
}
