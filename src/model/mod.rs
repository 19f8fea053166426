//! Model Module - artifact loading, capability adapter, schema resolution
//!
//! Trained artifacts are opaque to the rest of the service: everything goes
//! through `ModelHandle`, built once per kind by `ModelCache`.

pub mod artifact;
pub mod cache;
pub mod estimator;
pub mod estimators;
pub mod handle;
pub mod schema;

// Re-export common types
pub use artifact::{decode_artifact, load_handle, read_artifact, ArtifactEncoding, BinaryArtifact, LoadedArtifact};
pub use cache::ModelCache;
pub use estimator::{Capabilities, ClassDistribution, LabelValue, RawLabel, Scorable, StageSchema};
pub use estimators::ModelArtifact;
pub use handle::{ArtifactOrigin, ModelHandle};
pub use schema::{resolve, FeatureSchemaDocument, ResolvedSchema, SchemaDocumentCache, SchemaSource};
