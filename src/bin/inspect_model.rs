//! Inspect a model artifact: decoding, container keys, capabilities
//!
//! Usage: `inspect-model [PATH]` (defaults to the configured risk artifact)

use std::path::PathBuf;

use anyhow::Context;

use hospital_predict::config::Config;
use hospital_predict::model::{read_artifact, ArtifactOrigin, ModelHandle};

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let path = match std::env::args().nth(1) {
        Some(arg) => PathBuf::from(arg),
        None => Config::from_env().risk_model_path(),
    };

    let (artifact, encoding) = read_artifact(&path)
        .with_context(|| format!("cannot inspect {}", path.display()))?;

    println!("(decoded with {:?})", encoding);
    println!("Path: {}", path.display());

    if artifact.is_container() {
        println!("Container keys: {}", container_keys(artifact.extra_keys()).join(", "));
    } else {
        println!("Container: no (bare estimator)");
    }

    let unwrapped = artifact.is_container();
    let handle = ModelHandle::new(
        artifact.into_model(),
        ArtifactOrigin {
            path: Some(path.clone()),
            encoding: Some(encoding),
            unwrapped,
        },
    );
    let capabilities = handle.capabilities();

    println!("Type: {}", handle.estimator_type());
    println!("  has label output: true");
    println!("  has probability output: {}", capabilities.distribution);
    println!("  is pipeline: {}", capabilities.pipeline);

    if let Some(classes) = handle.classes() {
        println!("  classes: {:?}", classes);
    }

    match handle.declared_schema() {
        Some(schema) => println!("  declared features ({}): {:?}", schema.len(), schema.names()),
        None => println!("  declared features: none"),
    }

    for stage in handle.stage_schemas() {
        match stage.schema {
            Some(schema) => println!("  stage {} features: {:?}", stage.name, schema.names()),
            None => println!("  stage {}: no declared features", stage.name),
        }
    }

    Ok(())
}

/// `model` first, then whatever else the container carries
fn container_keys(extra: &[String]) -> Vec<&str> {
    std::iter::once("model")
        .chain(extra.iter().map(String::as_str))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_keys_without_extras() {
        assert_eq!(container_keys(&[]).join(", "), "model");
    }

    #[test]
    fn test_container_keys_with_extras() {
        let extra = vec!["trained_at".to_string(), "metrics".to_string()];
        assert_eq!(container_keys(&extra).join(", "), "model, trained_at, metrics");
    }
}
