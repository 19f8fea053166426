//! Model Cache - lazy, per-kind model handles
//!
//! Unloaded -> Loaded happens once, on the first successful load. A failed
//! load leaves the slot empty so the next call reads the artifact again;
//! an artifact that appears at runtime is picked up without a restart.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use once_cell::sync::OnceCell;

use super::artifact::load_handle;
use super::handle::ModelHandle;
use crate::config::Config;
use crate::error::ArtifactError;
use crate::prediction::ModelKind;

struct ModelSlot {
    path: PathBuf,
    cell: OnceCell<ModelHandle>,
    load_attempts: AtomicU64,
}

impl ModelSlot {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            cell: OnceCell::new(),
            load_attempts: AtomicU64::new(0),
        }
    }
}

/// One lazily loaded handle per model kind
pub struct ModelCache {
    risk: ModelSlot,
    claim: ModelSlot,
}

impl ModelCache {
    pub fn new(risk_path: impl Into<PathBuf>, claim_path: impl Into<PathBuf>) -> Self {
        Self {
            risk: ModelSlot::new(risk_path.into()),
            claim: ModelSlot::new(claim_path.into()),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.risk_model_path(), config.claim_model_path())
    }

    fn slot(&self, kind: ModelKind) -> &ModelSlot {
        match kind {
            ModelKind::Risk => &self.risk,
            ModelKind::Claim => &self.claim,
        }
    }

    /// Handle for `kind`, loading it on first use
    ///
    /// Errors are not cached; every call after a failure retries the load.
    pub fn get(&self, kind: ModelKind) -> Result<ModelHandle, ArtifactError> {
        let slot = self.slot(kind);
        slot.cell
            .get_or_try_init(|| {
                slot.load_attempts.fetch_add(1, Ordering::Relaxed);
                load_handle(&slot.path)
            })
            .cloned()
    }

    /// Install a handle directly; returns it back if the slot is already loaded
    pub fn install(&self, kind: ModelKind, handle: ModelHandle) -> Result<(), ModelHandle> {
        self.slot(kind).cell.set(handle)
    }

    /// Loaded without triggering a load
    pub fn is_loaded(&self, kind: ModelKind) -> bool {
        self.slot(kind).cell.get().is_some()
    }

    /// Loaded, or an artifact file is present to load from
    pub fn is_available(&self, kind: ModelKind) -> bool {
        self.is_loaded(kind) || self.slot(kind).path.exists()
    }

    pub fn artifact_path(&self, kind: ModelKind) -> &Path {
        &self.slot(kind).path
    }

    /// Number of times the artifact was read for `kind`
    pub fn load_attempts(&self, kind: ModelKind) -> u64 {
        self.slot(kind).load_attempts.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::estimators::{ModelArtifact, NearestCentroid};

    fn centroid_json() -> String {
        serde_json::to_string(&ModelArtifact::NearestCentroid(NearestCentroid {
            classes: vec!["Paid".into(), "Pending".into()],
            centroids: vec![vec![0.0], vec![1.0]],
            feature_names_in: None,
        }))
        .unwrap()
    }

    #[test]
    fn test_missing_artifact_is_retried_every_call() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ModelCache::new(dir.path().join("risk.bin"), dir.path().join("claim.bin"));

        for _ in 0..3 {
            assert!(matches!(cache.get(ModelKind::Risk), Err(ArtifactError::NotFound(_))));
        }

        assert_eq!(cache.load_attempts(ModelKind::Risk), 3);
        assert!(!cache.is_loaded(ModelKind::Risk));
        assert!(!cache.is_available(ModelKind::Risk));
    }

    #[test]
    fn test_artifact_appearing_later_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let claim_path = dir.path().join("claim.json");
        let cache = ModelCache::new(dir.path().join("risk.bin"), &claim_path);

        assert!(cache.get(ModelKind::Claim).is_err());

        std::fs::write(&claim_path, centroid_json()).unwrap();

        assert!(cache.get(ModelKind::Claim).is_ok());
        assert!(cache.is_loaded(ModelKind::Claim));
    }

    #[test]
    fn test_success_is_memoized() {
        let dir = tempfile::tempdir().unwrap();
        let claim_path = dir.path().join("claim.json");
        std::fs::write(&claim_path, centroid_json()).unwrap();
        let cache = ModelCache::new(dir.path().join("risk.bin"), &claim_path);

        let first = cache.get(ModelKind::Claim).unwrap();
        std::fs::remove_file(&claim_path).unwrap();
        let second = cache.get(ModelKind::Claim).unwrap();

        assert!(first.ptr_eq(&second));
        assert_eq!(cache.load_attempts(ModelKind::Claim), 1);
        assert!(!cache.is_loaded(ModelKind::Risk));
    }

    #[test]
    fn test_concurrent_first_use_shares_one_handle() {
        let dir = tempfile::tempdir().unwrap();
        let claim_path = dir.path().join("claim.json");
        std::fs::write(&claim_path, centroid_json()).unwrap();
        let cache = ModelCache::new(dir.path().join("risk.bin"), &claim_path);

        let handles: Vec<ModelHandle> = std::thread::scope(|s| {
            let workers: Vec<_> = (0..8)
                .map(|_| s.spawn(|| cache.get(ModelKind::Claim).unwrap()))
                .collect();
            workers.into_iter().map(|w| w.join().unwrap()).collect()
        });

        assert!(handles.windows(2).all(|w| w[0].ptr_eq(&w[1])));
    }

    #[test]
    fn test_install_fills_empty_slot_only() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ModelCache::new(dir.path().join("risk.bin"), dir.path().join("claim.bin"));
        let model = NearestCentroid {
            classes: vec!["Low".into()],
            centroids: vec![vec![0.0]],
            feature_names_in: None,
        };

        assert!(cache.install(ModelKind::Risk, ModelHandle::from_scorable(model.clone())).is_ok());
        assert!(cache.install(ModelKind::Risk, ModelHandle::from_scorable(model)).is_err());
        assert!(cache.get(ModelKind::Risk).is_ok());
        assert_eq!(cache.load_attempts(ModelKind::Risk), 0);
    }
}
