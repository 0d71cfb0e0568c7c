//! Artifact loading with validation
//!
//! Every check runs at startup so a bad artifact stops the process before it
//! can serve traffic:
//! - manifest and model file must exist and parse
//! - feature schema must be non-empty and unique
//! - size limit and checksum validation
//! - a warm-up prediction must produce an output the slot can normalize

use super::manifest::ArtifactManifest;
use super::ModelArtifact;
use crate::error::ArtifactError;
use crate::models::ModelSlot;
use crate::predictor::{normalize, FeatureSchema, OnnxPredictor, Predictor};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Default upper bound on a model file
pub const DEFAULT_MAX_MODEL_BYTES: u64 = 256 * 1024 * 1024;

/// Loads a manifest + ONNX pair into a ready-to-serve artifact
#[derive(Debug, Clone)]
pub struct ArtifactLoader {
    max_model_bytes: u64,
}

impl Default for ArtifactLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ArtifactLoader {
    pub fn new() -> Self {
        Self {
            max_model_bytes: DEFAULT_MAX_MODEL_BYTES,
        }
    }

    pub fn with_max_model_bytes(max_model_bytes: u64) -> Self {
        Self { max_model_bytes }
    }

    /// Load the artifact whose manifest lives at `manifest_path`
    pub fn load(&self, slot: ModelSlot, manifest_path: &Path) -> Result<ModelArtifact, ArtifactError> {
        info!(slot = %slot, path = %manifest_path.display(), "Loading model artifact");

        let manifest = self.read_manifest(slot, manifest_path)?;

        if let Some(declared) = manifest.slot {
            if declared != slot {
                return Err(ArtifactError::SlotMismatch { slot, declared });
            }
        }

        let schema = FeatureSchema::new(manifest.feature_names.clone())
            .map_err(|reason| ArtifactError::InvalidSchema { slot, reason })?;

        let model_path = manifest.model_path(manifest_path);
        let model_bytes = self.read_model(slot, &model_path)?;

        let checksum = compute_checksum(&model_bytes);
        if let Some(expected) = &manifest.sha256 {
            if !expected.trim().eq_ignore_ascii_case(&checksum) {
                return Err(ArtifactError::ChecksumMismatch {
                    slot,
                    expected: expected.clone(),
                    actual: checksum,
                });
            }
            debug!(slot = %slot, checksum = %checksum, "Model checksum validated");
        }

        let model_error = |reason: String| ArtifactError::Model {
            slot,
            path: model_path.clone(),
            reason,
        };

        let predictor = OnnxPredictor::new(&model_bytes, schema.len(), manifest.input_dtype)
            .map_err(|e| model_error(format!("{:#}", e)))?;

        let warm_up = predictor
            .warm_up()
            .map_err(|e| model_error(format!("{:#}", e)))?;
        normalize(slot, &warm_up).map_err(|e| model_error(e.to_string()))?;

        info!(
            event = "model_loaded",
            slot = %slot,
            version = %manifest.version,
            features = schema.len(),
            checksum = %checksum,
            path = %model_path.display(),
            "Model artifact loaded"
        );

        Ok(ModelArtifact::new(slot, schema, Box::new(predictor))
            .with_version(manifest.version)
            .with_checksum(checksum)
            .with_input_dtype(manifest.input_dtype)
            .with_class_labels(manifest.class_labels)
            .with_source(model_path))
    }

    fn read_manifest(&self, slot: ModelSlot, path: &Path) -> Result<ArtifactManifest, ArtifactError> {
        if !path.exists() {
            return Err(ArtifactError::NotFound {
                slot,
                path: path.to_path_buf(),
            });
        }

        let bytes = fs::read(path).map_err(|source| ArtifactError::Io {
            slot,
            path: path.to_path_buf(),
            source,
        })?;

        ArtifactManifest::from_slice(&bytes).map_err(|source| ArtifactError::InvalidManifest {
            slot,
            path: path.to_path_buf(),
            source,
        })
    }

    fn read_model(&self, slot: ModelSlot, path: &Path) -> Result<Vec<u8>, ArtifactError> {
        if !path.exists() {
            return Err(ArtifactError::NotFound {
                slot,
                path: path.to_path_buf(),
            });
        }

        let io_error = |source| ArtifactError::Io {
            slot,
            path: path.to_path_buf(),
            source,
        };

        let size = fs::metadata(path).map_err(io_error)?.len();
        if size > self.max_model_bytes {
            return Err(ArtifactError::TooLarge {
                slot,
                path: path.to_path_buf(),
                size,
                limit: self.max_model_bytes,
            });
        }

        fs::read(path).map_err(io_error)
    }
}

/// Compute SHA256 checksum of data
pub fn compute_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn fixtures() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
    }

    /// Copy a fixture model into `dir` and write a manifest for it
    fn write_artifact(dir: &TempDir, model: &str, manifest: serde_json::Value) -> PathBuf {
        fs::copy(fixtures().join(model), dir.path().join(model)).unwrap();
        let path = dir.path().join("manifest.json");
        fs::write(&path, serde_json::to_vec(&manifest).unwrap()).unwrap();
        path
    }

    #[test]
    fn test_compute_checksum() {
        let checksum = compute_checksum(b"test model weights");
        assert_eq!(checksum.len(), 64);
        assert_eq!(checksum, compute_checksum(b"test model weights"));
    }

    #[test]
    fn test_load_fixture_artifacts() {
        let loader = ArtifactLoader::new();

        let speed = loader
            .load(ModelSlot::Speed, &fixtures().join("speed_model.json"))
            .unwrap();
        assert_eq!(speed.slot(), ModelSlot::Speed);
        assert_eq!(speed.version(), "fixture-1");
        assert_eq!(
            speed.expected_features(),
            ["Traffic Volume", "Incident Reports", "Weather Conditions_Rain"]
        );

        let congestion = loader
            .load(ModelSlot::Congestion, &fixtures().join("congestion_model.json"))
            .unwrap();
        assert_eq!(congestion.class_labels().get("2").map(String::as_str), Some("High"));
    }

    #[test]
    fn test_missing_manifest_is_not_found() {
        let dir = TempDir::new().unwrap();
        let err = ArtifactLoader::new()
            .load(ModelSlot::Speed, &dir.path().join("absent.json"))
            .unwrap_err();
        assert!(matches!(err, ArtifactError::NotFound { slot: ModelSlot::Speed, .. }));
    }

    #[test]
    fn test_missing_model_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("manifest.json");
        fs::write(&path, br#"{"model_file": "gone.onnx", "feature_names": ["a"]}"#).unwrap();

        let err = ArtifactLoader::new().load(ModelSlot::Speed, &path).unwrap_err();
        match err {
            ArtifactError::NotFound { path, .. } => assert!(path.ends_with("gone.onnx")),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_corrupt_manifest_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("manifest.json");
        fs::write(&path, b"{not json").unwrap();

        let err = ArtifactLoader::new().load(ModelSlot::Speed, &path).unwrap_err();
        assert!(matches!(err, ArtifactError::InvalidManifest { .. }));
    }

    #[test]
    fn test_corrupt_model_rejected() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("bad.onnx"), b"definitely not protobuf").unwrap();
        let path = dir.path().join("manifest.json");
        fs::write(&path, br#"{"model_file": "bad.onnx", "feature_names": ["a"]}"#).unwrap();

        let err = ArtifactLoader::new().load(ModelSlot::Speed, &path).unwrap_err();
        assert!(matches!(err, ArtifactError::Model { .. }));
    }

    #[test]
    fn test_duplicate_features_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_artifact(
            &dir,
            "speed_model.onnx",
            serde_json::json!({
                "model_file": "speed_model.onnx",
                "feature_names": ["a", "b", "a"]
            }),
        );

        let err = ArtifactLoader::new().load(ModelSlot::Speed, &path).unwrap_err();
        assert!(matches!(err, ArtifactError::InvalidSchema { .. }));
    }

    #[test]
    fn test_checksum_mismatch_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_artifact(
            &dir,
            "speed_model.onnx",
            serde_json::json!({
                "model_file": "speed_model.onnx",
                "feature_names": ["a", "b", "c"],
                "sha256": "00".repeat(32)
            }),
        );

        let err = ArtifactLoader::new().load(ModelSlot::Speed, &path).unwrap_err();
        assert!(matches!(err, ArtifactError::ChecksumMismatch { .. }));
    }

    #[test]
    fn test_slot_mismatch_rejected() {
        let err = ArtifactLoader::new()
            .load(ModelSlot::Congestion, &fixtures().join("speed_model.json"))
            .unwrap_err();
        assert!(matches!(
            err,
            ArtifactError::SlotMismatch {
                slot: ModelSlot::Congestion,
                declared: ModelSlot::Speed
            }
        ));
    }

    #[test]
    fn test_size_limit_enforced() {
        let err = ArtifactLoader::with_max_model_bytes(16)
            .load(ModelSlot::Speed, &fixtures().join("speed_model.json"))
            .unwrap_err();
        assert!(matches!(err, ArtifactError::TooLarge { limit: 16, .. }));
    }

    #[test]
    fn test_schema_width_must_match_model() {
        let dir = TempDir::new().unwrap();
        let path = write_artifact(
            &dir,
            "speed_model.onnx",
            serde_json::json!({
                "model_file": "speed_model.onnx",
                "feature_names": ["a", "b"]
            }),
        );

        let err = ArtifactLoader::new().load(ModelSlot::Speed, &path).unwrap_err();
        assert!(matches!(err, ArtifactError::Model { .. }));
    }
}
