//! Artifact manifest: the JSON sidecar that ties an ONNX graph to the
//! ordered feature list it was trained on

use crate::models::ModelSlot;
use crate::predictor::InputDtype;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

fn default_version() -> String {
    "unversioned".to_string()
}

/// Manifest describing one trained model artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactManifest {
    /// Slot the model was trained for, checked against the slot it is loaded into
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot: Option<ModelSlot>,

    #[serde(default = "default_version")]
    pub version: String,

    /// ONNX graph, relative to the manifest's directory unless absolute
    pub model_file: PathBuf,

    /// Training column order
    pub feature_names: Vec<String>,

    /// Hex SHA-256 of `model_file`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,

    #[serde(default)]
    pub input_dtype: InputDtype,

    /// Category code -> label, informational only
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub class_labels: BTreeMap<String, String>,
}

impl ArtifactManifest {
    pub fn from_slice(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }

    /// Resolve `model_file` against the manifest location
    pub fn model_path(&self, manifest_path: &Path) -> PathBuf {
        if self.model_file.is_absolute() {
            return self.model_file.clone();
        }
        manifest_path
            .parent()
            .map(|dir| dir.join(&self.model_file))
            .unwrap_or_else(|| self.model_file.clone())
    }
}
