//! Model Artifact Store
//!
//! This module provides:
//! - The artifact manifest format (ordered feature names + ONNX graph)
//! - Fail-fast loading with checksum and warm-up validation
//! - A set-once store holding both slots for the process lifetime

mod loader;
mod manifest;
mod store;

pub use loader::{compute_checksum, ArtifactLoader, DEFAULT_MAX_MODEL_BYTES};
pub use manifest::ArtifactManifest;
pub use store::{ArtifactPaths, ModelStore};

use crate::models::ModelSlot;
use crate::predictor::{FeatureSchema, InputDtype, Predictor};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// A trained model plus the ordered feature schema it expects.
///
/// Immutable once built; shared read-only by every request.
pub struct ModelArtifact {
    slot: ModelSlot,
    schema: FeatureSchema,
    predictor: Box<dyn Predictor>,
    version: String,
    checksum: String,
    input_dtype: InputDtype,
    class_labels: BTreeMap<String, String>,
    source: Option<PathBuf>,
}

impl ModelArtifact {
    pub fn new(slot: ModelSlot, schema: FeatureSchema, predictor: Box<dyn Predictor>) -> Self {
        Self {
            slot,
            schema,
            predictor,
            version: "unversioned".to_string(),
            checksum: String::new(),
            input_dtype: InputDtype::default(),
            class_labels: BTreeMap::new(),
            source: None,
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_checksum(mut self, checksum: impl Into<String>) -> Self {
        self.checksum = checksum.into();
        self
    }

    pub fn with_input_dtype(mut self, input_dtype: InputDtype) -> Self {
        self.input_dtype = input_dtype;
        self
    }

    pub fn with_class_labels(mut self, class_labels: BTreeMap<String, String>) -> Self {
        self.class_labels = class_labels;
        self
    }

    pub fn with_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn slot(&self) -> ModelSlot {
        self.slot
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Feature names in training order
    pub fn expected_features(&self) -> &[String] {
        self.schema.names()
    }

    pub fn predictor(&self) -> &dyn Predictor {
        self.predictor.as_ref()
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn checksum(&self) -> &str {
        &self.checksum
    }

    pub fn class_labels(&self) -> &BTreeMap<String, String> {
        &self.class_labels
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Serializable description for schema inspection
    pub fn info(&self) -> ArtifactInfo {
        ArtifactInfo {
            slot: self.slot,
            version: self.version.clone(),
            feature_names: self.schema.names().to_vec(),
            checksum: self.checksum.clone(),
            input_dtype: self.input_dtype,
            class_labels: self.class_labels.clone(),
        }
    }
}

impl fmt::Debug for ModelArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelArtifact")
            .field("slot", &self.slot)
            .field("version", &self.version)
            .field("features", &self.schema.len())
            .field("checksum", &self.checksum)
            .field("source", &self.source)
            .finish()
    }
}

/// Schema report for a loaded artifact
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtifactInfo {
    pub slot: ModelSlot,
    pub version: String,
    pub feature_names: Vec<String>,
    pub checksum: String,
    pub input_dtype: InputDtype,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub class_labels: BTreeMap<String, String>,
}
