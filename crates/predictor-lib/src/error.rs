//! Error taxonomy for artifact loading and request-level prediction

use crate::models::ModelSlot;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal startup failure while loading a model artifact
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("{slot} artifact not found: {}", .path.display())]
    NotFound { slot: ModelSlot, path: PathBuf },

    #[error("failed to read {slot} artifact {}", .path.display())]
    Io {
        slot: ModelSlot,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid {slot} manifest {}", .path.display())]
    InvalidManifest {
        slot: ModelSlot,
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid {slot} feature schema: {reason}")]
    InvalidSchema { slot: ModelSlot, reason: String },

    #[error("artifact for the {declared} model cannot serve the {slot} slot")]
    SlotMismatch { slot: ModelSlot, declared: ModelSlot },

    #[error("{slot} model {} is {size} bytes, limit is {limit}", .path.display())]
    TooLarge {
        slot: ModelSlot,
        path: PathBuf,
        size: u64,
        limit: u64,
    },

    #[error("{slot} model checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch {
        slot: ModelSlot,
        expected: String,
        actual: String,
    },

    #[error("failed to load {slot} model {}: {reason}", .path.display())]
    Model {
        slot: ModelSlot,
        path: PathBuf,
        reason: String,
    },

    #[error("model store is already loaded")]
    AlreadyLoaded,
}

/// Discrepancy between a client payload and a model's schema, or any failure
/// while building the row or running the model on it
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaMismatch {
    #[error("missing required feature(s): {}", .0.join(", "))]
    MissingFeatures(Vec<String>),

    #[error("feature '{feature}' has an unusable value: {reason}")]
    InvalidValue { feature: String, reason: String },

    #[error("prediction failed: {0}")]
    Prediction(String),

    #[error("model output could not be normalized: {0}")]
    Output(String),
}

/// Request-level failure of a single prediction
#[derive(Debug, Error)]
pub enum PredictError {
    #[error("{} model not loaded", .0.title())]
    ModelUnavailable(ModelSlot),

    #[error(transparent)]
    SchemaMismatch(#[from] SchemaMismatch),
}

impl PredictError {
    /// Metric/log label for the failure class
    pub fn kind(&self) -> &'static str {
        match self {
            PredictError::ModelUnavailable(_) => "model_unavailable",
            PredictError::SchemaMismatch(_) => "schema_mismatch",
        }
    }
}
