//! Set-once store for the two model slots
//!
//! The store starts empty and transitions to loaded exactly once. Reads after
//! that are lock-free; there is no writer left to contend with.

use super::{ArtifactLoader, ModelArtifact};
use crate::error::ArtifactError;
use crate::models::ModelSlot;
use std::path::PathBuf;
use std::sync::OnceLock;
use tracing::info;

/// Artifact locations, one manifest per slot
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    pub speed: PathBuf,
    pub congestion: PathBuf,
}

struct LoadedModels {
    speed: ModelArtifact,
    congestion: ModelArtifact,
}

/// Process-lifetime holder for both model artifacts
#[derive(Default)]
pub struct ModelStore {
    models: OnceLock<LoadedModels>,
}

impl ModelStore {
    /// Create an empty store; every slot reports unavailable until loaded
    pub fn new() -> Self {
        Self::default()
    }

    /// Load both artifacts, installing them only if both succeed
    pub fn load(&self, paths: &ArtifactPaths, loader: &ArtifactLoader) -> Result<(), ArtifactError> {
        if self.is_ready() {
            return Err(ArtifactError::AlreadyLoaded);
        }

        let speed = loader.load(ModelSlot::Speed, &paths.speed)?;
        let congestion = loader.load(ModelSlot::Congestion, &paths.congestion)?;
        self.install(speed, congestion)
    }

    /// Install already-built artifacts
    pub fn install(&self, speed: ModelArtifact, congestion: ModelArtifact) -> Result<(), ArtifactError> {
        for (slot, artifact) in [(ModelSlot::Speed, &speed), (ModelSlot::Congestion, &congestion)] {
            if artifact.slot() != slot {
                return Err(ArtifactError::SlotMismatch {
                    slot,
                    declared: artifact.slot(),
                });
            }
        }

        self.models
            .set(LoadedModels { speed, congestion })
            .map_err(|_| ArtifactError::AlreadyLoaded)?;

        info!(event = "models_ready", "Both model artifacts loaded");
        Ok(())
    }

    /// Artifact for a slot, or `None` while the store is not loaded
    pub fn get(&self, slot: ModelSlot) -> Option<&ModelArtifact> {
        self.models.get().map(|models| match slot {
            ModelSlot::Speed => &models.speed,
            ModelSlot::Congestion => &models.congestion,
        })
    }

    pub fn is_ready(&self) -> bool {
        self.models.get().is_some()
    }
}
