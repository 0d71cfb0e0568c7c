//! Inference request handling
//!
//! One call = availability check, schema alignment, model invocation and
//! output normalization. Every failure comes back as a `PredictError`; nothing
//! here panics on bad input.

use crate::artifact::{ModelArtifact, ModelStore};
use crate::error::{PredictError, SchemaMismatch};
use crate::models::{FeaturePayload, ModelSlot, PredictionResult};
use crate::observability::{ServiceMetrics, StructuredLogger};
use crate::predictor::normalize;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Turns untyped payloads into typed predictions against the model store
#[derive(Clone)]
pub struct InferenceHandler {
    store: Arc<ModelStore>,
    metrics: ServiceMetrics,
    logger: StructuredLogger,
}

impl InferenceHandler {
    pub fn new(store: Arc<ModelStore>, metrics: ServiceMetrics, logger: StructuredLogger) -> Self {
        Self {
            store,
            metrics,
            logger,
        }
    }

    pub fn store(&self) -> &ModelStore {
        &self.store
    }

    /// Predict for `slot` from a raw client payload
    pub fn predict(
        &self,
        slot: ModelSlot,
        payload: &FeaturePayload,
    ) -> Result<PredictionResult, PredictError> {
        let start = Instant::now();
        let result = self.run(slot, payload);
        let elapsed = start.elapsed();

        match &result {
            Ok(_) => {
                self.metrics.observe_prediction(slot, elapsed.as_secs_f64());
                debug!(slot = %slot, elapsed_us = elapsed.as_micros(), "Prediction served");
            }
            Err(err) => {
                self.metrics.inc_prediction_errors(slot, err.kind());
                self.logger.log_rejection(slot, err.kind(), &err.to_string());
            }
        }

        result
    }

    fn run(&self, slot: ModelSlot, payload: &FeaturePayload) -> Result<PredictionResult, PredictError> {
        let artifact = self
            .store
            .get(slot)
            .ok_or(PredictError::ModelUnavailable(slot))?;

        Ok(predict_with(artifact, payload)?)
    }
}

/// Align, invoke and normalize against a single artifact
pub fn predict_with(
    artifact: &ModelArtifact,
    payload: &FeaturePayload,
) -> Result<PredictionResult, SchemaMismatch> {
    let row = artifact.schema().align(payload)?;

    let output = artifact
        .predictor()
        .predict(&row)
        .map_err(|err| match err.downcast::<SchemaMismatch>() {
            Ok(mismatch) => mismatch,
            Err(other) => SchemaMismatch::Prediction(format!("{:#}", other)),
        })?;

    normalize(artifact.slot(), &output)
}
