//! ONNX inference using tract
//!
//! Runs exported tabular models (sklearn via skl2onnx) on a single aligned
//! row. The optimized plan is immutable after loading, so concurrent calls
//! share it without locking.

use super::features::FeatureRow;
use super::Predictor;
use crate::error::SchemaMismatch;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tract_onnx::prelude::*;
use tracing::{debug, warn};

/// Maximum inference latency before warning
const MAX_INFERENCE_MS: u128 = 5;

type TractModel = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// Element type of the model's `[1, N]` input tensor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputDtype {
    #[default]
    Float32,
    Float64,
}

/// ONNX-based predictor using tract for lightweight inference
pub struct OnnxPredictor {
    model: TractModel,
    num_features: usize,
    input_dtype: InputDtype,
}

impl std::fmt::Debug for OnnxPredictor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxPredictor")
            .field("num_features", &self.num_features)
            .field("input_dtype", &self.input_dtype)
            .finish()
    }
}

impl OnnxPredictor {
    /// Create a new predictor from model bytes
    pub fn new(model_bytes: &[u8], num_features: usize, input_dtype: InputDtype) -> Result<Self> {
        let model = Self::load_model(model_bytes, num_features, input_dtype)?;
        Ok(Self {
            model,
            num_features,
            input_dtype,
        })
    }

    /// Load and optimize an ONNX model from bytes
    fn load_model(
        model_bytes: &[u8],
        num_features: usize,
        input_dtype: InputDtype,
    ) -> Result<TractModel> {
        let input_fact: InferenceFact = match input_dtype {
            InputDtype::Float32 => f32::fact([1, num_features]).into(),
            InputDtype::Float64 => f64::fact([1, num_features]).into(),
        };

        let model = tract_onnx::onnx()
            .model_for_read(&mut std::io::Cursor::new(model_bytes))
            .context("Failed to parse ONNX model")?
            .with_input_fact(0, input_fact)
            .context("Failed to set input shape")?
            .into_optimized()
            .context("Failed to optimize model")?
            .into_runnable()
            .context("Failed to create runnable model")?;
        Ok(model)
    }

    pub fn num_features(&self) -> usize {
        self.num_features
    }

    pub fn input_dtype(&self) -> InputDtype {
        self.input_dtype
    }

    /// Convert an aligned row to the model's input tensor
    fn row_to_tensor(&self, row: &FeatureRow) -> Result<Tensor> {
        if row.len() != self.num_features {
            anyhow::bail!(
                "Row has {} features, model expects {}",
                row.len(),
                self.num_features
            );
        }

        // A SchemaMismatch here is recovered by the handler via downcast
        let values = row.to_numeric()?;
        self.check_input_range(row, &values)?;
        self.values_to_tensor(values)
    }

    /// Reject values that stop being finite once narrowed to the input dtype
    fn check_input_range(&self, row: &FeatureRow, values: &[f64]) -> Result<(), SchemaMismatch> {
        if self.input_dtype != InputDtype::Float32 {
            return Ok(());
        }
        match row
            .names()
            .zip(values)
            .find(|(_, v)| !(**v as f32).is_finite())
        {
            Some((name, value)) => Err(SchemaMismatch::InvalidValue {
                feature: name.to_string(),
                reason: format!("{} is out of range for float32 input", value),
            }),
            None => Ok(()),
        }
    }

    fn values_to_tensor(&self, values: Vec<f64>) -> Result<Tensor> {
        let shape = (1, self.num_features);
        let tensor = match self.input_dtype {
            InputDtype::Float32 => {
                let data: Vec<f32> = values.into_iter().map(|v| v as f32).collect();
                tract_ndarray::Array2::from_shape_vec(shape, data)?.into()
            }
            InputDtype::Float64 => tract_ndarray::Array2::from_shape_vec(shape, values)?.into(),
        };
        Ok(tensor)
    }

    fn run(&self, input: Tensor) -> Result<Tensor> {
        let start = Instant::now();

        let outputs = self.model.run(tvec!(input.into()))?;
        let output = outputs
            .into_iter()
            .next()
            .context("No output from model")?
            .into_tensor();

        let elapsed = start.elapsed();
        if elapsed.as_millis() > MAX_INFERENCE_MS {
            warn!(elapsed_ms = elapsed.as_millis(), "Inference exceeded {}ms target", MAX_INFERENCE_MS);
        } else {
            debug!(elapsed_us = elapsed.as_micros(), "Inference completed");
        }

        Ok(output)
    }
}

impl Predictor for OnnxPredictor {
    fn predict(&self, row: &FeatureRow) -> Result<Tensor> {
        let input = self.row_to_tensor(row)?;
        self.run(input)
    }

    fn warm_up(&self) -> Result<Tensor> {
        let input = self.values_to_tensor(vec![0.0; self.num_features])?;
        self.run(input).context("Warm-up inference failed")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SchemaMismatch;
    use crate::models::FeaturePayload;
    use crate::predictor::FeatureSchema;
    use std::path::PathBuf;

    fn fixture(name: &str) -> Vec<u8> {
        let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests/fixtures")
            .join(name);
        std::fs::read(path).unwrap()
    }

    fn speed_schema() -> FeatureSchema {
        FeatureSchema::new(vec![
            "Traffic Volume".into(),
            "Incident Reports".into(),
            "Weather Conditions_Rain".into(),
        ])
        .unwrap()
    }

    #[test]
    fn test_rejects_garbage_bytes() {
        assert!(OnnxPredictor::new(b"not an onnx model", 3, InputDtype::Float32).is_err());
    }

    #[test]
    fn test_linear_model_prediction() {
        let predictor =
            OnnxPredictor::new(&fixture("speed_model.onnx"), 3, InputDtype::Float32).unwrap();
        let payload: FeaturePayload = [
            ("Traffic Volume", 800.0),
            ("Incident Reports", 2.0),
            ("Weather Conditions_Rain", 1.0),
        ]
        .into_iter()
        .collect();
        let row = speed_schema().align(&payload).unwrap();

        let output = predictor.predict(&row).unwrap();
        let values = output.as_slice::<f32>().unwrap();
        // 800 * 0.0625 - 2 * 1.5 - 4 + 40
        assert!((values[0] - 83.0).abs() < 1e-4, "got {}", values[0]);
    }

    #[test]
    fn test_warm_up_runs_zero_row() {
        let predictor =
            OnnxPredictor::new(&fixture("speed_model.onnx"), 3, InputDtype::Float32).unwrap();
        let output = predictor.warm_up().unwrap();
        assert!((output.as_slice::<f32>().unwrap()[0] - 40.0).abs() < 1e-6);
    }

    #[test]
    fn test_wrong_feature_count_fails_to_load_or_run() {
        let loaded = OnnxPredictor::new(&fixture("speed_model.onnx"), 5, InputDtype::Float32);
        if let Ok(predictor) = loaded {
            assert!(predictor.warm_up().is_err());
        }
    }

    #[test]
    fn test_non_numeric_value_surfaces_schema_mismatch() {
        let predictor =
            OnnxPredictor::new(&fixture("speed_model.onnx"), 3, InputDtype::Float32).unwrap();
        let mut payload = FeaturePayload::new();
        payload.insert("Traffic Volume", "lots");
        payload.insert("Incident Reports", 2.0);
        payload.insert("Weather Conditions_Rain", false);
        let row = speed_schema().align(&payload).unwrap();

        let err = predictor.predict(&row).unwrap_err();
        let mismatch = err.downcast::<SchemaMismatch>().unwrap();
        assert!(matches!(mismatch, SchemaMismatch::InvalidValue { ref feature, .. } if feature == "Traffic Volume"));
    }

    #[test]
    fn test_value_beyond_f32_range_is_invalid() {
        let predictor =
            OnnxPredictor::new(&fixture("speed_model.onnx"), 3, InputDtype::Float32).unwrap();
        let payload: FeaturePayload = [
            ("Traffic Volume", 1e39),
            ("Incident Reports", 2.0),
            ("Weather Conditions_Rain", -1e39),
        ]
        .into_iter()
        .collect();
        let row = speed_schema().align(&payload).unwrap();

        let err = predictor.predict(&row).unwrap_err();
        match err.downcast::<SchemaMismatch>().unwrap() {
            SchemaMismatch::InvalidValue { feature, reason } => {
                // First offender in schema order
                assert_eq!(feature, "Traffic Volume");
                assert!(reason.contains("float32"), "{}", reason);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_large_finite_f32_value_is_accepted() {
        let predictor =
            OnnxPredictor::new(&fixture("speed_model.onnx"), 3, InputDtype::Float32).unwrap();
        let payload: FeaturePayload = [
            ("Traffic Volume", 3.0e38),
            ("Incident Reports", 0.0),
            ("Weather Conditions_Rain", 0.0),
        ]
        .into_iter()
        .collect();
        let row = speed_schema().align(&payload).unwrap();

        assert!(predictor.predict(&row).is_ok());
    }
}
