//! ML prediction engine

mod features;
mod inference;
mod output;

pub use features::{numeric_value, FeatureRow, FeatureSchema};
pub use inference::{InputDtype, OnnxPredictor};
pub use output::{normalize, normalize_congestion, normalize_speed};

use anyhow::Result;
use tract_onnx::prelude::Tensor;

/// Trait for prediction implementations.
///
/// Implementations must be pure with respect to the row: no internal state
/// changes, so one instance can serve concurrent requests.
pub trait Predictor: Send + Sync {
    /// Run the model on a single aligned row, returning its raw first output
    fn predict(&self, row: &FeatureRow) -> Result<Tensor>;

    /// Run the model once on an all-zero row to validate it end to end
    fn warm_up(&self) -> Result<Tensor>;
}
