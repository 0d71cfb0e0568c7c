//! Prediction output normalization
//!
//! Models hand back a tensor even for a single-row prediction. These helpers
//! unwrap the first scalar and convert it to the slot's declared result type
//! without rounding, clamping or relabelling.

use crate::error::SchemaMismatch;
use crate::models::{CongestionValue, ModelSlot, PredictionResult};
use tract_onnx::prelude::*;

/// Normalize a raw model output for the given slot
pub fn normalize(slot: ModelSlot, output: &Tensor) -> Result<PredictionResult, SchemaMismatch> {
    match slot {
        ModelSlot::Speed => normalize_speed(output).map(PredictionResult::Speed),
        ModelSlot::Congestion => normalize_congestion(output).map(PredictionResult::Congestion),
    }
}

/// First scalar of a regression output as `f64`
pub fn normalize_speed(output: &Tensor) -> Result<f64, SchemaMismatch> {
    match normalize_congestion(output)? {
        CongestionValue::Int(v) => Ok(v as f64),
        CongestionValue::Float(v) => Ok(v),
        CongestionValue::Label(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| SchemaMismatch::Output(format!("non-numeric regression output {:?}", s)))
            .and_then(finite),
    }
}

/// First scalar of a classification output as a plain int, float or string
pub fn normalize_congestion(output: &Tensor) -> Result<CongestionValue, SchemaMismatch> {
    if output.len() == 0 {
        return Err(SchemaMismatch::Output("model returned an empty tensor".to_string()));
    }

    let datum_type = output.datum_type();
    let value = if datum_type == DatumType::Bool {
        CongestionValue::Int(first::<bool>(output)? as i64)
    } else if datum_type.is_integer() {
        let cast = output.cast_to::<i64>().map_err(output_error)?;
        CongestionValue::Int(first::<i64>(&cast)?)
    } else if datum_type.is_float() {
        let cast = output.cast_to::<f64>().map_err(output_error)?;
        CongestionValue::Float(finite(first::<f64>(&cast)?)?)
    } else if datum_type == DatumType::String {
        CongestionValue::Label(first::<String>(output)?)
    } else {
        return Err(SchemaMismatch::Output(format!(
            "unsupported output type {:?}",
            datum_type
        )));
    };

    Ok(value)
}

fn first<T: Datum + Clone>(tensor: &Tensor) -> Result<T, SchemaMismatch> {
    tensor
        .as_slice::<T>()
        .map_err(output_error)?
        .first()
        .cloned()
        .ok_or_else(|| SchemaMismatch::Output("model returned an empty tensor".to_string()))
}

/// NaN and infinities have no JSON number form
fn finite(value: f64) -> Result<f64, SchemaMismatch> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(SchemaMismatch::Output(format!("non-finite value {}", value)))
    }
}

fn output_error(err: impl std::fmt::Display) -> SchemaMismatch {
    SchemaMismatch::Output(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_congestion_unwraps_int_array() {
        let output = tensor1(&[2i64]);
        assert_eq!(normalize_congestion(&output).unwrap(), CongestionValue::Int(2));
    }

    #[test]
    fn test_congestion_unwraps_narrow_ints() {
        let output = tensor1(&[1i32]);
        assert_eq!(normalize_congestion(&output).unwrap(), CongestionValue::Int(1));

        let output = tensor1(&[true]);
        assert_eq!(normalize_congestion(&output).unwrap(), CongestionValue::Int(1));
    }

    #[test]
    fn test_congestion_keeps_floats_and_labels() {
        let output = tensor2(&[[1.5f32]]);
        assert_eq!(normalize_congestion(&output).unwrap(), CongestionValue::Float(1.5));

        let output: Tensor = tract_ndarray::arr1(&["High".to_string(), "Low".to_string()]).into();
        assert_eq!(
            normalize_congestion(&output).unwrap(),
            CongestionValue::Label("High".to_string())
        );
    }

    #[test]
    fn test_speed_takes_first_scalar_without_clamping() {
        let output = tensor2(&[[-12.5f32], [99.0]]);
        assert_eq!(normalize_speed(&output).unwrap(), -12.5);

        let output = tensor1(&[41i64]);
        assert_eq!(normalize_speed(&output).unwrap(), 41.0);
    }

    #[test]
    fn test_speed_rejects_text() {
        let output: Tensor = tract_ndarray::arr1(&["fast".to_string()]).into();
        assert!(matches!(normalize_speed(&output), Err(SchemaMismatch::Output(_))));
    }

    #[test]
    fn test_non_finite_output_rejected() {
        for value in [f32::INFINITY, f32::NEG_INFINITY, f32::NAN] {
            let output = tensor2(&[[value]]);
            assert!(matches!(normalize_speed(&output), Err(SchemaMismatch::Output(_))));
            assert!(matches!(normalize_congestion(&output), Err(SchemaMismatch::Output(_))));
        }

        let output: Tensor = tract_ndarray::arr1(&["inf".to_string()]).into();
        assert!(matches!(normalize_speed(&output), Err(SchemaMismatch::Output(_))));
    }

    #[test]
    fn test_empty_output_rejected() {
        let output = Tensor::zero::<f32>(&[0]).unwrap();
        assert!(normalize(ModelSlot::Speed, &output).is_err());
        assert!(normalize(ModelSlot::Congestion, &output).is_err());
    }

    #[test]
    fn test_normalize_tags_result_with_slot() {
        let output = tensor1(&[0i64]);
        assert_eq!(
            normalize(ModelSlot::Congestion, &output).unwrap(),
            PredictionResult::Congestion(CongestionValue::Int(0))
        );
    }
}
