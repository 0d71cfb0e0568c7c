//! Feature alignment for ML inference
//!
//! Turns an unordered client payload into a row laid out exactly as the
//! model's training schema. Alignment is by name: extra payload keys are
//! ignored, missing schema names are reported, never defaulted.

use crate::error::SchemaMismatch;
use crate::models::{FeaturePayload, FeatureValue};
use std::collections::HashSet;

/// Ordered feature names a model was trained on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSchema {
    names: Vec<String>,
}

impl FeatureSchema {
    /// Build a schema, rejecting empty, blank or duplicated names
    pub fn new(names: Vec<String>) -> Result<Self, String> {
        if names.is_empty() {
            return Err("feature list is empty".to_string());
        }

        let mut seen = HashSet::with_capacity(names.len());
        for name in &names {
            if name.trim().is_empty() {
                return Err("feature list contains a blank name".to_string());
            }
            if !seen.insert(name.as_str()) {
                return Err(format!("feature '{}' is listed more than once", name));
            }
        }

        Ok(Self { names })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Select payload values in schema order
    pub fn align(&self, payload: &FeaturePayload) -> Result<FeatureRow, SchemaMismatch> {
        let missing: Vec<String> = self
            .names
            .iter()
            .filter(|name| !payload.contains(name))
            .cloned()
            .collect();

        if !missing.is_empty() {
            return Err(SchemaMismatch::MissingFeatures(missing));
        }

        let entries = self
            .names
            .iter()
            .filter_map(|name| payload.get(name).map(|v| (name.clone(), v.clone())))
            .collect();

        Ok(FeatureRow { entries })
    }
}

/// A single observation laid out in schema order
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    entries: Vec<(String, FeatureValue)>,
}

impl FeatureRow {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &FeatureValue> {
        self.entries.iter().map(|(_, value)| value)
    }

    pub fn get(&self, name: &str) -> Option<&FeatureValue> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value)
    }

    /// Numeric view of the row, in order
    pub fn to_numeric(&self) -> Result<Vec<f64>, SchemaMismatch> {
        self.entries
            .iter()
            .map(|(name, value)| {
                numeric_value(value).map_err(|reason| SchemaMismatch::InvalidValue {
                    feature: name.clone(),
                    reason,
                })
            })
            .collect()
    }
}

/// Coerce a client value to a finite number.
///
/// Booleans map to 1/0 (one-hot columns); strings must parse after trimming.
pub fn numeric_value(value: &FeatureValue) -> Result<f64, String> {
    let number = match value {
        FeatureValue::Number(v) => *v,
        FeatureValue::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        FeatureValue::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("could not convert string to number: {:?}", s))?,
        other => return Err(format!("expected a number, got {}", other.kind())),
    };

    if !number.is_finite() {
        return Err(format!("value {} is not finite", number));
    }
    Ok(number)
}
