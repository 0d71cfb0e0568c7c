//! Core data models for the prediction service

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Which trained model a request targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelSlot {
    /// Regression model predicting average traffic speed
    Speed,
    /// Classification model predicting a congestion category
    Congestion,
}

impl ModelSlot {
    pub const ALL: [ModelSlot; 2] = [ModelSlot::Speed, ModelSlot::Congestion];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelSlot::Speed => "speed",
            ModelSlot::Congestion => "congestion",
        }
    }

    /// Capitalized name used in client-facing messages
    pub fn title(&self) -> &'static str {
        match self {
            ModelSlot::Speed => "Speed",
            ModelSlot::Congestion => "Congestion",
        }
    }

    /// Health registry component name for this slot
    pub fn component(&self) -> &'static str {
        match self {
            ModelSlot::Speed => "speed_model",
            ModelSlot::Congestion => "congestion_model",
        }
    }
}

impl fmt::Display for ModelSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelSlot {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "speed" => Ok(ModelSlot::Speed),
            "congestion" => Ok(ModelSlot::Congestion),
            other => Err(format!("unknown model slot '{}', expected speed or congestion", other)),
        }
    }
}

/// A single loosely-typed value supplied by a client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Bool(bool),
    Number(f64),
    Text(String),
    Null,
    /// Arrays and objects; never usable as a model input
    Nested(serde_json::Value),
}

impl FeatureValue {
    /// Short type name for error messages
    pub fn kind(&self) -> &'static str {
        match self {
            FeatureValue::Bool(_) => "boolean",
            FeatureValue::Number(_) => "number",
            FeatureValue::Text(_) => "string",
            FeatureValue::Null => "null",
            FeatureValue::Nested(serde_json::Value::Array(_)) => "array",
            FeatureValue::Nested(_) => "object",
        }
    }
}

impl From<f64> for FeatureValue {
    fn from(value: f64) -> Self {
        FeatureValue::Number(value)
    }
}

impl From<i64> for FeatureValue {
    fn from(value: i64) -> Self {
        FeatureValue::Number(value as f64)
    }
}

impl From<bool> for FeatureValue {
    fn from(value: bool) -> Self {
        FeatureValue::Bool(value)
    }
}

impl From<&str> for FeatureValue {
    fn from(value: &str) -> Self {
        FeatureValue::Text(value.to_string())
    }
}

impl From<serde_json::Value> for FeatureValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Bool(b) => FeatureValue::Bool(b),
            serde_json::Value::Number(n) => match n.as_f64() {
                Some(v) => FeatureValue::Number(v),
                None => FeatureValue::Nested(serde_json::Value::Number(n)),
            },
            serde_json::Value::String(s) => FeatureValue::Text(s),
            serde_json::Value::Null => FeatureValue::Null,
            other => FeatureValue::Nested(other),
        }
    }
}

/// Open-ended feature name -> value mapping as submitted by a client.
///
/// Key order carries no meaning; alignment against a model schema is by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeaturePayload(HashMap<String, FeatureValue>);

impl FeaturePayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FeatureValue>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&FeatureValue> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<FeatureValue>> FromIterator<(K, V)> for FeaturePayload {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Normalized congestion output: whatever scalar the classifier produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CongestionValue {
    Int(i64),
    Float(f64),
    Label(String),
}

impl fmt::Display for CongestionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CongestionValue::Int(v) => write!(f, "{}", v),
            CongestionValue::Float(v) => write!(f, "{}", v),
            CongestionValue::Label(v) => f.write_str(v),
        }
    }
}

/// Typed prediction, tagged by the slot that produced it
#[derive(Debug, Clone, PartialEq)]
pub enum PredictionResult {
    Speed(f64),
    Congestion(CongestionValue),
}

impl PredictionResult {
    pub fn slot(&self) -> ModelSlot {
        match self {
            PredictionResult::Speed(_) => ModelSlot::Speed,
            PredictionResult::Congestion(_) => ModelSlot::Congestion,
        }
    }
}
