//! Core library for the traffic prediction service
//!
//! This crate provides:
//! - The model artifact store (manifest + ONNX graph per slot)
//! - Feature alignment and ONNX inference
//! - The inference request handler
//! - Health checks and observability

pub mod artifact;
pub mod error;
pub mod handler;
pub mod health;
pub mod models;
pub mod observability;
pub mod predictor;

pub use artifact::{ArtifactLoader, ArtifactPaths, ModelArtifact, ModelStore};
pub use error::{ArtifactError, PredictError, SchemaMismatch};
pub use handler::InferenceHandler;
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{ServiceMetrics, StructuredLogger};
