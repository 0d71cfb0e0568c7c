//! Observability infrastructure for the prediction service
//!
//! Provides:
//! - Prometheus metrics (prediction latency, request and error counts, loaded model info)
//! - Structured JSON logging with tracing

use crate::models::ModelSlot;
use prometheus::{
    register_gauge_vec, register_histogram_vec, register_int_counter_vec, register_int_gauge,
    Encoder, GaugeVec, HistogramVec, IntCounterVec, IntGauge, TextEncoder,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Default histogram buckets for latency measurements (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<ServiceMetricsInner> = OnceLock::new();

struct ServiceMetricsInner {
    prediction_latency_seconds: HistogramVec,
    predictions_total: IntCounterVec,
    prediction_errors_total: IntCounterVec,
    models_loaded: IntGauge,
    model_info: GaugeVec,
}

impl ServiceMetricsInner {
    fn new() -> Self {
        Self {
            prediction_latency_seconds: register_histogram_vec!(
                "traffic_predictor_prediction_latency_seconds",
                "Time spent aligning features and running inference",
                &["slot"],
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register prediction_latency_seconds"),

            predictions_total: register_int_counter_vec!(
                "traffic_predictor_predictions_total",
                "Total number of predictions served",
                &["slot"]
            )
            .expect("Failed to register predictions_total"),

            prediction_errors_total: register_int_counter_vec!(
                "traffic_predictor_prediction_errors_total",
                "Total number of rejected prediction requests",
                &["slot", "kind"]
            )
            .expect("Failed to register prediction_errors_total"),

            models_loaded: register_int_gauge!(
                "traffic_predictor_models_loaded",
                "Number of model slots holding a loaded artifact"
            )
            .expect("Failed to register models_loaded"),

            model_info: register_gauge_vec!(
                "traffic_predictor_model_info",
                "Information about the loaded model artifacts",
                &["slot", "version", "checksum"]
            )
            .expect("Failed to register model_info"),
        }
    }
}

/// Service metrics for Prometheus exposition
///
/// Lightweight handle to the global metrics instance; clones share the
/// same underlying metrics.
#[derive(Clone)]
pub struct ServiceMetrics {
    _private: (),
}

impl Default for ServiceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(ServiceMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &ServiceMetricsInner {
        GLOBAL_METRICS.get_or_init(ServiceMetricsInner::new)
    }

    /// Record a served prediction and its latency
    pub fn observe_prediction(&self, slot: ModelSlot, duration_secs: f64) {
        let inner = self.inner();
        inner
            .prediction_latency_seconds
            .with_label_values(&[slot.as_str()])
            .observe(duration_secs);
        inner
            .predictions_total
            .with_label_values(&[slot.as_str()])
            .inc();
    }

    /// Increment the rejection counter for a slot and error kind
    pub fn inc_prediction_errors(&self, slot: ModelSlot, kind: &str) {
        self.inner()
            .prediction_errors_total
            .with_label_values(&[slot.as_str(), kind])
            .inc();
    }

    pub fn set_models_loaded(&self, count: i64) {
        self.inner().models_loaded.set(count);
    }

    /// Publish the version and checksum of the artifact loaded into `slot`
    pub fn set_model_info(&self, slot: ModelSlot, version: &str, checksum: &str) {
        self.inner()
            .model_info
            .with_label_values(&[slot.as_str(), version, checksum])
            .set(1.0);
    }

    pub fn predictions_served(&self, slot: ModelSlot) -> u64 {
        self.inner()
            .predictions_total
            .with_label_values(&[slot.as_str()])
            .get()
    }

    pub fn prediction_errors(&self, slot: ModelSlot, kind: &str) -> u64 {
        self.inner()
            .prediction_errors_total
            .with_label_values(&[slot.as_str(), kind])
            .get()
    }
}

/// Encode the default registry in the Prometheus text format
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&prometheus::gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}

/// Structured logger for service events
///
/// Keeps the `event` field and its companions consistent across the
/// lifecycle and request paths.
#[derive(Clone)]
pub struct StructuredLogger {
    service_name: String,
}

impl StructuredLogger {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
        }
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Log service startup
    pub fn log_startup(&self, version: &str, addr: &str) {
        info!(
            event = "service_started",
            service = %self.service_name,
            service_version = %version,
            addr = %addr,
            "Traffic prediction service started"
        );
    }

    /// Log service shutdown
    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "service_shutdown",
            service = %self.service_name,
            reason = %reason,
            "Traffic prediction service shutting down"
        );
    }

    /// Log a rejected prediction request
    pub fn log_rejection(&self, slot: ModelSlot, kind: &str, detail: &str) {
        match kind {
            "model_unavailable" => {
                warn!(
                    event = "prediction_rejected",
                    service = %self.service_name,
                    slot = %slot,
                    kind = %kind,
                    detail = %detail,
                    "Prediction requested before models were loaded"
                );
            }
            _ => {
                info!(
                    event = "prediction_rejected",
                    service = %self.service_name,
                    slot = %slot,
                    kind = %kind,
                    detail = %detail,
                    "Prediction input rejected"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_metrics_creation() {
        let metrics = ServiceMetrics::new();

        metrics.observe_prediction(ModelSlot::Speed, 0.002);
        metrics.inc_prediction_errors(ModelSlot::Congestion, "schema_mismatch");
        metrics.set_models_loaded(2);
        metrics.set_model_info(ModelSlot::Speed, "v1", "abc123");
    }

    #[test]
    fn test_counters_only_increase() {
        let metrics = ServiceMetrics::new();
        let before = metrics.prediction_errors(ModelSlot::Speed, "model_unavailable");

        metrics.inc_prediction_errors(ModelSlot::Speed, "model_unavailable");

        assert!(metrics.prediction_errors(ModelSlot::Speed, "model_unavailable") > before);
    }

    #[test]
    fn test_encode_metrics_includes_service_metrics() {
        let metrics = ServiceMetrics::new();
        metrics.observe_prediction(ModelSlot::Congestion, 0.001);

        let text = encode_metrics().unwrap();
        assert!(text.contains("traffic_predictor_predictions_total"));
        assert!(text.contains("slot=\"congestion\""));
    }

    #[test]
    fn test_structured_logger_creation() {
        let logger = StructuredLogger::new("test-service");
        assert_eq!(logger.service_name(), "test-service");
    }
}
