//! Traffic Predictor - inference service for traffic speed and congestion
//!
//! Loads both model artifacts at startup, refusing to serve if either is
//! invalid, then answers prediction requests over HTTP.

use anyhow::{Context, Result};
use predictor_lib::{
    artifact::{ArtifactLoader, ModelStore},
    health::HealthRegistry,
    models::ModelSlot,
    observability::{ServiceMetrics, StructuredLogger},
    InferenceHandler,
};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use traffic_predictor::{api, config::ServiceConfig};

const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting traffic-predictor");

    let config = ServiceConfig::load()?;
    info!(
        addr = %config.bind_addr(),
        speed_model = %config.speed_model.display(),
        congestion_model = %config.congestion_model.display(),
        "Service configured"
    );

    let health_registry = HealthRegistry::for_model_slots().await;
    let metrics = ServiceMetrics::new();
    metrics.set_models_loaded(0);
    let logger = StructuredLogger::new(&config.service_name);

    // Both artifacts must load before the listener opens
    let store = Arc::new(ModelStore::new());
    let loader = ArtifactLoader::with_max_model_bytes(config.max_artifact_bytes);
    if let Err(e) = store.load(&config.artifact_paths(), &loader) {
        error!(error = %e, "Failed to load model artifacts");
        return Err(e).context("model artifacts failed to load");
    }

    for slot in ModelSlot::ALL {
        if let Some(artifact) = store.get(slot) {
            metrics.set_model_info(slot, artifact.version(), artifact.checksum());
            health_registry.set_healthy(slot.component()).await;
        }
    }
    metrics.set_models_loaded(ModelSlot::ALL.len() as i64);
    health_registry.set_ready(true).await;

    let handler = InferenceHandler::new(store, metrics, logger.clone());
    let state = Arc::new(api::AppState::new(handler, health_registry));
    let router = api::create_router(state, config.cors_permissive);

    let addr = config.bind_addr();
    logger.log_startup(SERVICE_VERSION, &addr);

    let shutdown_logger = logger.clone();
    api::serve(&addr, router, async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
        shutdown_logger.log_shutdown("SIGINT received");
    })
    .await?;

    info!("Shut down");
    Ok(())
}
