//! HTTP API for predictions, health checks and Prometheus metrics

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use predictor_lib::{
    health::{ComponentStatus, HealthRegistry},
    models::{CongestionValue, FeaturePayload, ModelSlot, PredictionResult},
    observability::encode_metrics,
    InferenceHandler, PredictError,
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub handler: InferenceHandler,
    pub health_registry: HealthRegistry,
}

impl AppState {
    pub fn new(handler: InferenceHandler, health_registry: HealthRegistry) -> Self {
        Self {
            handler,
            health_registry,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SpeedPrediction {
    pub predicted_speed: f64,
}

#[derive(Debug, Serialize)]
pub struct CongestionPrediction {
    pub predicted_congestion: CongestionValue,
}

/// Error returned to clients as `{"detail": ...}`
#[derive(Debug)]
pub enum ApiError {
    Predict(PredictError),
    BadRequest(String),
    Unprocessable(String),
    Internal(String),
}

impl From<PredictError> for ApiError {
    fn from(err: PredictError) -> Self {
        ApiError::Predict(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Unprocessable(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiError::Predict(err @ PredictError::ModelUnavailable(_)) => {
                (StatusCode::SERVICE_UNAVAILABLE, err.to_string())
            }
            ApiError::Predict(err @ PredictError::SchemaMismatch(_)) => {
                (StatusCode::BAD_REQUEST, err.to_string())
            }
            ApiError::BadRequest(detail) => (StatusCode::BAD_REQUEST, detail),
            ApiError::Unprocessable(detail) => (StatusCode::UNPROCESSABLE_ENTITY, detail),
            ApiError::Internal(detail) => (StatusCode::INTERNAL_SERVER_ERROR, detail),
        };

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

/// Run the handler off the async executor; inference is CPU-bound
async fn run_prediction(
    state: &AppState,
    slot: ModelSlot,
    payload: FeaturePayload,
) -> Result<PredictionResult, ApiError> {
    let handler = state.handler.clone();
    let result = tokio::task::spawn_blocking(move || handler.predict(slot, &payload))
        .await
        .map_err(|e| {
            error!(slot = %slot, error = %e, "Prediction task failed");
            ApiError::Internal("prediction task failed".to_string())
        })?;

    Ok(result?)
}

async fn predict_speed(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<FeaturePayload>, JsonRejection>,
) -> Result<Json<SpeedPrediction>, ApiError> {
    let Json(payload) = payload?;

    match run_prediction(&state, ModelSlot::Speed, payload).await? {
        PredictionResult::Speed(predicted_speed) => Ok(Json(SpeedPrediction { predicted_speed })),
        other => Err(ApiError::Internal(format!(
            "speed model produced a {} result",
            other.slot()
        ))),
    }
}

async fn predict_congestion(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<FeaturePayload>, JsonRejection>,
) -> Result<Json<CongestionPrediction>, ApiError> {
    let Json(payload) = payload?;

    match run_prediction(&state, ModelSlot::Congestion, payload).await? {
        PredictionResult::Congestion(predicted_congestion) => {
            Ok(Json(CongestionPrediction { predicted_congestion }))
        }
        other => Err(ApiError::Internal(format!(
            "congestion model produced a {} result",
            other.slot()
        ))),
    }
}

/// Schema report for one slot
async fn model_info(
    State(state): State<Arc<AppState>>,
    Path(slot): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let slot: ModelSlot = slot.parse().map_err(ApiError::BadRequest)?;

    let artifact = state
        .handler
        .store()
        .get(slot)
        .ok_or(PredictError::ModelUnavailable(slot))?;

    Ok(Json(artifact.info()))
}

/// Health check response - returns 200 if healthy, 503 if unhealthy
async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy => StatusCode::OK,
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

/// Readiness check response - returns 200 if ready, 503 if not ready
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> Result<impl IntoResponse, ApiError> {
    let body = encode_metrics().map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok((
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
        body,
    ))
}

/// Create the API router
pub fn create_router(state: Arc<AppState>, cors_permissive: bool) -> Router {
    let router = Router::new()
        .route("/predict_speed", post(predict_speed))
        .route("/predict_congestion", post(predict_congestion))
        .route("/models/:slot", get(model_info))
        .route("/health", get(health))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if cors_permissive {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

/// Start the API server, returning when `shutdown` resolves
pub async fn serve(
    addr: &str,
    router: Router,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
