//! API client for communicating with the traffic prediction service

use anyhow::{Context, Result};
use reqwest::{Client, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use url::Url;

/// API client for the prediction service
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = Url::parse(base_url).context("Invalid API URL")?;

        Ok(Self { client, base_url })
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to send request")?;

        parse_response(response).await
    }

    /// Make a POST request with JSON body
    pub async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .context("Failed to send request")?;

        parse_response(response).await
    }

    /// Fetch the health report; an unhealthy service answers 503 with the same body
    pub async fn health(&self) -> Result<HealthReport> {
        let url = self.base_url.join("health").context("Invalid path")?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to send request")?;

        if response.status() == StatusCode::SERVICE_UNAVAILABLE {
            return response.json().await.context("Failed to parse response");
        }

        parse_response(response).await
    }

    pub async fn predict_speed(&self, payload: &FeatureMap) -> Result<SpeedPrediction> {
        self.post("predict_speed", payload).await
    }

    pub async fn predict_congestion(&self, payload: &FeatureMap) -> Result<CongestionPrediction> {
        self.post("predict_congestion", payload).await
    }

    pub async fn model_info(&self, slot: &str) -> Result<ModelInfo> {
        self.get(&format!("models/{}", slot)).await
    }
}

/// Deserialize a success body, or surface the service's `detail` message
async fn parse_response<T: DeserializeOwned>(response: Response) -> Result<T> {
    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        anyhow::bail!("API error ({}): {}", status, error_detail(&body));
    }

    response.json().await.context("Failed to parse response")
}

fn error_detail(body: &str) -> String {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(err) => match err.detail {
            serde_json::Value::String(detail) => detail,
            other => other.to_string(),
        },
        Err(_) => body.to_string(),
    }
}

// API request/response types

pub type FeatureMap = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeedPrediction {
    pub predicted_speed: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CongestionPrediction {
    /// Raw model output: category code, score or label
    pub predicted_congestion: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub slot: String,
    pub version: String,
    pub feature_names: Vec<String>,
    pub checksum: String,
    pub input_dtype: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub class_labels: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    pub ready: bool,
    pub components: HashMap<String, ComponentHealth>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub last_check_timestamp: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: serde_json::Value,
}
