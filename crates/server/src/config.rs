//! Service configuration

use anyhow::{bail, Context, Result};
use config::builder::DefaultState;
use config::ConfigBuilder;
use predictor_lib::artifact::{ArtifactPaths, DEFAULT_MAX_MODEL_BYTES};
use serde::Deserialize;
use std::path::PathBuf;

/// Service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Bind address for the HTTP listener
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Manifest of the speed regression artifact
    #[serde(default = "default_speed_model")]
    pub speed_model: PathBuf,

    /// Manifest of the congestion classification artifact
    #[serde(default = "default_congestion_model")]
    pub congestion_model: PathBuf,

    /// Upper bound on a single model file
    #[serde(default = "default_max_artifact_bytes")]
    pub max_artifact_bytes: u64,

    /// Allow any origin, method and header
    #[serde(default = "default_cors_permissive")]
    pub cors_permissive: bool,

    /// Name attached to structured log events
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_speed_model() -> PathBuf {
    PathBuf::from("models/speed_model.json")
}

fn default_congestion_model() -> PathBuf {
    PathBuf::from("models/congestion_model.json")
}

fn default_max_artifact_bytes() -> u64 {
    DEFAULT_MAX_MODEL_BYTES
}

fn default_cors_permissive() -> bool {
    true
}

fn default_service_name() -> String {
    "traffic-predictor".to_string()
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            speed_model: default_speed_model(),
            congestion_model: default_congestion_model(),
            max_artifact_bytes: default_max_artifact_bytes(),
            cors_permissive: default_cors_permissive(),
            service_name: default_service_name(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from an optional `predictor.*` file and `PREDICTOR_*` environment
    pub fn load() -> Result<Self> {
        Self::from_builder(
            config::Config::builder()
                .add_source(config::File::with_name("predictor").required(false))
                .add_source(config::Environment::with_prefix("PREDICTOR").try_parsing(true)),
        )
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self> {
        let config: ServiceConfig = builder
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            bail!("host must not be empty");
        }
        if self.speed_model.as_os_str().is_empty() || self.congestion_model.as_os_str().is_empty() {
            bail!("model artifact paths must not be empty");
        }
        if self.max_artifact_bytes == 0 {
            bail!("max_artifact_bytes must be greater than zero");
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn artifact_paths(&self) -> ArtifactPaths {
        ArtifactPaths {
            speed: self.speed_model.clone(),
            congestion: self.congestion_model.clone(),
        }
    }
}
