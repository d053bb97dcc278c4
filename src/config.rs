use std::env;
use std::fs;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::core::error::FlywheelError;
use crate::core::registry::ModelSpec;
use crate::dispatch::dispatcher::DispatcherConfig;
use crate::dispatch::request::ExecutionMode;
use crate::flywheel::engine::FlywheelConfig;
use crate::models::ModelKind;

/// Environment variable naming the JSON configuration file
pub const CONFIG_ENV_VAR: &str = "FLYWHEEL_GATEWAY_CONFIG";

/// Top-level gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub dispatcher: DispatcherConfig,
    /// Models registered at startup
    #[serde(default = "default_models")]
    pub models: Vec<ModelSpec>,
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_models() -> Vec<ModelSpec> {
    vec![ModelSpec {
        name: "echo".to_string(),
        model: ModelKind::Identity,
        execution_mode: ExecutionMode::Sync,
        flywheel: Some(FlywheelConfig::default()),
    }]
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            dispatcher: DispatcherConfig::default(),
            models: default_models(),
        }
    }
}

impl GatewayConfig {
    /// Parse a configuration from JSON text
    pub fn from_json(text: &str) -> Result<Self, FlywheelError> {
        serde_json::from_str(text)
            .map_err(|e| FlywheelError::Configuration(format!("Invalid gateway config: {}", e)))
    }

    /// Load a configuration file
    pub fn load(path: &Path) -> Result<Self, FlywheelError> {
        let text = fs::read_to_string(path).map_err(|e| {
            FlywheelError::Configuration(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        info!("Loaded gateway configuration from {}", path.display());
        Self::from_json(&text)
    }

    /// Load the file named by `FLYWHEEL_GATEWAY_CONFIG`, or fall back to defaults
    pub fn from_env() -> Result<Self, FlywheelError> {
        match env::var(CONFIG_ENV_VAR) {
            Ok(path) => Self::load(Path::new(&path)),
            Err(_) => {
                info!("{} not set, using default gateway configuration", CONFIG_ENV_VAR);
                Ok(Self::default())
            }
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GatewayConfig::default();
        assert_eq!(config.bind_address(), "127.0.0.1:8080");
        assert!(config.dispatcher.timeout().is_none());
        assert_eq!(config.models.len(), 1);
        assert_eq!(config.models[0].name, "echo");
        assert!(config.models[0].flywheel.is_some());
    }

    #[test]
    fn test_from_json_fills_missing_sections() {
        let config = GatewayConfig::from_json(
            r#"{
                "server": {"port": 9000},
                "dispatcher": {"timeout_ms": 250},
                "models": [
                    {"name": "scaler", "model": {"type": "linear", "weights": [[0.5, 0.5]]}}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(config.bind_address(), "127.0.0.1:9000");
        assert_eq!(config.dispatcher.timeout_ms, Some(250));
        assert_eq!(config.models[0].execution_mode, ExecutionMode::Sync);
        assert!(config.models[0].flywheel.is_none());
    }

    #[test]
    fn test_invalid_json_is_a_configuration_error() {
        assert!(matches!(
            GatewayConfig::from_json("{\"models\": 3}"),
            Err(FlywheelError::Configuration(_))
        ));
        assert!(matches!(
            GatewayConfig::load(Path::new("/nonexistent/flywheel.json")),
            Err(FlywheelError::Configuration(_))
        ));
    }
}
