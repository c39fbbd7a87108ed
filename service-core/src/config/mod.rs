use crate::error::AppError;
use config::{builder::DefaultState, ConfigBuilder, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;

/// Settings every HTTP service shares.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
}

impl ServerSettings {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

/// Logging and trace export settings.
#[derive(Debug, Deserialize, Clone)]
pub struct TelemetrySettings {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// OTLP collector endpoint; spans are only exported when set.
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            otlp_endpoint: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Resolves `<service_dir>/config`, whether the process runs from the
/// workspace root or from inside the crate directory.
pub fn configuration_directory(service_dir: &str) -> Result<PathBuf, AppError> {
    let base_path = std::env::current_dir()?;

    if base_path.ends_with(service_dir) {
        Ok(base_path.join("config"))
    } else {
        Ok(base_path.join(service_dir).join("config"))
    }
}

/// Layered configuration: caller defaults, then an optional
/// `config/base.yaml`, then `APP_`-prefixed environment variables
/// (`APP_PROVIDER__CLIENT_ID` maps to `provider.client_id`).
pub fn layered(
    service_dir: &str,
    defaults: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, AppError> {
    dotenvy::dotenv().ok();

    let configuration_directory = configuration_directory(service_dir)?;

    Ok(defaults
        .add_source(File::from(configuration_directory.join("base.yaml")).required(false))
        .add_source(environment()))
}

pub fn environment() -> Environment {
    Environment::with_prefix("APP")
        .prefix_separator("_")
        .separator("__")
}

/// Fails with a configuration error when a required value is blank.
pub fn require_non_empty(key: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::ConfigError(anyhow::anyhow!(
            "{} is required but not set",
            key
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_values_are_rejected() {
        assert!(require_non_empty("provider.client_id", "  ").is_err());
        assert!(require_non_empty("provider.client_id", "0oa123").is_ok());
    }

    #[test]
    fn server_address_joins_host_and_port() {
        let server = ServerSettings {
            host: "127.0.0.1".to_string(),
            port: 8081,
        };
        assert_eq!(server.address(), "127.0.0.1:8081");
    }
}
