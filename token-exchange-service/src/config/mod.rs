use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use service_core::config::{layered, require_non_empty, ServerSettings, TelemetrySettings};
use service_core::error::AppError;

/// John Deere's production authorization server token endpoint.
pub const DEFAULT_TOKEN_URL: &str =
    "https://signin.johndeere.com/oauth2/aus78tnlaysMraFhC1t7/v1/token";

#[derive(Deserialize, Clone, Debug)]
pub struct Settings {
    pub server: ServerSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
    pub provider: ProviderSettings,
}

/// Confidential client registration. Only ever read from process
/// configuration, never from a request.
#[derive(Deserialize, Clone, Debug)]
pub struct ProviderSettings {
    pub token_url: String,
    pub client_id: String,
    pub client_secret: Secret<String>,
    /// Must match the redirect URI used when the code was issued.
    pub redirect_uri: String,
}

impl Settings {
    pub fn validate(&self) -> Result<(), AppError> {
        require_non_empty("provider.client_id", &self.provider.client_id)?;
        require_non_empty(
            "provider.client_secret",
            self.provider.client_secret.expose_secret(),
        )?;
        require_non_empty("provider.redirect_uri", &self.provider.redirect_uri)?;

        reqwest::Url::parse(&self.provider.token_url).map_err(|e| {
            AppError::ConfigError(anyhow::anyhow!(
                "provider.token_url is not a valid URL: {}",
                e
            ))
        })?;

        Ok(())
    }
}

pub fn get_configuration() -> Result<Settings, AppError> {
    let defaults = config::Config::builder()
        .set_default("server.port", 8081_i64)?
        .set_default("provider.token_url", DEFAULT_TOKEN_URL)?;

    let settings: Settings = layered("token-exchange-service", defaults)?
        .build()?
        .try_deserialize()?;

    settings.validate()?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(client_secret: &str) -> Settings {
        Settings {
            server: ServerSettings {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
            telemetry: TelemetrySettings::default(),
            provider: ProviderSettings {
                token_url: DEFAULT_TOKEN_URL.to_string(),
                client_id: "0oaqqj19wrudozUJm5d7".to_string(),
                client_secret: Secret::new(client_secret.to_string()),
                redirect_uri: "http://localhost:8083/auth/callback".to_string(),
            },
        }
    }

    #[test]
    fn complete_settings_validate() {
        assert!(settings("s3cret").validate().is_ok());
    }

    #[test]
    fn blank_secret_is_rejected_before_serving() {
        let err = settings("").validate().unwrap_err();
        assert!(err.to_string().contains("provider.client_secret"));
    }

    #[test]
    fn secret_is_redacted_in_debug_output() {
        let rendered = format!("{:?}", settings("s3cret"));
        assert!(!rendered.contains("s3cret"));
    }
}
