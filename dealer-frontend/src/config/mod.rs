use reqwest::Url;
use serde::Deserialize;
use service_core::config::{layered, require_non_empty, ServerSettings, TelemetrySettings};
use service_core::error::AppError;

pub const DEFAULT_AUTHORIZE_URL: &str =
    "https://signin.johndeere.com/oauth2/aus78tnlaysMraFhC1t7/v1/authorize";
pub const DEFAULT_CONNECTIONS_URL: &str = "https://connections.deere.com/connections";

#[derive(Deserialize, Clone, Debug)]
pub struct Settings {
    pub server: ServerSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
    pub oauth: OAuthSettings,
    pub token_service: TokenServiceSettings,
    pub relay_service: RelayServiceSettings,
    #[serde(default)]
    pub connections: ConnectionsSettings,
    #[serde(default)]
    pub session: SessionSettings,
}

/// Public half of the OAuth client registration. The secret lives only in
/// the token exchange service.
#[derive(Deserialize, Clone, Debug)]
pub struct OAuthSettings {
    #[serde(default = "default_authorize_url")]
    pub authorize_url: String,
    pub client_id: String,
    pub redirect_uri: String,
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,
    /// Where the browser lands after a successful redirect-back.
    #[serde(default = "default_post_login_path")]
    pub post_login_path: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct TokenServiceSettings {
    pub url: String,
    #[serde(default = "default_token_path")]
    pub path: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct RelayServiceSettings {
    pub url: String,
    #[serde(default = "default_relay_path")]
    pub path: String,
    #[serde(default = "default_access_token_header")]
    pub access_token_header: String,
}

/// Deere's connection management page, used to fix missing org permissions.
#[derive(Deserialize, Clone, Debug)]
pub struct ConnectionsSettings {
    #[serde(default = "default_connections_url")]
    pub base_url: String,
}

impl Default for ConnectionsSettings {
    fn default() -> Self {
        Self {
            base_url: default_connections_url(),
        }
    }
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct SessionSettings {
    /// Only send the session cookie over HTTPS.
    #[serde(default)]
    pub secure_cookie: bool,
    /// Expire idle sessions; without it the session ends with the browser.
    #[serde(default)]
    pub inactivity_minutes: Option<i64>,
}

fn default_authorize_url() -> String {
    DEFAULT_AUTHORIZE_URL.to_string()
}

fn default_scopes() -> Vec<String> {
    ["ag1", "org1", "eq1", "files", "offline_access"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_post_login_path() -> String {
    "/api/session".to_string()
}

fn default_token_path() -> String {
    "/token".to_string()
}

fn default_relay_path() -> String {
    "/relay".to_string()
}

fn default_access_token_header() -> String {
    "x-jd-access-token".to_string()
}

fn default_connections_url() -> String {
    DEFAULT_CONNECTIONS_URL.to_string()
}

fn require_url(key: &str, value: &str) -> Result<(), AppError> {
    Url::parse(value).map(|_| ()).map_err(|e| {
        AppError::ConfigError(anyhow::anyhow!("{} is not a valid URL: {}", key, e))
    })
}

impl Settings {
    pub fn validate(&self) -> Result<(), AppError> {
        require_non_empty("oauth.client_id", &self.oauth.client_id)?;
        require_non_empty("oauth.redirect_uri", &self.oauth.redirect_uri)?;
        require_non_empty(
            "relay_service.access_token_header",
            &self.relay_service.access_token_header,
        )?;

        require_url("oauth.authorize_url", &self.oauth.authorize_url)?;
        require_url("oauth.redirect_uri", &self.oauth.redirect_uri)?;
        require_url("token_service.url", &self.token_service.url)?;
        require_url("relay_service.url", &self.relay_service.url)?;
        require_url("connections.base_url", &self.connections.base_url)?;

        if self.oauth.scopes.is_empty() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "oauth.scopes must name at least one scope"
            )));
        }

        if matches!(self.session.inactivity_minutes, Some(minutes) if minutes <= 0) {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "session.inactivity_minutes must be positive"
            )));
        }

        Ok(())
    }
}

pub fn get_configuration() -> Result<Settings, AppError> {
    let defaults = config::Config::builder().set_default("server.port", 8083_i64)?;

    let settings: Settings = layered("dealer-frontend", defaults)?
        .build()?
        .try_deserialize()?;

    settings.validate()?;
    Ok(settings)
}
