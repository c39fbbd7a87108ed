use crate::config::OAuthSettings;
use crate::errors::DashboardError;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::RngCore;
use reqwest::Url;

/// Bytes of entropy in the CSRF state parameter.
const STATE_BYTES: usize = 32;

/// One login attempt's authorization redirect. Rendered, never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationRequest {
    pub client_id: String,
    pub redirect_uri: String,
    pub scope: Vec<String>,
    pub state: String,
}

impl AuthorizationRequest {
    /// New request with a fresh random state.
    pub fn new(settings: &OAuthSettings) -> Self {
        Self {
            client_id: settings.client_id.clone(),
            redirect_uri: settings.redirect_uri.clone(),
            scope: settings.scopes.clone(),
            state: generate_state(),
        }
    }

    pub fn to_url(&self, authorize_url: &str) -> Result<Url, DashboardError> {
        let scope = self.scope.join(" ");
        Url::parse_with_params(
            authorize_url,
            [
                ("response_type", "code"),
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("scope", scope.as_str()),
                ("state", self.state.as_str()),
            ],
        )
        .map_err(|e| DashboardError::InternalError(anyhow::anyhow!("Invalid authorize URL: {}", e)))
    }
}

fn generate_state() -> String {
    let mut bytes = [0u8; STATE_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
