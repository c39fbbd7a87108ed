use crate::config::TokenServiceSettings;
use crate::errors::DashboardError;
use reqwest::Client;
use serde::Deserialize;
use service_core::observability::TracedClientExt;
use std::fmt;

const DEFAULT_EXCHANGE_ERROR: &str = "Failed to fetch token.";

/// Token endpoint reply as relayed by the token exchange service.
#[derive(Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenResponse")
            .field("access_token", &"[REDACTED]")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[REDACTED]"))
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct ExchangeErrorBody {
    #[serde(default)]
    error: Option<String>,
}

/// Client for the token exchange service.
pub struct TokenServiceClient {
    client: Client,
    endpoint: String,
}

impl TokenServiceClient {
    pub fn new(client: Client, settings: &TokenServiceSettings) -> Self {
        Self {
            client,
            endpoint: format!("{}{}", settings.url.trim_end_matches('/'), settings.path),
        }
    }

    /// Trade an authorization code for an access token.
    pub async fn exchange(&self, code: &str) -> Result<TokenResponse, DashboardError> {
        let response = self
            .client
            .traced_post(&self.endpoint)
            .json(&serde_json::json!({ "code": code }))
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to reach token exchange service");
                DashboardError::TokenExchange("The token service is unavailable.".to_string())
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            tracing::error!(status = %status, error = %e, "Failed to read token exchange response");
            DashboardError::TokenExchange(DEFAULT_EXCHANGE_ERROR.to_string())
        })?;

        if !status.is_success() {
            let message = serde_json::from_str::<ExchangeErrorBody>(&text)
                .ok()
                .and_then(|body| body.error)
                .filter(|message| !message.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_EXCHANGE_ERROR.to_string());
            tracing::warn!(status = %status, error = %message, "Token exchange rejected");
            return Err(DashboardError::TokenExchange(message));
        }

        serde_json::from_str::<TokenResponse>(&text).map_err(|e| {
            tracing::error!(error = %e, "Token exchange response has no usable access token");
            DashboardError::TokenExchange(
                "The token response did not include an access token.".to_string(),
            )
        })
    }
}
