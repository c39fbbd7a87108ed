//! Identity provider token endpoint client.
//!
//! Performs the confidential half of the authorization-code grant: the code
//! arrives from the browser, the client credentials come from configuration,
//! and only the provider's token response travels back.

use crate::config::ProviderSettings;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Client, StatusCode};
use secrecy::ExposeSecret;
use serde::Deserialize;
use service_core::error::AppError;
use service_core::observability::TracedClientExt;

/// Fallback message when the provider rejects a code without a description.
pub const DEFAULT_EXCHANGE_ERROR: &str = "Failed to fetch token.";

/// Successful token endpoint reply, relayed to the caller unchanged.
#[derive(Debug)]
pub struct TokenExchange {
    pub status: StatusCode,
    pub body: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    #[serde(default)]
    error_description: Option<String>,
}

pub struct ProviderClient {
    client: Client,
    settings: ProviderSettings,
}

impl ProviderClient {
    pub fn new(settings: ProviderSettings) -> Self {
        Self {
            client: Client::new(),
            settings,
        }
    }

    /// `Basic base64(client_id:client_secret)`.
    pub fn basic_auth_header(&self) -> String {
        let credentials = format!(
            "{}:{}",
            self.settings.client_id,
            self.settings.client_secret.expose_secret()
        );
        format!("Basic {}", STANDARD.encode(credentials))
    }

    /// Exchange an authorization code at the provider token endpoint.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenExchange, AppError> {
        let form = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.settings.redirect_uri.as_str()),
        ];

        let response = self
            .client
            .traced_post(self.settings.token_url.as_str())
            .header(AUTHORIZATION, self.basic_auth_header())
            .header(ACCEPT, "application/json")
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to reach token endpoint");
                AppError::InternalError(anyhow::anyhow!("Token endpoint request failed: {}", e))
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            tracing::error!(status = %status, error = %e, "Failed to read token endpoint response");
            AppError::InternalError(anyhow::anyhow!("Token endpoint body unreadable: {}", e))
        })?;

        if status.is_success() {
            let body: serde_json::Value = serde_json::from_str(&text).map_err(|e| {
                tracing::error!(status = %status, error = %e, "Token endpoint returned non-JSON body");
                AppError::InternalError(anyhow::anyhow!("Token endpoint body is not JSON: {}", e))
            })?;

            tracing::info!(status = %status, "Authorization code exchanged");
            return Ok(TokenExchange { status, body });
        }

        tracing::error!(status = %status, body = %text, "Token endpoint rejected authorization code");

        let message = serde_json::from_str::<ProviderErrorBody>(&text)
            .ok()
            .and_then(|body| body.error_description)
            .filter(|description| !description.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_EXCHANGE_ERROR.to_string());

        Err(AppError::Upstream { status, message })
    }
}
