use crate::config::RelayServiceSettings;
use crate::errors::DashboardError;
use reqwest::Client;
use service_core::observability::TracedClientExt;

/// Client for the API relay service.
pub struct RelayClient {
    client: Client,
    endpoint: String,
    token_header: String,
}

impl RelayClient {
    pub fn new(client: Client, settings: &RelayServiceSettings) -> Self {
        Self {
            client,
            endpoint: format!("{}{}", settings.url.trim_end_matches('/'), settings.path),
            token_header: settings.access_token_header.clone(),
        }
    }

    /// GET a logical endpoint through the relay. Non-success replies become
    /// `DashboardError::Api` with the body parsed as JSON when possible.
    pub async fn fetch(
        &self,
        endpoint: &str,
        access_token: &str,
    ) -> Result<serde_json::Value, DashboardError> {
        let response = self
            .client
            .traced_get(&self.endpoint)
            .query(&[("endpoint", endpoint)])
            .header(self.token_header.as_str(), access_token)
            .send()
            .await
            .map_err(|e| {
                DashboardError::InternalError(anyhow::anyhow!("Relay request failed: {}", e))
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            DashboardError::InternalError(anyhow::anyhow!("Relay body unreadable: {}", e))
        })?;

        if !status.is_success() {
            let body = serde_json::from_str(&text)
                .unwrap_or_else(|_| serde_json::json!({ "message": text }));
            tracing::warn!(endpoint = %endpoint, status = %status, "Relayed API call failed");
            return Err(DashboardError::Api { status, body });
        }

        serde_json::from_str(&text).map_err(|e| {
            DashboardError::InternalError(anyhow::anyhow!(
                "Relay returned non-JSON body for {}: {}",
                endpoint,
                e
            ))
        })
    }
}
