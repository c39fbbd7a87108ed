//! Forwarding client for the upstream Deere APIs.

use crate::routing::ResolvedEndpoint;
use reqwest::header::{HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use service_core::error::AppError;
use service_core::observability::TracedClientExt;

/// Header the platform API reads to return a whole collection in one page.
pub const NO_PAGING_HEADER: &str = "No_paging";

/// Upstream reply, relayed without interpretation.
#[derive(Debug)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub content_type: Option<HeaderValue>,
    pub body: String,
}

#[derive(Clone, Default)]
pub struct UpstreamClient {
    client: Client,
}

impl UpstreamClient {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    /// Single GET, no retry. Non-success statuses are returned, not raised.
    pub async fn forward(
        &self,
        target: &ResolvedEndpoint<'_>,
        access_token: &str,
    ) -> Result<UpstreamResponse, AppError> {
        let mut request = self
            .client
            .traced_get(target.url.clone())
            .bearer_auth(access_token)
            .header(ACCEPT, target.accept.clone());

        if target.disable_paging {
            request = request.header(NO_PAGING_HEADER, "True");
        }

        let response = request.send().await.map_err(|e| {
            tracing::error!(route = %target.route, error = %e, "Failed to reach upstream API");
            AppError::InternalError(anyhow::anyhow!("Upstream request failed: {}", e))
        })?;

        let status = response.status();
        let content_type = response.headers().get(CONTENT_TYPE).cloned();
        let body = response.text().await.map_err(|e| {
            tracing::error!(route = %target.route, status = %status, error = %e, "Failed to read upstream body");
            AppError::InternalError(anyhow::anyhow!("Upstream body unreadable: {}", e))
        })?;

        if status.is_success() {
            tracing::debug!(route = %target.route, status = %status, "Upstream call succeeded");
        } else {
            tracing::warn!(
                route = %target.route,
                path = %target.url.path(),
                status = %status,
                body = %body,
                "Upstream API returned an error"
            );
        }

        Ok(UpstreamResponse {
            status,
            content_type,
            body,
        })
    }
}
