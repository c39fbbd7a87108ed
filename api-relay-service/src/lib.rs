pub mod config;
pub mod handlers;
pub mod routing;
pub mod services;
pub mod startup;

use crate::config::RelaySettings;
use axum::http::HeaderName;
use routing::RouteTable;
use service_core::error::AppError;
use services::UpstreamClient;
use std::sync::Arc;

pub use startup::{build_router, Application};

#[derive(Clone)]
pub struct AppState {
    pub routes: Arc<RouteTable>,
    pub upstream: Arc<UpstreamClient>,
    /// Request header carrying the caller's access token.
    pub token_header: HeaderName,
}

impl AppState {
    pub fn new(routes: RouteTable, upstream: UpstreamClient, token_header: HeaderName) -> Self {
        Self {
            routes: Arc::new(routes),
            upstream: Arc::new(upstream),
            token_header,
        }
    }

    pub fn from_settings(settings: &RelaySettings) -> Result<Self, AppError> {
        let token_header = HeaderName::from_bytes(settings.access_token_header.trim().as_bytes())
            .map_err(|e| {
                AppError::ConfigError(anyhow::anyhow!(
                    "relay.access_token_header is not a valid header name: {}",
                    e
                ))
            })?;

        Ok(Self::new(
            RouteTable::from_settings(settings)?,
            UpstreamClient::new(),
            token_header,
        ))
    }
}
