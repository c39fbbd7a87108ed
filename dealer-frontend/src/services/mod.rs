pub mod relay_client;
pub mod token_client;

pub use relay_client::RelayClient;
pub use token_client::{TokenResponse, TokenServiceClient};

use crate::config::{OAuthSettings, Settings};
use crate::errors::ConnectionsLink;
use reqwest::Client;

/// Everything a session controller needs besides the session itself.
/// Built once at startup and shared.
pub struct DashboardServices {
    pub oauth: OAuthSettings,
    pub token_service: TokenServiceClient,
    pub relay: RelayClient,
    pub connections: ConnectionsLink,
}

impl DashboardServices {
    pub fn from_settings(settings: &Settings) -> Self {
        let client = Client::new();

        Self {
            oauth: settings.oauth.clone(),
            token_service: TokenServiceClient::new(client.clone(), &settings.token_service),
            relay: RelayClient::new(client, &settings.relay_service),
            connections: ConnectionsLink::new(
                &settings.connections.base_url,
                &settings.oauth.client_id,
            ),
        }
    }
}
