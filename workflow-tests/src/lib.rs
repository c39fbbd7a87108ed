//! Cross-service workflow test harness.
//!
//! Starts the token exchange service, the API relay and the dealer frontend
//! in-process on ephemeral ports. The identity provider and the upstream
//! Deere APIs are `wiremock` doubles, so the real HTTP hops between the
//! services are exercised without external network access.

use anyhow::{anyhow, Result};
use api_relay_service::config::RelaySettings;
use dealer_frontend::config::{
    ConnectionsSettings, OAuthSettings, RelayServiceSettings, SessionSettings,
    TokenServiceSettings,
};
use dealer_frontend::services::DashboardServices;
use dealer_frontend::session::{MemorySessionStore, SessionController};
use secrecy::Secret;
use service_core::config::{ServerSettings, TelemetrySettings};
use std::sync::{Arc, Once};
use std::time::Duration;
use wiremock::MockServer;

pub const CLIENT_ID: &str = "0oa-workflow-client";
pub const CLIENT_SECRET: &str = "workflow-secret";

static INIT: Once = Once::new();

/// Initialize tracing for tests (only once).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("info,workflow_tests=debug")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

fn local_server() -> ServerSettings {
    ServerSettings {
        host: "127.0.0.1".to_string(),
        port: 0,
    }
}

/// Running services plus the doubles they talk to.
pub struct WorkflowTestContext {
    pub provider: MockServer,
    pub upstream: MockServer,
    pub token_service_url: String,
    pub relay_url: String,
    pub frontend_url: String,
    pub dashboard_settings: dealer_frontend::config::Settings,
}

impl WorkflowTestContext {
    pub async fn start() -> Result<Self> {
        init_tracing();

        let provider = MockServer::start().await;
        let upstream = MockServer::start().await;

        let frontend_listener_port = reserve_port().await?;
        let frontend_url = format!("http://127.0.0.1:{}", frontend_listener_port);
        let redirect_uri = format!("{}/auth/callback", frontend_url);

        let token_service = token_exchange_service::Application::build(
            token_exchange_service::config::Settings {
                server: local_server(),
                telemetry: TelemetrySettings::default(),
                provider: token_exchange_service::config::ProviderSettings {
                    token_url: format!("{}/v1/token", provider.uri()),
                    client_id: CLIENT_ID.to_string(),
                    client_secret: Secret::new(CLIENT_SECRET.to_string()),
                    redirect_uri: redirect_uri.clone(),
                },
            },
        )
        .await
        .map_err(|e| anyhow!("Failed to build token-exchange-service: {}", e))?;
        let token_service_url = format!("http://127.0.0.1:{}", token_service.port());
        tokio::spawn(token_service.run_until_stopped());

        let mut relay_settings = RelaySettings::default();
        for route in &mut relay_settings.routes {
            route.base_url = format!("{}/isg/", upstream.uri());
        }
        relay_settings.default_route.base_url = format!("{}/platform/", upstream.uri());

        let relay = api_relay_service::Application::build(api_relay_service::config::Settings {
            server: local_server(),
            telemetry: TelemetrySettings::default(),
            relay: relay_settings,
        })
        .await
        .map_err(|e| anyhow!("Failed to build api-relay-service: {}", e))?;
        let relay_url = format!("http://127.0.0.1:{}", relay.port());
        tokio::spawn(relay.run_until_stopped());

        let dashboard_settings = dealer_frontend::config::Settings {
            server: ServerSettings {
                host: "127.0.0.1".to_string(),
                port: frontend_listener_port,
            },
            telemetry: TelemetrySettings::default(),
            oauth: OAuthSettings {
                authorize_url: format!("{}/v1/authorize", provider.uri()),
                client_id: CLIENT_ID.to_string(),
                redirect_uri,
                scopes: ["ag1", "org1", "eq1", "files", "offline_access"]
                    .into_iter()
                    .map(String::from)
                    .collect(),
                post_login_path: "/api/session".to_string(),
            },
            token_service: TokenServiceSettings {
                url: token_service_url.clone(),
                path: "/token".to_string(),
            },
            relay_service: RelayServiceSettings {
                url: relay_url.clone(),
                path: "/relay".to_string(),
                access_token_header: "x-jd-access-token".to_string(),
            },
            connections: ConnectionsSettings::default(),
            session: SessionSettings::default(),
        };

        let frontend = dealer_frontend::Application::build(dashboard_settings.clone())
            .await
            .map_err(|e| anyhow!("Failed to build dealer-frontend: {}", e))?;
        tokio::spawn(frontend.run_until_stopped());

        let context = Self {
            provider,
            upstream,
            token_service_url,
            relay_url,
            frontend_url,
            dashboard_settings,
        };

        wait_for_services(&context.health_urls(), Duration::from_secs(10)).await?;
        Ok(context)
    }

    pub fn health_urls(&self) -> Vec<(&'static str, String)> {
        vec![
            ("token-exchange-service", format!("{}/health", self.token_service_url)),
            ("api-relay-service", format!("{}/health", self.relay_url)),
            ("dealer-frontend", format!("{}/health", self.frontend_url)),
        ]
    }

    /// Controller over a fresh in-memory session, wired to the running services.
    pub fn controller(&self) -> (MemorySessionStore, SessionController<MemorySessionStore>) {
        let store = MemorySessionStore::new();
        let services = Arc::new(DashboardServices::from_settings(&self.dashboard_settings));
        (store.clone(), SessionController::new(store, services))
    }

    /// Browser-like client: keeps cookies, does not follow redirects.
    pub fn browser(&self) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| anyhow!("Failed to build HTTP client: {}", e))
    }
}

/// Binds and releases a port so the frontend's redirect URI is known before
/// it starts.
async fn reserve_port() -> Result<u16> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    Ok(listener.local_addr()?.port())
}

/// Wait for all services to be healthy.
///
/// Polls health endpoints until all services respond with 200 OK.
/// Times out after the specified duration.
pub async fn wait_for_services(urls: &[(&'static str, String)], timeout: Duration) -> Result<()> {
    let client = reqwest::Client::new();
    let deadline = tokio::time::Instant::now() + timeout;

    for (name, url) in urls {
        loop {
            match client.get(url).send().await {
                Ok(response) if response.status().is_success() => {
                    tracing::debug!(service = %name, "Service healthy");
                    break;
                }
                _ if tokio::time::Instant::now() >= deadline => {
                    return Err(anyhow!("{} not healthy at {} after {:?}", name, url, timeout));
                }
                _ => tokio::time::sleep(Duration::from_millis(50)).await,
            }
        }
    }

    Ok(())
}
