use crate::config::Settings;
use crate::handlers::{method_not_allowed, token::exchange_token};
use crate::services::ProviderClient;
use crate::AppState;
use axum::{routing::post, Router};
use service_core::error::AppError;
use service_core::health::health_routes;
use service_core::middleware::with_common_layers;
use service_core::shutdown::shutdown_signal;
use std::sync::Arc;
use tokio::net::TcpListener;

pub const SERVICE_NAME: &str = "token-exchange-service";

pub fn build_router(state: AppState) -> Router {
    let exchange = post(exchange_token).fallback(method_not_allowed);

    let router = Router::new()
        .route("/token", exchange.clone())
        // Path the dashboard used when this ran as a serverless function.
        .route("/.netlify/functions/get-token", exchange)
        .merge(health_routes(SERVICE_NAME, env!("CARGO_PKG_VERSION")))
        .with_state(state);

    with_common_layers(router)
}

pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Bind the listener (port 0 picks a free port) and assemble the router.
    pub async fn build(settings: Settings) -> Result<Self, AppError> {
        settings.validate()?;

        let provider = Arc::new(ProviderClient::new(settings.provider.clone()));
        let router = build_router(AppState::new(provider));

        let address = settings.server.address();
        let listener = TcpListener::bind(&address).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", address, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        Ok(Self {
            port,
            listener,
            router,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> Result<(), AppError> {
        tracing::info!("Starting {} on port {}", SERVICE_NAME, self.port);

        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        Ok(())
    }
}
