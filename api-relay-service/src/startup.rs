use crate::config::Settings;
use crate::handlers::{method_not_allowed, relay::relay};
use crate::AppState;
use axum::{routing::get, Router};
use service_core::error::AppError;
use service_core::health::health_routes;
use service_core::middleware::with_common_layers;
use service_core::shutdown::shutdown_signal;
use tokio::net::TcpListener;

pub const SERVICE_NAME: &str = "api-relay-service";

pub fn build_router(state: AppState) -> Router {
    let forward = get(relay).fallback(method_not_allowed);

    let router = Router::new()
        .route("/relay", forward.clone())
        // Path the dashboard used when this ran as a serverless function.
        .route("/.netlify/functions/api-proxy", forward)
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
    pub async fn build(settings: Settings) -> Result<Self, AppError> {
        settings.validate()?;

        let router = build_router(AppState::from_settings(&settings.relay)?);

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
