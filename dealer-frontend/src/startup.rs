use crate::config::{SessionSettings, Settings};
use crate::handlers::{
    api::{equipment, field_operations, organization_view, organizations},
    auth::{callback, login, logout, session_status},
};
use crate::services::DashboardServices;
use crate::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::health::health_routes;
use service_core::middleware::with_common_layers;
use service_core::shutdown::shutdown_signal;
use time::Duration;
use tokio::net::TcpListener;
use tower_sessions::{cookie::SameSite, Expiry, MemoryStore, SessionManagerLayer};

pub const SERVICE_NAME: &str = "dealer-frontend";

pub fn build_router(state: AppState, session: &SessionSettings) -> Router {
    let expiry = match session.inactivity_minutes {
        Some(minutes) => Expiry::OnInactivity(Duration::minutes(minutes)),
        None => Expiry::OnSessionEnd,
    };

    // Lax so the cookie comes back on the provider's top-level redirect.
    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(session.secure_cookie)
        .with_same_site(SameSite::Lax)
        .with_expiry(expiry);

    let router = Router::new()
        .route("/login", get(login))
        .route("/auth/callback", get(callback))
        .route("/logout", post(logout))
        .route("/api/session", get(session_status))
        .route("/api/organizations", get(organizations))
        .route("/api/organizations/:org_id", get(organization_view))
        .route(
            "/api/organizations/:org_id/fields/:field_id/operations",
            get(field_operations),
        )
        .route("/api/equipment", get(equipment))
        .layer(session_layer)
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

        let state = AppState::new(DashboardServices::from_settings(&settings));
        let router = build_router(state, &settings.session);

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
