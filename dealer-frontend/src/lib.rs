pub mod config;
pub mod errors;
pub mod handlers;
pub mod resources;
pub mod services;
pub mod session;
pub mod startup;

use errors::{DashboardError, ErrorPage};
use services::DashboardServices;
use session::SessionController;
use std::sync::Arc;
use tower_sessions::Session;

pub use startup::{build_router, Application};

#[derive(Clone)]
pub struct AppState {
    pub services: Arc<DashboardServices>,
}

impl AppState {
    pub fn new(services: DashboardServices) -> Self {
        Self {
            services: Arc::new(services),
        }
    }

    /// Controller bound to the requesting browser's session.
    pub fn controller(&self, session: Session) -> SessionController<Session> {
        SessionController::new(session, self.services.clone())
    }

    pub fn error_page(&self, error: DashboardError, org_id: Option<&str>) -> ErrorPage {
        ErrorPage::new(error, &self.services.connections, org_id)
    }
}
