pub mod config;
pub mod handlers;
pub mod services;
pub mod startup;

use services::ProviderClient;
use std::sync::Arc;

pub use startup::{build_router, Application};

/// Shared application state. Holds nothing request-derived.
#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<ProviderClient>,
}

impl AppState {
    pub fn new(provider: Arc<ProviderClient>) -> Self {
        Self { provider }
    }
}
