//! service-core: Shared infrastructure for the dealer dashboard services.
pub mod config;
pub mod error;
pub mod health;
pub mod middleware;
pub mod observability;
pub mod shutdown;

pub use axum;
pub use reqwest;
pub use serde;
pub use serde_json;
pub use tokio;
pub use tower;
pub use tower_http;
pub use tracing;
