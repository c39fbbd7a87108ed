pub mod provider;

pub use provider::{ProviderClient, TokenExchange};
