use serde::Deserialize;
use service_core::config::{layered, require_non_empty, ServerSettings, TelemetrySettings};
use service_core::error::AppError;

pub const DEFAULT_ACCESS_TOKEN_HEADER: &str = "x-jd-access-token";
pub const PLATFORM_BASE_URL: &str = "https://sandboxapi.deere.com/platform/";
pub const EQUIPMENT_BASE_URL: &str = "https://equipmentapi.deere.com/isg/";

#[derive(Deserialize, Clone, Debug)]
pub struct Settings {
    pub server: ServerSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
    #[serde(default)]
    pub relay: RelaySettings,
}

#[derive(Deserialize, Clone, Debug)]
pub struct RelaySettings {
    /// Request header carrying the caller's access token.
    #[serde(default = "default_access_token_header")]
    pub access_token_header: String,
    /// Prefix routes, checked in order.
    #[serde(default = "default_routes")]
    pub routes: Vec<UpstreamRoute>,
    /// Used when no prefix route matches.
    #[serde(default = "default_platform_route")]
    pub default_route: UpstreamRoute,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            access_token_header: default_access_token_header(),
            routes: default_routes(),
            default_route: default_platform_route(),
        }
    }
}

/// One upstream host and the headers it expects.
#[derive(Deserialize, Clone, Debug)]
pub struct UpstreamRoute {
    pub name: String,
    /// Endpoints starting with this prefix use the route. Ignored on the default route.
    #[serde(default)]
    pub prefix: Option<String>,
    pub base_url: String,
    pub accept: String,
    /// Sends `No_paging: True` so the upstream returns the whole collection.
    #[serde(default)]
    pub disable_paging: bool,
}

fn default_access_token_header() -> String {
    DEFAULT_ACCESS_TOKEN_HEADER.to_string()
}

fn default_routes() -> Vec<UpstreamRoute> {
    vec![UpstreamRoute {
        name: "equipment".to_string(),
        prefix: Some("equipment".to_string()),
        base_url: EQUIPMENT_BASE_URL.to_string(),
        accept: "application/json".to_string(),
        disable_paging: false,
    }]
}

fn default_platform_route() -> UpstreamRoute {
    UpstreamRoute {
        name: "platform".to_string(),
        prefix: None,
        base_url: PLATFORM_BASE_URL.to_string(),
        accept: "application/vnd.deere.axiom.v3+json".to_string(),
        disable_paging: true,
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), AppError> {
        require_non_empty("relay.access_token_header", &self.relay.access_token_header)?;

        for route in &self.relay.routes {
            let prefix = route.prefix.as_deref().unwrap_or_default();
            require_non_empty(&format!("relay.routes[{}].prefix", route.name), prefix)?;
        }

        // Base URLs and header values are checked when the route table compiles.
        crate::routing::RouteTable::from_settings(&self.relay).map(|_| ())
    }
}

pub fn get_configuration() -> Result<Settings, AppError> {
    let defaults = config::Config::builder().set_default("server.port", 8082_i64)?;

    let settings: Settings = layered("api-relay-service", defaults)?
        .build()?
        .try_deserialize()?;

    settings.validate()?;
    Ok(settings)
}
