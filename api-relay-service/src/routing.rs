//! Logical endpoint to upstream URL resolution.
//!
//! The table is compiled once from configuration. Resolution never lets an
//! endpoint leave its route's base URL, so a caller's token is only ever
//! sent to a configured upstream.

use crate::config::{RelaySettings, UpstreamRoute};
use reqwest::header::HeaderValue;
use reqwest::Url;
use service_core::error::AppError;

#[derive(Debug)]
struct CompiledRoute {
    name: String,
    prefix: Option<String>,
    base: Url,
    accept: HeaderValue,
    disable_paging: bool,
}

impl CompiledRoute {
    fn compile(route: &UpstreamRoute) -> Result<Self, AppError> {
        let mut base_url = route.base_url.trim().to_string();
        // Url::join replaces the last segment unless the base ends with a slash.
        if !base_url.ends_with('/') {
            base_url.push('/');
        }

        let base = Url::parse(&base_url).map_err(|e| {
            AppError::ConfigError(anyhow::anyhow!(
                "route '{}' has invalid base_url '{}': {}",
                route.name,
                route.base_url,
                e
            ))
        })?;

        let accept = HeaderValue::from_str(&route.accept).map_err(|e| {
            AppError::ConfigError(anyhow::anyhow!(
                "route '{}' has invalid accept header: {}",
                route.name,
                e
            ))
        })?;

        Ok(Self {
            name: route.name.clone(),
            prefix: route.prefix.clone(),
            base,
            accept,
            disable_paging: route.disable_paging,
        })
    }

    fn matches(&self, endpoint: &str) -> bool {
        self.prefix
            .as_deref()
            .is_some_and(|prefix| endpoint.starts_with(prefix))
    }
}

/// Where a relay request goes and which headers the upstream expects.
#[derive(Debug)]
pub struct ResolvedEndpoint<'a> {
    pub url: Url,
    pub route: &'a str,
    pub accept: &'a HeaderValue,
    pub disable_paging: bool,
}

#[derive(Debug)]
pub struct RouteTable {
    prefixed: Vec<CompiledRoute>,
    default: CompiledRoute,
}

impl RouteTable {
    pub fn from_settings(settings: &RelaySettings) -> Result<Self, AppError> {
        let prefixed = settings
            .routes
            .iter()
            .map(CompiledRoute::compile)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            prefixed,
            default: CompiledRoute::compile(&settings.default_route)?,
        })
    }

    /// Resolve a logical endpoint such as `organizations/123/fields?status=all`.
    pub fn resolve(&self, endpoint: &str) -> Result<ResolvedEndpoint<'_>, AppError> {
        let relative = endpoint.trim().trim_start_matches('/');
        if relative.is_empty() {
            return Err(AppError::InvalidEndpoint("Endpoint is empty.".to_string()));
        }

        let route = self
            .prefixed
            .iter()
            .find(|route| route.matches(relative))
            .unwrap_or(&self.default);

        let url = route.base.join(relative).map_err(|e| {
            AppError::InvalidEndpoint(format!("Endpoint cannot be resolved: {}", e))
        })?;

        let stays_within_base = url.origin() == route.base.origin()
            && url.path().starts_with(route.base.path());
        if !stays_within_base {
            tracing::warn!(
                route = %route.name,
                endpoint = %endpoint,
                "Rejected endpoint resolving outside its upstream"
            );
            return Err(AppError::InvalidEndpoint(
                "Endpoint must be a path on the upstream API.".to_string(),
            ));
        }

        Ok(ResolvedEndpoint {
            url,
            route: &route.name,
            accept: &route.accept,
            disable_paging: route.disable_paging,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> RouteTable {
        RouteTable::from_settings(&RelaySettings::default()).unwrap()
    }

    #[test]
    fn equipment_prefix_routes_to_equipment_host() {
        let table = table();
        let resolved = table.resolve("equipment/123").unwrap();

        assert_eq!(resolved.url.host_str(), Some("equipmentapi.deere.com"));
        assert_eq!(
            resolved.url.as_str(),
            "https://equipmentapi.deere.com/isg/equipment/123"
        );
        assert_eq!(resolved.route, "equipment");
        assert_eq!(resolved.accept, "application/json");
        assert!(!resolved.disable_paging);
    }

    #[test]
    fn other_endpoints_route_to_platform_host() {
        let table = table();
        let resolved = table.resolve("organizations").unwrap();

        assert_eq!(resolved.url.host_str(), Some("sandboxapi.deere.com"));
        assert_eq!(
            resolved.url.as_str(),
            "https://sandboxapi.deere.com/platform/organizations"
        );
        assert_eq!(resolved.accept, "application/vnd.deere.axiom.v3+json");
        assert!(resolved.disable_paging);
    }

    #[test]
    fn query_strings_and_leading_slashes_are_kept_relative() {
        let table = table();

        let resolved = table.resolve("/organizations/42/fields?status=all").unwrap();
        assert_eq!(
            resolved.url.as_str(),
            "https://sandboxapi.deere.com/platform/organizations/42/fields?status=all"
        );

        let resolved = table.resolve("equipment?status=all").unwrap();
        assert_eq!(
            resolved.url.as_str(),
            "https://equipmentapi.deere.com/isg/equipment?status=all"
        );
    }

    #[test]
    fn endpoints_escaping_the_base_are_rejected() {
        let table = table();

        for endpoint in [
            "https://attacker.example/collect",
            "../admin",
            "organizations/../../admin",
            "%2e%2e/admin",
        ] {
            assert!(
                matches!(table.resolve(endpoint), Err(AppError::InvalidEndpoint(_))),
                "{endpoint} should be rejected"
            );
        }
    }

    #[test]
    fn routes_come_from_configuration() {
        let mut settings = RelaySettings::default();
        settings.routes[0].prefix = Some("equipments".to_string());

        let table = RouteTable::from_settings(&settings).unwrap();

        assert_eq!(
            table.resolve("equipments/9").unwrap().route,
            "equipment"
        );
        assert_eq!(table.resolve("equipment/9").unwrap().route, "platform");
    }

    #[test]
    fn base_urls_without_trailing_slash_are_normalized() {
        let mut settings = RelaySettings::default();
        settings.default_route.base_url = "https://sandboxapi.deere.com/platform".to_string();

        let table = RouteTable::from_settings(&settings).unwrap();

        assert_eq!(
            table.resolve("organizations").unwrap().url.as_str(),
            "https://sandboxapi.deere.com/platform/organizations"
        );
    }

    #[test]
    fn invalid_base_url_is_a_configuration_error() {
        let mut settings = RelaySettings::default();
        settings.default_route.base_url = "not a url".to_string();

        assert!(matches!(
            RouteTable::from_settings(&settings),
            Err(AppError::ConfigError(_))
        ));
    }
}
