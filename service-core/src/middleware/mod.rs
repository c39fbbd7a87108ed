pub mod metrics;
pub mod security_headers;
pub mod tracing;

use axum::{middleware::from_fn, Router};
use tower_http::trace::TraceLayer;

/// Wraps a service router with the shared request pipeline: request ids,
/// per-request span, metrics and security headers.
pub fn with_common_layers<S>(router: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router
        .layer(from_fn(security_headers::security_headers_middleware))
        .layer(from_fn(metrics::metrics_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(tracing::REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                ::tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    path = %request.uri().path(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(tracing::request_id_middleware))
}
