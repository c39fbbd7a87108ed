//! W3C Trace Context propagation for outgoing HTTP calls.
//!
//! Every call the services make to the identity provider, the upstream APIs
//! or each other carries the current span's `traceparent`, so a dashboard
//! request can be followed through the relay into the upstream call.
//!
//! See: https://www.w3.org/TR/trace-context/

use opentelemetry::trace::TraceContextExt;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, RequestBuilder};
use tracing::Span;
use tracing_opentelemetry::OpenTelemetrySpanExt;

pub const TRACEPARENT_HEADER: &str = "traceparent";
pub const TRACESTATE_HEADER: &str = "tracestate";

/// Formats the current span context as `traceparent`/`tracestate` headers.
/// Returns an empty map when there is no sampled OpenTelemetry span.
pub fn current_trace_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();

    let context = Span::current().context();
    let otel_span = context.span();
    let span_context = otel_span.span_context();

    if !span_context.is_valid() {
        return headers;
    }

    // version-trace_id-span_id-trace_flags
    let traceparent = format!(
        "00-{}-{}-{:02x}",
        span_context.trace_id(),
        span_context.span_id(),
        span_context.trace_flags().to_u8()
    );
    if let Ok(value) = HeaderValue::from_str(&traceparent) {
        headers.insert(TRACEPARENT_HEADER, value);
    }

    let tracestate = span_context.trace_state().header();
    if !tracestate.is_empty() {
        if let Ok(value) = HeaderValue::from_str(&tracestate) {
            headers.insert(TRACESTATE_HEADER, value);
        }
    }

    headers
}

/// Extension trait for `reqwest::Client` that starts requests with the
/// trace headers already attached.
pub trait TracedClientExt {
    fn traced_get(&self, url: impl reqwest::IntoUrl) -> RequestBuilder;
    fn traced_post(&self, url: impl reqwest::IntoUrl) -> RequestBuilder;
}

impl TracedClientExt for Client {
    fn traced_get(&self, url: impl reqwest::IntoUrl) -> RequestBuilder {
        self.get(url).headers(current_trace_headers())
    }

    fn traced_post(&self, url: impl reqwest::IntoUrl) -> RequestBuilder {
        self.post(url).headers(current_trace_headers())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_headers_outside_a_span() {
        assert!(current_trace_headers().is_empty());
    }

    #[test]
    fn traced_requests_keep_caller_headers() {
        let request = Client::new()
            .traced_get("http://localhost/organizations")
            .header("x-jd-access-token", "tok")
            .build()
            .unwrap();

        assert_eq!(request.headers()["x-jd-access-token"], "tok");
        assert!(request.headers().get(TRACEPARENT_HEADER).is_none());
    }
}
