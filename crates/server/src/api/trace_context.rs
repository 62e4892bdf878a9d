//! W3C Trace Context propagation.
//!
//! Reads `traceparent`/`tracestate` from incoming requests so spans for an
//! analysis join the caller's trace when OpenTelemetry is enabled.

use axum::extract::Request;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use opentelemetry::propagation::Extractor;
use opentelemetry::{global, trace::TraceContextExt};
use tracing_opentelemetry::OpenTelemetrySpanExt;

struct HeaderExtractor<'a>(&'a HeaderMap);

impl Extractor for HeaderExtractor<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(axum::http::HeaderName::as_str).collect()
    }
}

/// Axum middleware that parents the request span on a remote `traceparent`.
pub async fn propagate_trace_context(request: Request, next: Next) -> Response {
    let parent = global::get_text_map_propagator(|p| p.extract(&HeaderExtractor(request.headers())));

    if parent.span().span_context().is_remote() {
        tracing::Span::current().set_parent(parent);
    }

    next.run(request).await
}
