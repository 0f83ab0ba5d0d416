//! W3C Trace Context propagation for outbound HTTP calls.
//!
//! Services that talk to HTTP backends (the document database, other services)
//! use [`TracedClientExt`] so every outbound request carries the current span's
//! `traceparent`/`tracestate` headers.
//!
//! See: https://www.w3.org/TR/trace-context/

use opentelemetry::trace::TraceContextExt;
use reqwest::IntoUrl;
use reqwest::header::HeaderMap;
use tracing::Span;
use tracing_opentelemetry::OpenTelemetrySpanExt;

/// Header name for W3C traceparent
pub const TRACEPARENT_HEADER: &str = "traceparent";

/// Header name for W3C tracestate
pub const TRACESTATE_HEADER: &str = "tracestate";

/// Inject current trace context into HTTP request headers.
///
/// Does nothing when there is no active OpenTelemetry span, e.g. when OTLP
/// export is disabled.
pub fn inject_trace_context(headers: &mut HeaderMap) {
    let span = Span::current();
    let context = span.context();
    let otel_span = context.span();
    let span_context = otel_span.span_context();

    if span_context.is_valid() {
        // version-trace_id-span_id-trace_flags
        let traceparent = format!(
            "00-{}-{}-{:02x}",
            span_context.trace_id(),
            span_context.span_id(),
            span_context.trace_flags().to_u8()
        );

        if let Ok(value) = traceparent.parse() {
            headers.insert(TRACEPARENT_HEADER, value);
        }

        let tracestate_str = span_context.trace_state().header();
        if !tracestate_str.is_empty()
            && let Ok(value) = tracestate_str.parse()
        {
            headers.insert(TRACESTATE_HEADER, value);
        }
    }
}

/// A reqwest request builder that injects trace headers when sent.
pub struct TracedRequest {
    request: reqwest::RequestBuilder,
}

impl TracedRequest {
    pub fn new(request: reqwest::RequestBuilder) -> Self {
        Self { request }
    }

    pub fn header(self, key: &str, value: &str) -> Self {
        Self {
            request: self.request.header(key, value),
        }
    }

    pub fn json<T: serde::Serialize + ?Sized>(self, json: &T) -> Self {
        Self {
            request: self.request.json(json),
        }
    }

    pub fn query<T: serde::Serialize + ?Sized>(self, query: &T) -> Self {
        Self {
            request: self.request.query(query),
        }
    }

    /// Apply basic auth when a username is present.
    pub fn basic_auth_opt(self, username: Option<&str>, password: Option<&str>) -> Self {
        match username {
            Some(user) => Self {
                request: self.request.basic_auth(user, password),
            },
            None => self,
        }
    }

    /// Send the request with trace context headers injected.
    pub async fn send(self) -> Result<reqwest::Response, reqwest::Error> {
        let mut headers = HeaderMap::new();
        inject_trace_context(&mut headers);

        self.request.headers(headers).send().await
    }
}

/// Extension trait for reqwest::Client to create traced requests.
pub trait TracedClientExt {
    fn traced_get<U: IntoUrl>(&self, url: U) -> TracedRequest;
    fn traced_post<U: IntoUrl>(&self, url: U) -> TracedRequest;
    fn traced_put<U: IntoUrl>(&self, url: U) -> TracedRequest;
    fn traced_delete<U: IntoUrl>(&self, url: U) -> TracedRequest;
}

impl TracedClientExt for reqwest::Client {
    fn traced_get<U: IntoUrl>(&self, url: U) -> TracedRequest {
        TracedRequest::new(self.get(url))
    }

    fn traced_post<U: IntoUrl>(&self, url: U) -> TracedRequest {
        TracedRequest::new(self.post(url))
    }

    fn traced_put<U: IntoUrl>(&self, url: U) -> TracedRequest {
        TracedRequest::new(self.put(url))
    }

    fn traced_delete<U: IntoUrl>(&self, url: U) -> TracedRequest {
        TracedRequest::new(self.delete(url))
    }
}
