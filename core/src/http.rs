//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! Requests and responses are plain data here. Building an `HttpRequest` and
//! parsing an `HttpResponse` never touches the network — executing the
//! round-trip belongs to an [`HttpTransport`] implementation supplied by the
//! caller. This separation keeps the client deterministic and easy to test:
//! requests can be recorded, compared, and replayed without a server.
//!
//! All fields are owned (`String`, `Vec`) so values can cross thread
//! boundaries and sit in test fixtures without lifetime concerns.

use thiserror::Error;

/// HTTP method for a request. The vendor surface uses only these two.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// An HTTP request described as plain data.
///
/// Built by `SoftixClient::build_*` methods; whoever executes it feeds the
/// resulting `HttpResponse` back into the matching `parse_*` method.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

/// An HTTP response described as plain data.
///
/// Whatever came back from the wire, including error statuses; the `parse_*`
/// methods classify and decode it.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

/// The transport produced no response at all (connect failure, TLS, timeout).
///
/// Distinct from a vendor error: the vendor never answered. Facade operations
/// surface this as `SoftixError::Transport`.
#[derive(Debug, Clone, Error)]
#[error("transport error: {0}")]
pub struct TransportError(pub String);

/// Blocking executor for [`HttpRequest`] values.
///
/// The client never opens sockets itself; callers implement this trait over
/// whatever HTTP stack they run (the integration tests use `ureq`). One call
/// maps to one round-trip — retries, redirects, and timeouts are the
/// implementation's business.
pub trait HttpTransport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}
