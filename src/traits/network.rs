//! Network abstraction for upstream data providers.
//!
//! Providers never construct a concrete client. They build an
//! [`HttpRequest`] and hand it to whatever [`HttpClient`] the factory gave
//! them: the blocking `reqwest` client in production, `MockHttp` in tests.
//!
//! # Requests in use
//!
//! ```text
//! GET  https://api.openweathermap.org/data/3.0/onecall?lat=..&lon=..   weather
//! GET  https://huxley2.azurewebsites.net/departures/MZH/to/LBG/3       Huxley2
//! POST https://lite.realtime.nationalrail.co.uk/OpenLDBWS/ldb11.asmx   OpenLive (SOAP)
//! ```

use thiserror::Error;

// ============================================================================
// HTTP Client Trait (Sync-First Design)
// ============================================================================

/// Blocking HTTP client.
///
/// Implementations must not put query strings or headers into
/// [`TransportError`] messages: both can carry tokens.
pub trait HttpClient: Send + Sync {
    /// Perform one request. Non-2xx statuses are returned as responses, not
    /// errors.
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// The request could not be completed at the transport level.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind:?}: {message}")]
pub struct TransportError {
    /// Broad failure class.
    pub kind: TransportErrorKind,
    /// Sanitized detail.
    pub message: String,
}

impl TransportError {
    /// Create a transport error.
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Transport failure classes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// DNS, connect or TLS failure.
    Connect,
    /// No answer in time.
    Timeout,
    /// Anything else.
    Other,
}

/// HTTP request methods.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HttpMethod {
    /// HTTP GET request.
    Get,
    /// HTTP POST request.
    Post,
}

/// An outgoing HTTP request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpRequest {
    /// HTTP method.
    pub method: HttpMethod,
    /// URL without query string.
    pub url: String,
    /// Query parameters, appended in order.
    pub query: Vec<(String, String)>,
    /// Extra headers.
    pub headers: Vec<(String, String)>,
    /// Request body, if present (for POST).
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    /// A GET request.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            url: url.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// A POST request with a body.
    pub fn post(url: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            method: HttpMethod::Post,
            url: url.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: Some(body.into()),
        }
    }

    /// Append a query parameter.
    pub fn with_query(mut self, key: &str, value: impl Into<String>) -> Self {
        self.query.push((key.to_string(), value.into()));
        self
    }

    /// Append a header.
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }

    /// Value of the first query parameter named `key`.
    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Returns the body as a UTF-8 string, if valid.
    pub fn body_str(&self) -> Option<&str> {
        self.body
            .as_ref()
            .and_then(|b| core::str::from_utf8(b).ok())
    }
}

/// A response from upstream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code (e.g., 200, 401, 500).
    pub status: u16,
    /// Response body as bytes.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// A response with the given status and body.
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Creates a 200 OK response.
    pub fn ok(body: &str) -> Self {
        Self::new(200, body.as_bytes())
    }

    /// True for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Returns the body as a UTF-8 string, if valid.
    pub fn body_str(&self) -> Option<&str> {
        core::str::from_utf8(&self.body).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_builder() {
        let request = HttpRequest::get("https://example.org/departures")
            .with_query("accessToken", "t0k")
            .with_header("Accept", "application/json");
        assert_eq!(request.method, HttpMethod::Get);
        assert_eq!(request.query_param("accessToken"), Some("t0k"));
        assert_eq!(request.query_param("missing"), None);
        assert!(request.body.is_none());
    }

    #[test]
    fn post_body_roundtrip() {
        let request = HttpRequest::post("https://example.org/soap", "<Envelope/>");
        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(request.body_str(), Some("<Envelope/>"));
    }

    #[test]
    fn response_success_range() {
        assert!(HttpResponse::ok("{}").is_success());
        assert!(!HttpResponse::new(401, "").is_success());
        assert!(!HttpResponse::new(302, "").is_success());
    }
}
