//! Blocking HTTP client backed by `reqwest`.
//!
//! Upstream errors are stripped of their URL before they are turned into a
//! [`TransportError`], since query strings can carry API tokens.

use std::time::Duration;

use reqwest::blocking::Client;

use crate::traits::{
    HttpClient, HttpMethod, HttpRequest, HttpResponse, TransportError, TransportErrorKind,
};

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// [`HttpClient`] over a shared `reqwest` blocking client.
#[derive(Clone, Debug)]
pub struct ReqwestClient {
    inner: Client,
}

impl ReqwestClient {
    /// Client with [`DEFAULT_TIMEOUT`].
    pub fn new() -> Result<Self, TransportError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Client with a custom timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, TransportError> {
        let inner = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("rs-inky/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(classify)?;
        Ok(Self { inner })
    }
}

fn classify(err: reqwest::Error) -> TransportError {
    let kind = if err.is_timeout() {
        TransportErrorKind::Timeout
    } else if err.is_connect() {
        TransportErrorKind::Connect
    } else {
        TransportErrorKind::Other
    };
    TransportError::new(kind, err.without_url().to_string())
}

impl HttpClient for ReqwestClient {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = match request.method {
            HttpMethod::Get => self.inner.get(&request.url),
            HttpMethod::Post => self.inner.post(&request.url),
        };
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().map_err(classify)?;
        let status = response.status().as_u16();
        let body = response.bytes().map_err(classify)?;
        Ok(HttpResponse::new(status, body.to_vec()))
    }
}
