pub mod ureq_transport;

pub use ureq_transport::UreqTransport;

use std::future::Future;
use std::pin::Pin;

use crate::models::{CoreError, CoreErrorKind, CoreResult, HttpMethod};

pub type HttpResponseFuture = Pin<Box<dyn Future<Output = CoreResult<HttpResponse>> + Send>>;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    pub fn json_body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.url.trim().is_empty() {
            return Err(CoreError::new(
                CoreErrorKind::InvalidInput,
                "request url must not be empty",
            ));
        }

        if self.query.iter().any(|(name, _)| name.is_empty()) {
            return Err(CoreError::new(
                CoreErrorKind::InvalidInput,
                "query parameter names must not be empty",
            ));
        }

        Ok(())
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Non-2xx responses become `HttpStatus` errors carrying the body text.
    pub fn into_json(self) -> CoreResult<serde_json::Value> {
        if !self.is_success() {
            return Err(CoreError::http_status(self.status, self.body_text()));
        }

        serde_json::from_slice(&self.body).map_err(|error| CoreError {
            status: Some(self.status),
            ..CoreError::new(
                CoreErrorKind::InvalidResponse,
                format!("response body is not valid JSON: {error}"),
            )
        })
    }
}

/// Non-2xx statuses are returned as responses; only transport-level failures
/// are errors.
pub trait HttpTransport: Send + Sync {
    fn send(&self, request: HttpRequest) -> HttpResponseFuture;
}

pub fn send_validated(transport: &dyn HttpTransport, request: HttpRequest) -> HttpResponseFuture {
    if let Err(error) = request.validate() {
        return Box::pin(async move { Err(error) });
    }
    transport.send(request)
}
