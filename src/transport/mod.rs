//! Transport adapters: the HTTP request seam, the response normaliser and the
//! WebSocket connector.
//!
//! The client never talks to `reqwest` directly. Every gateway request goes
//! through the [`Transport`] trait so that call logic (headers, endpoints, the
//! poll loop) stays independent of the wire implementation.

pub mod http;
pub mod response;
pub mod ws;

pub use http::HttpTransport;
pub use response::ResponseEnvelope;

use crate::Result;
use async_trait::async_trait;

/// HTTP verbs used by the gateway API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

/// A fully prepared gateway request (path relative to the gateway base URL).
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayRequest {
    pub method: Method,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
}

impl GatewayRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn post(path: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            method: Method::Post,
            path: path.into(),
            headers: Vec::new(),
            body: Some(body),
        }
    }

    pub fn with_headers(mut self, headers: Vec<(String, String)>) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Executes gateway requests and returns normalised envelopes.
///
/// Implementations must map network failures to [`TransportError`] and leave
/// non-2xx answers to the caller (`ok == false` in the envelope).
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: GatewayRequest) -> Result<ResponseEnvelope>;
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("WebSocket error: {0}")]
    WebSocket(Box<tokio_tungstenite::tungstenite::Error>),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Transport error: {0}")]
    Other(String),
}

impl From<tokio_tungstenite::tungstenite::Error> for TransportError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        TransportError::WebSocket(Box::new(e))
    }
}
