use crate::transport::TransportError;
use thiserror::Error;

/// Structured error context for better error handling and debugging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    /// Field path or configuration key that caused the error (e.g., "builder.api_key", "response.callId")
    pub field_path: Option<String>,
    /// Additional context about the error (e.g., expected type, actual value)
    pub details: Option<String>,
    /// Source of the error (e.g., "client_builder", "call_invoker")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self {
            field_path: None,
            details: None,
            source: None,
        }
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Unified error type for the gateway client.
///
/// Request-level failures (`Transport`, `Remote`, `MalformedBody`, `CallTimeout`)
/// are returned from the call futures. `Subscription` errors never reject a
/// future: they are delivered once to the registered event observer.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Network transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Remote error: HTTP {status}{}", format_message(.message))]
    Remote { status: u16, message: Option<String> },

    #[error("Malformed response body (HTTP {status}): {source}")]
    MalformedBody {
        status: u16,
        #[source]
        source: serde_json::Error,
    },

    #[error("Call {call_id} did not reach a terminal status within {elapsed_ms} ms")]
    CallTimeout { call_id: String, elapsed_ms: u128 },

    #[error("Subscription error: {message}")]
    Subscription {
        message: String,
        #[source]
        source: Option<Box<Error>>,
    },

    #[error("Invalid gateway response: {message}{}", format_context(.context))]
    InvalidResponse {
        message: String,
        context: ErrorContext,
    },

    #[error("Configuration error: {message}{}", format_context(.context))]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    #[error("Validation error: {message}{}", format_context(.context))]
    Validation {
        message: String,
        context: ErrorContext,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

fn format_message(message: &Option<String>) -> String {
    match message {
        Some(m) if !m.is_empty() => format!(": {}", m),
        _ => String::new(),
    }
}

// Helper function to format error context for display
fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref field) = ctx.field_path {
        parts.push(format!("field: {}", field));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

impl Error {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::configuration_with_context(msg, ErrorContext::new())
    }

    /// Create a new configuration error with structured context
    pub fn configuration_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    /// Create a new validation error with structured context
    pub fn validation_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Validation {
            message: msg.into(),
            context,
        }
    }

    /// Create a new invalid-response error with structured context
    pub fn invalid_response_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::InvalidResponse {
            message: msg.into(),
            context,
        }
    }

    /// Wrap a failure of the event channel so it can be handed to an observer.
    pub fn subscription(msg: impl Into<String>, source: Option<Error>) -> Self {
        Error::Subscription {
            message: msg.into(),
            source: source.map(Box::new),
        }
    }

    /// HTTP status carried by the error, if the gateway answered at all.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Error::Remote { status, .. } | Error::MalformedBody { status, .. } => Some(*status),
            Error::Subscription {
                source: Some(inner),
                ..
            } => inner.http_status(),
            _ => None,
        }
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Configuration { context, .. }
            | Error::Validation { context, .. }
            | Error::InvalidResponse { context, .. } => Some(context),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_error_includes_gateway_message() {
        let err = Error::Remote {
            status: 404,
            message: Some("function not found".to_string()),
        };
        assert_eq!(err.to_string(), "Remote error: HTTP 404: function not found");
        assert_eq!(err.http_status(), Some(404));
    }

    #[test]
    fn remote_error_without_message_shows_status_only() {
        let err = Error::Remote {
            status: 502,
            message: None,
        };
        assert_eq!(err.to_string(), "Remote error: HTTP 502");
    }

    #[test]
    fn context_is_rendered_in_display() {
        let err = Error::configuration_with_context(
            "api key must not be empty",
            ErrorContext::new()
                .with_field_path("builder.api_key")
                .with_source("client_builder"),
        );
        assert_eq!(
            err.to_string(),
            "Configuration error: api key must not be empty (field: builder.api_key, source: client_builder)"
        );
        assert!(err.context().is_some());
    }

    #[test]
    fn subscription_error_exposes_inner_status() {
        let inner = Error::Remote {
            status: 401,
            message: None,
        };
        let err = Error::subscription("contract lookup failed", Some(inner));
        assert_eq!(err.http_status(), Some(401));
        assert!(std::error::Error::source(&err).is_some());
    }
}
