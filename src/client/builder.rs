use crate::client::core::GatewayClient;
use crate::client::polling::PollPolicy;
use crate::client::types::{Session, Target};
use crate::events::EventSubscriber;
use crate::transport::{ws, HttpTransport, Transport};
use crate::{Error, ErrorContext, Result};
use std::sync::Arc;
use std::time::Duration;

/// Default public gateway.
pub const DEFAULT_BASE_URL: &str = "https://api.emblock.co";

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Builder for creating clients with custom configuration.
///
/// Explicit builder values win over `GATEWAY_*` environment variables, which
/// win over built-in defaults.
pub struct GatewayClientBuilder {
    api_key: Option<String>,
    target: Option<Target>,
    base_url: Option<String>,
    ws_url: Option<String>,
    http_timeout: Option<Duration>,
    poll_policy: Option<PollPolicy>,
    transport: Option<Arc<dyn Transport>>,
}

impl GatewayClientBuilder {
    pub fn new() -> Self {
        Self {
            api_key: None,
            target: None,
            base_url: None,
            ws_url: None,
            http_timeout: None,
            poll_policy: None,
            transport: None,
        }
    }

    /// Bearer token sent with every request (env: `GATEWAY_API_KEY`).
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Address a contract directly (env: `GATEWAY_CONTRACT_ID`).
    pub fn contract(mut self, contract_id: impl Into<String>) -> Self {
        self.target = Some(Target::Contract(contract_id.into()));
        self
    }

    /// Address the current contract of a project (env: `GATEWAY_PROJECT_ID`).
    pub fn project(mut self, project_id: impl Into<String>) -> Self {
        self.target = Some(Target::Project(project_id.into()));
        self
    }

    pub fn target(mut self, target: Target) -> Self {
        self.target = Some(target);
        self
    }

    /// Gateway base URL (env: `GATEWAY_BASE_URL`, default `https://api.emblock.co`).
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Notification socket URL (env: `GATEWAY_WS_URL`). Derived from the base
    /// URL when unset.
    pub fn ws_url(mut self, ws_url: impl Into<String>) -> Self {
        self.ws_url = Some(ws_url.into());
        self
    }

    /// Per-request HTTP timeout (env: `GATEWAY_HTTP_TIMEOUT_SECS`, default 30s).
    pub fn http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = Some(timeout);
        self
    }

    /// Status polling policy. When unset, the default policy with
    /// `GATEWAY_POLL_*` overrides applies.
    pub fn poll_policy(mut self, policy: PollPolicy) -> Self {
        self.poll_policy = Some(policy);
        self
    }

    /// Replace the HTTP transport.
    ///
    /// This is primarily for testing with scripted transports. The base URL is
    /// then only used to derive the socket URL.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<GatewayClient> {
        let api_key = self
            .api_key
            .or_else(|| std::env::var("GATEWAY_API_KEY").ok())
            .ok_or_else(|| {
                Error::configuration_with_context(
                    "API key required",
                    ErrorContext::new()
                        .with_field_path("builder.api_key")
                        .with_source("client_builder"),
                )
            })?;

        let target = self
            .target
            .or_else(|| std::env::var("GATEWAY_CONTRACT_ID").ok().map(Target::Contract))
            .or_else(|| std::env::var("GATEWAY_PROJECT_ID").ok().map(Target::Project))
            .ok_or_else(|| {
                Error::configuration_with_context(
                    "a contract or project id must be specified",
                    ErrorContext::new()
                        .with_field_path("builder.target")
                        .with_source("client_builder"),
                )
            })?;

        let session = Arc::new(Session::new(api_key, target)?);

        let base_url = self
            .base_url
            .or_else(|| std::env::var("GATEWAY_BASE_URL").ok())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        url::Url::parse(&base_url).map_err(|e| {
            Error::configuration_with_context(
                format!("invalid base URL: {}", e),
                ErrorContext::new()
                    .with_field_path("builder.base_url")
                    .with_details(base_url.clone())
                    .with_source("client_builder"),
            )
        })?;

        let ws_url = match self.ws_url.or_else(|| std::env::var("GATEWAY_WS_URL").ok()) {
            Some(explicit) => {
                url::Url::parse(&explicit).map_err(|e| {
                    Error::configuration_with_context(
                        format!("invalid socket URL: {}", e),
                        ErrorContext::new()
                            .with_field_path("builder.ws_url")
                            .with_details(explicit.clone())
                            .with_source("client_builder"),
                    )
                })?;
                explicit
            }
            None => ws::notifications_url(&base_url)?,
        };

        let http_timeout = self.http_timeout.unwrap_or_else(|| {
            Duration::from_secs(
                std::env::var("GATEWAY_HTTP_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse::<u64>().ok())
                    .filter(|secs| *secs > 0)
                    .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS),
            )
        });

        let transport: Arc<dyn Transport> = match self.transport {
            Some(t) => t,
            None => Arc::new(HttpTransport::new(&base_url, http_timeout)?),
        };

        let poll = self
            .poll_policy
            .unwrap_or_else(|| PollPolicy::default().with_env_overrides());

        let events = EventSubscriber::new(session.clone(), transport.clone(), ws_url);

        Ok(GatewayClient {
            session,
            transport,
            poll,
            events,
        })
    }
}

impl Default for GatewayClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_with_contract_target_and_derived_socket_url() {
        let client = GatewayClientBuilder::new()
            .api_key("k")
            .contract("c-1")
            .base_url("http://localhost:9000")
            .build()
            .unwrap();
        assert_eq!(client.session().target(), &Target::Contract("c-1".into()));
        assert_eq!(client.events().ws_url(), "ws://localhost:9000/notifs");
    }

    #[test]
    fn explicit_socket_url_wins() {
        let client = GatewayClientBuilder::new()
            .api_key("k")
            .project("p-1")
            .ws_url("ws://127.0.0.1:1234/custom")
            .build()
            .unwrap();
        assert_eq!(client.events().ws_url(), "ws://127.0.0.1:1234/custom");
    }

    #[test]
    fn rejects_empty_credentials() {
        let err = GatewayClientBuilder::new()
            .api_key("")
            .contract("c")
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test]
    fn rejects_bad_base_url() {
        let err = GatewayClientBuilder::new()
            .api_key("k")
            .contract("c")
            .base_url("::nope::")
            .build()
            .unwrap_err();
        assert_eq!(
            err.context().and_then(|c| c.field_path.as_deref()),
            Some("builder.base_url")
        );
    }

    #[test]
    fn explicit_poll_policy_is_kept() {
        let policy = PollPolicy::default().with_timeout(Duration::from_secs(5));
        let client = GatewayClientBuilder::new()
            .api_key("k")
            .contract("c")
            .poll_policy(policy.clone())
            .build()
            .unwrap();
        assert_eq!(client.poll_policy(), &policy);
    }
}
