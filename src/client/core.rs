use crate::client::polling::PollPolicy;
use crate::client::types::{current_contract_path, Session, Target};
use crate::events::{EventObserver, EventStream, EventSubscriber, SubscriptionState};
use crate::transport::{GatewayRequest, Transport};
use crate::{Error, ErrorContext, Result};
use std::sync::Arc;

/// Client for one contract (or project) on the gateway.
///
/// Calls are independent and may run concurrently; they share only the
/// immutable session and the transport. The event subscription is the only
/// mutable state and is owned by [`EventSubscriber`].
#[derive(Clone)]
pub struct GatewayClient {
    pub(crate) session: Arc<Session>,
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) poll: PollPolicy,
    pub(crate) events: EventSubscriber,
}

impl GatewayClient {
    /// Create a client bound to a contract id.
    pub fn new(api_key: impl Into<String>, contract_id: impl Into<String>) -> Result<Self> {
        crate::client::builder::GatewayClientBuilder::new()
            .api_key(api_key)
            .contract(contract_id)
            .build()
    }

    /// Create a client bound to the current contract of a project.
    pub fn for_project(api_key: impl Into<String>, project_id: impl Into<String>) -> Result<Self> {
        crate::client::builder::GatewayClientBuilder::new()
            .api_key(api_key)
            .project(project_id)
            .build()
    }

    pub fn builder() -> crate::client::builder::GatewayClientBuilder {
        crate::client::builder::GatewayClientBuilder::new()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn poll_policy(&self) -> &PollPolicy {
        &self.poll
    }

    /// The event subscriber owned by this client.
    pub fn events(&self) -> &EventSubscriber {
        &self.events
    }

    /// Start receiving contract events. See [`EventSubscriber::subscribe`].
    pub fn subscribe<O: EventObserver>(&self, observer: O) {
        self.events.subscribe(observer);
    }

    /// Stop receiving contract events. Idempotent.
    pub fn unsubscribe(&self) {
        self.events.unsubscribe();
    }

    pub fn subscription_state(&self) -> SubscriptionState {
        self.events.state()
    }

    /// Subscribe and consume events as a stream.
    pub fn event_stream(&self) -> EventStream {
        self.events.stream()
    }

    /// Contract id that events are subscribed for.
    ///
    /// For a project target this performs the "current contract" lookup.
    pub async fn current_contract_id(&self) -> Result<String> {
        resolve_contract_id(self.transport.as_ref(), &self.session).await
    }
}

impl std::fmt::Debug for GatewayClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayClient")
            .field("session", &self.session)
            .field("poll", &self.poll)
            .field("subscription", &self.events.state())
            .finish()
    }
}

/// Standard gateway headers: JSON content type, bearer auth, correlation id,
/// and the `wallet` header when a sender is given.
pub(crate) fn request_headers(
    session: &Session,
    sender: Option<&str>,
    request_id: &str,
) -> Vec<(String, String)> {
    let mut headers = vec![
        ("content-type".to_string(), "application/json".to_string()),
        (
            "Authorization".to_string(),
            format!("Bearer {}", session.api_key()),
        ),
        ("x-request-id".to_string(), request_id.to_string()),
    ];
    if let Some(sender) = sender.filter(|s| !s.is_empty()) {
        headers.push(("wallet".to_string(), sender.to_string()));
    }
    headers
}

/// Contract id for the event subscription.
///
/// A contract target is used as-is; a project target is resolved through
/// `GET /projects/{id}/contracts/current`, whose body carries `details.id`.
pub(crate) async fn resolve_contract_id(
    transport: &dyn Transport,
    session: &Session,
) -> Result<String> {
    let project_id = match session.target() {
        Target::Contract(id) => return Ok(id.clone()),
        Target::Project(id) => id,
    };

    let request_id = uuid::Uuid::new_v4().to_string();
    let request = GatewayRequest::get(current_contract_path(project_id))
        .with_headers(request_headers(session, None, &request_id));
    let json = transport.execute(request).await?.into_result()?;

    json.get("details")
        .and_then(|d| d.get("id"))
        .and_then(|id| match id {
            serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .ok_or_else(|| {
            Error::invalid_response_with_context(
                "current contract response has no contract id",
                ErrorContext::new()
                    .with_field_path("details.id")
                    .with_details(format!("project {}", project_id))
                    .with_source("contract_resolver"),
            )
        })
}
