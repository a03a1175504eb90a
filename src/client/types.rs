use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What the session talks to.
///
/// The variant selects both the call endpoint shape and how the event
/// subscriber finds the contract id to subscribe to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// A contract addressed directly by id.
    Contract(String),
    /// The current contract of a project, looked up on demand.
    Project(String),
}

impl Target {
    pub fn id(&self) -> &str {
        match self {
            Target::Contract(id) | Target::Project(id) => id,
        }
    }

    /// Endpoint for invoking `function_name`. Ids and the name are
    /// percent-encoded as single path segments.
    pub fn function_path(&self, function_name: &str) -> String {
        match self {
            Target::Contract(id) => format!("/calls/{}/{}", segment(id), segment(function_name)),
            Target::Project(id) => format!(
                "/projects/{}/calls/current/{}",
                segment(id),
                segment(function_name)
            ),
        }
    }
}

pub(crate) fn status_path(call_id: &str) -> String {
    format!("/calls/{}/status", segment(call_id))
}

pub(crate) fn current_contract_path(project_id: &str) -> String {
    format!("/projects/{}/contracts/current", segment(project_id))
}

/// Percent-encode one path segment. Everything but `[A-Za-z0-9*-._]` is
/// escaped; spaces become `%20`, never `+`.
fn segment(raw: &str) -> String {
    url::form_urlencoded::byte_serialize(raw.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// Characters that would change the meaning of a request path.
const RESERVED_IN_NAME: &[char] = &['/', '?', '#', '%', '\\'];

/// Immutable credentials and target of a client.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    api_key: String,
    target: Target,
}

impl Session {
    pub fn new(api_key: impl Into<String>, target: Target) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(Error::configuration_with_context(
                "API key must not be empty",
                ErrorContext::new()
                    .with_field_path("session.api_key")
                    .with_source("session"),
            ));
        }
        if target.id().trim().is_empty() {
            return Err(Error::configuration_with_context(
                "target id must not be empty",
                ErrorContext::new()
                    .with_field_path("session.target")
                    .with_source("session"),
            ));
        }
        Ok(Self { api_key, target })
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn target(&self) -> &Target {
        &self.target
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("api_key", &"<redacted>")
            .field("target", &self.target)
            .finish()
    }
}

/// One function invocation: name, parameter mapping, optional sender wallet.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub function: String,
    pub params: serde_json::Map<String, Value>,
    pub sender: Option<String>,
}

impl Invocation {
    pub fn new(function: impl Into<String>) -> Self {
        Self {
            function: function.into(),
            params: serde_json::Map::new(),
            sender: None,
        }
    }

    /// Build from a JSON value; `null` means "no parameters", anything other
    /// than an object is rejected.
    pub fn with_params_value(function: impl Into<String>, params: Value) -> Result<Self> {
        let params = match params {
            Value::Object(map) => map,
            Value::Null => serde_json::Map::new(),
            other => {
                return Err(Error::validation_with_context(
                    "parameters must be a JSON object",
                    ErrorContext::new()
                        .with_field_path("invocation.params")
                        .with_details(format!("got {}", json_kind(&other)))
                        .with_source("invocation"),
                ))
            }
        };
        Ok(Self {
            function: function.into(),
            params,
            sender: None,
        })
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = Some(sender.into());
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        let name = self.function.trim();
        if name.is_empty()
            || name.contains(RESERVED_IN_NAME)
            || name.contains(char::is_whitespace)
        {
            return Err(Error::validation_with_context(
                "function name must be a non-empty path segment",
                ErrorContext::new()
                    .with_field_path("invocation.function")
                    .with_details(format!("got {:?}", self.function))
                    .with_source("invocation"),
            ));
        }
        Ok(())
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Identifier of an accepted state-changing call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallHandle {
    #[serde(rename = "callId")]
    pub call_id: String,
}

impl CallHandle {
    pub fn new(call_id: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
        }
    }
}

impl std::fmt::Display for CallHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.call_id)
    }
}

/// Terminal outcome of a state-changing call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallResult {
    pub status: String,
    #[serde(rename = "isSuccessful")]
    pub is_successful: bool,
}

/// Outcome of a single status check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallProgress {
    /// Not final yet; `status` is whatever the gateway reported, if anything.
    Pending { status: Option<String> },
    Terminal(CallResult),
}

impl CallProgress {
    pub fn is_terminal(&self) -> bool {
        matches!(self, CallProgress::Terminal(_))
    }
}

/// Per-call statistics for observability.
#[derive(Debug, Clone)]
pub struct CallStats {
    pub call_id: String,
    pub function: String,
    /// Our own correlation id, sent as `x-request-id`.
    pub client_request_id: String,
    /// Number of status requests issued by the poll loop.
    pub status_checks: u32,
    pub duration_ms: u128,
}
