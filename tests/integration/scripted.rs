//! In-memory transport that replays scripted gateway answers.

use async_trait::async_trait;
use contract_gateway_client::transport::{GatewayRequest, Transport, TransportError};
use contract_gateway_client::{ResponseEnvelope, Result};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;

enum Step {
    Json(u16, Value),
    Fail(String),
    Hang,
}

/// Answers requests in order; once the script runs out the fallback (if any)
/// answers every further request. Every request is recorded.
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Step>>,
    fallback: Mutex<Option<(u16, Value)>>,
    requests: Mutex<Vec<GatewayRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then_json(self, status: u16, body: Value) -> Self {
        self.script.lock().unwrap().push_back(Step::Json(status, body));
        self
    }

    pub fn then_fail(self, message: &str) -> Self {
        self.script
            .lock()
            .unwrap()
            .push_back(Step::Fail(message.to_string()));
        self
    }

    /// The next request never completes.
    pub fn then_hang(self) -> Self {
        self.script.lock().unwrap().push_back(Step::Hang);
        self
    }

    pub fn otherwise_json(self, status: u16, body: Value) -> Self {
        *self.fallback.lock().unwrap() = Some((status, body));
        self
    }

    pub fn requests(&self) -> Vec<GatewayRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn execute(&self, request: GatewayRequest) -> Result<ResponseEnvelope> {
        self.requests.lock().unwrap().push(request);
        let step = self.script.lock().unwrap().pop_front();
        match step {
            Some(Step::Json(status, body)) => ResponseEnvelope::from_status(status, &body.to_string()),
            Some(Step::Fail(message)) => Err(TransportError::Other(message).into()),
            Some(Step::Hang) => std::future::pending().await,
            None => match self.fallback.lock().unwrap().clone() {
                Some((status, body)) => ResponseEnvelope::from_status(status, &body.to_string()),
                None => Err(TransportError::Other("script exhausted".into()).into()),
            },
        }
    }
}
