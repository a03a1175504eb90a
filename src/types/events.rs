//! Contract event wire frames and the notifications handed to observers.

use crate::Error;
use serde::{Deserialize, Serialize};

/// Outbound subscribe frame: `{"type":"contract_events","data":{"contractId":"<id>"}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscribeFrame {
    #[serde(rename = "type")]
    pub frame_type: String,
    pub data: SubscribeData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscribeData {
    #[serde(rename = "contractId")]
    pub contract_id: String,
}

impl SubscribeFrame {
    pub const CONTRACT_EVENTS: &'static str = "contract_events";

    pub fn contract_events(contract_id: impl Into<String>) -> Self {
        Self {
            frame_type: Self::CONTRACT_EVENTS.to_string(),
            data: SubscribeData {
                contract_id: contract_id.into(),
            },
        }
    }
}

/// Inbound event frame as sent by the gateway.
#[derive(Debug, Clone, Deserialize)]
struct EventFrame {
    name: String,
    #[serde(default = "empty_params")]
    params: serde_json::Value,
}

fn empty_params() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

/// A decoded contract event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractEvent {
    /// Event name as declared by the contract (e.g. `Transfer`).
    pub event: String,
    /// Event arguments.
    pub params: serde_json::Value,
}

impl ContractEvent {
    /// Decode an inbound text frame.
    ///
    /// `name` is required; a missing or `null` `params` becomes `{}`.
    pub fn from_frame(text: &str) -> std::result::Result<Self, serde_json::Error> {
        let frame: EventFrame = serde_json::from_str(text)?;
        let params = if frame.params.is_null() {
            empty_params()
        } else {
            frame.params
        };
        Ok(Self {
            event: frame.name,
            params,
        })
    }
}

/// What an event observer receives.
#[derive(Debug)]
pub enum EventNotification {
    /// One inbound contract event.
    Event(ContractEvent),
    /// The channel could not be set up; delivered once, after which the
    /// subscription is closed.
    Error(Error),
}

impl EventNotification {
    pub fn as_event(&self) -> Option<&ContractEvent> {
        match self {
            EventNotification::Event(e) => Some(e),
            EventNotification::Error(_) => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, EventNotification::Error(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn subscribe_frame_wire_shape() {
        let frame = SubscribeFrame::contract_events("d636df58");
        let v = serde_json::to_value(&frame).unwrap();
        assert_eq!(
            v,
            json!({"type": "contract_events", "data": {"contractId": "d636df58"}})
        );
    }

    #[test]
    fn event_frame_decodes_name_and_params() {
        let ev = ContractEvent::from_frame(
            r#"{"name":"Transfer","params":{"from":"0xa","to":"0xb","value":"100"}}"#,
        )
        .unwrap();
        assert_eq!(ev.event, "Transfer");
        assert_eq!(ev.params["value"], "100");
    }

    #[test]
    fn missing_params_default_to_empty_object() {
        let ev = ContractEvent::from_frame(r#"{"name":"Paused"}"#).unwrap();
        assert_eq!(ev.params, json!({}));

        let ev = ContractEvent::from_frame(r#"{"name":"Paused","params":null}"#).unwrap();
        assert_eq!(ev.params, json!({}));
    }

    #[test]
    fn malformed_frames_are_rejected() {
        assert!(ContractEvent::from_frame("not json").is_err());
        assert!(ContractEvent::from_frame(r#"{"params":{}}"#).is_err());
        assert!(ContractEvent::from_frame(r#"[1,2,3]"#).is_err());
    }
}
