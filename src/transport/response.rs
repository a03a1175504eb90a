//! Response normalisation.
//!
//! The gateway answers some errors with an empty body and callers should not
//! have to special-case that. Every transport response is turned into a
//! [`ResponseEnvelope`] whose `json` is `{}` for an empty body.

use crate::transport::TransportError;
use crate::{Error, Result};
use serde_json::Value;

/// Uniform view of a gateway response.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseEnvelope {
    /// Transport status code.
    pub status: u16,
    /// Transport-level success flag (status in `[200, 300)`).
    pub ok: bool,
    /// Parsed body; `{}` when the body was empty.
    pub json: Value,
}

impl ResponseEnvelope {
    /// Normalise a raw body.
    ///
    /// Empty text becomes `{}`. Non-empty text must be JSON, otherwise
    /// [`Error::MalformedBody`] is returned.
    pub fn from_parts(status: u16, ok: bool, text: &str) -> Result<Self> {
        let json = if text.is_empty() {
            Value::Object(serde_json::Map::new())
        } else {
            serde_json::from_str(text).map_err(|source| Error::MalformedBody { status, source })?
        };
        Ok(Self { status, ok, json })
    }

    /// Build an envelope from a status code alone, deriving `ok` the usual way.
    pub fn from_status(status: u16, text: &str) -> Result<Self> {
        Self::from_parts(status, (200..300).contains(&status), text)
    }

    /// Read and normalise a `reqwest` response.
    pub async fn from_response(response: reqwest::Response) -> Result<Self> {
        let status = response.status();
        let text = response.text().await.map_err(TransportError::Http)?;
        Self::from_parts(status.as_u16(), status.is_success(), &text)
    }

    /// Server-supplied error message, if any.
    ///
    /// Looks at `error` (a string, or an object carrying `message`) and then at a
    /// top-level `message`.
    pub fn error_message(&self) -> Option<String> {
        match self.json.get("error") {
            Some(Value::String(s)) if !s.is_empty() => return Some(s.clone()),
            Some(Value::Object(obj)) => {
                if let Some(Value::String(m)) = obj.get("message") {
                    return Some(m.clone());
                }
                return Some(Value::Object(obj.clone()).to_string());
            }
            Some(Value::Null) | None => {}
            Some(other) => return Some(other.to_string()),
        }
        self.json
            .get("message")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
    }

    /// `Ok(json)` for a successful response, [`Error::Remote`] otherwise.
    pub fn into_result(self) -> Result<Value> {
        if self.ok {
            Ok(self.json)
        } else {
            Err(self.into_remote_error())
        }
    }

    pub fn into_remote_error(self) -> Error {
        Error::Remote {
            status: self.status,
            message: self.error_message(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_body_becomes_empty_object() {
        for status in [200u16, 204, 400, 500] {
            let env = ResponseEnvelope::from_status(status, "").unwrap();
            assert_eq!(env.json, json!({}));
            assert_eq!(env.status, status);
        }
    }

    #[test]
    fn non_json_body_is_malformed() {
        let err = ResponseEnvelope::from_status(200, "<html>oops</html>").unwrap_err();
        assert!(matches!(err, Error::MalformedBody { status: 200, .. }));

        let err = ResponseEnvelope::from_status(502, "Bad Gateway").unwrap_err();
        assert_eq!(err.http_status(), Some(502));
    }

    #[test]
    fn ok_mirrors_transport_flag() {
        assert!(ResponseEnvelope::from_status(201, "{}").unwrap().ok);
        assert!(!ResponseEnvelope::from_status(302, "{}").unwrap().ok);
        assert!(!ResponseEnvelope::from_parts(200, false, "{}").unwrap().ok);
    }

    #[test]
    fn non_object_json_is_preserved() {
        let env = ResponseEnvelope::from_status(200, r#"["100", true]"#).unwrap();
        assert_eq!(env.json, json!(["100", true]));
    }

    #[test]
    fn error_message_shapes() {
        let env = ResponseEnvelope::from_status(400, r#"{"error":"bad params"}"#).unwrap();
        assert_eq!(env.error_message().as_deref(), Some("bad params"));

        let env =
            ResponseEnvelope::from_status(400, r#"{"error":{"message":"unknown wallet"}}"#).unwrap();
        assert_eq!(env.error_message().as_deref(), Some("unknown wallet"));

        let env = ResponseEnvelope::from_status(400, r#"{"message":"nope"}"#).unwrap();
        assert_eq!(env.error_message().as_deref(), Some("nope"));

        let env = ResponseEnvelope::from_status(500, "").unwrap();
        assert_eq!(env.error_message(), None);
    }

    #[test]
    fn into_result_maps_failure_to_remote() {
        let env = ResponseEnvelope::from_status(403, r#"{"error":"forbidden"}"#).unwrap();
        match env.into_result() {
            Err(Error::Remote { status, message }) => {
                assert_eq!(status, 403);
                assert_eq!(message.as_deref(), Some("forbidden"));
            }
            other => panic!("unexpected: {:?}", other),
        }

        let env = ResponseEnvelope::from_status(200, r#"{"balance":"42"}"#).unwrap();
        assert_eq!(env.into_result().unwrap(), json!({"balance": "42"}));
    }
}
