//! WebSocket connector for the gateway notification endpoint.

use crate::transport::TransportError;
use crate::types::events::SubscribeFrame;
use crate::{Error, Result};
use futures::SinkExt;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use url::Url;

/// Stream type returned by `tokio_tungstenite::connect_async`.
pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

const NOTIFICATIONS_PATH: &str = "notifs";

/// Derive the notification socket URL from the gateway base URL.
///
/// `https` maps to `wss`, `http` to `ws`; the `/notifs` segment is appended to
/// whatever path the base URL already has.
pub fn notifications_url(base_url: &str) -> Result<String> {
    let mut url = Url::parse(base_url)
        .map_err(|e| TransportError::InvalidUrl(format!("{}: {}", base_url, e)))?;

    let scheme = match url.scheme() {
        "https" | "wss" => "wss",
        "http" | "ws" => "ws",
        other => {
            return Err(TransportError::InvalidUrl(format!(
                "unsupported scheme '{}' in {}",
                other, base_url
            ))
            .into())
        }
    };
    url.set_scheme(scheme)
        .map_err(|_| TransportError::InvalidUrl(format!("cannot use scheme {}", scheme)))?;

    let path = format!("{}/{}", url.path().trim_end_matches('/'), NOTIFICATIONS_PATH);
    url.set_path(&path);
    url.set_query(None);
    url.set_fragment(None);
    Ok(url.to_string())
}

/// Open a socket to `url`.
pub async fn connect(url: &str) -> Result<WsStream> {
    let (stream, _response) = tokio_tungstenite::connect_async(url)
        .await
        .map_err(|e| Error::Transport(TransportError::from(e)))?;
    Ok(stream)
}

/// Send the one-time `contract_events` subscribe frame.
pub async fn send_subscribe(stream: &mut WsStream, contract_id: &str) -> Result<()> {
    let payload = serde_json::to_string(&SubscribeFrame::contract_events(contract_id))?;
    stream
        .send(Message::Text(payload.into()))
        .await
        .map_err(|e| Error::Transport(TransportError::from(e)))
}
