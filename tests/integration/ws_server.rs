//! Local notification socket server.

use futures::{SinkExt, StreamExt};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{accept_async, WebSocketStream};

#[derive(Debug, Clone)]
pub enum Outgoing {
    Text(String),
    Binary(Vec<u8>),
    Close,
}

/// Accepts any number of sockets, reports every text frame a client sends as
/// a handshake, and broadcasts outgoing frames to all connected clients.
pub struct WsGateway {
    pub url: String,
    connections: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
    handshakes: mpsc::UnboundedReceiver<Value>,
    outgoing: broadcast::Sender<Outgoing>,
}

impl WsGateway {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let connections = Arc::new(AtomicUsize::new(0));
        let closed = Arc::new(AtomicUsize::new(0));
        let (hs_tx, hs_rx) = mpsc::unbounded_channel();
        let (out_tx, _) = broadcast::channel(64);

        let accepted = connections.clone();
        let ended = closed.clone();
        let out = out_tx.clone();
        tokio::spawn(async move {
            while let Ok((tcp, _)) = listener.accept().await {
                accepted.fetch_add(1, Ordering::SeqCst);
                let rx = out.subscribe();
                let hs = hs_tx.clone();
                let ended = ended.clone();
                tokio::spawn(async move {
                    if let Ok(ws) = accept_async(tcp).await {
                        serve(ws, rx, hs).await;
                    }
                    ended.fetch_add(1, Ordering::SeqCst);
                });
            }
        });

        Self {
            url: format!("ws://{}/notifs", addr),
            connections,
            closed,
            handshakes: hs_rx,
            outgoing: out_tx,
        }
    }

    /// Next frame a client sent, within 5s.
    pub async fn next_handshake(&mut self) -> Value {
        tokio::time::timeout(Duration::from_secs(5), self.handshakes.recv())
            .await
            .expect("no handshake within 5s")
            .expect("server stopped")
    }

    pub fn try_handshake(&mut self) -> Option<Value> {
        self.handshakes.try_recv().ok()
    }

    // Sending with no connected client is not an error: the frame is simply
    // never delivered.
    pub fn send_text(&self, text: &str) {
        let _ = self.outgoing.send(Outgoing::Text(text.to_string()));
    }

    pub fn send_binary(&self, bytes: &[u8]) {
        let _ = self.outgoing.send(Outgoing::Binary(bytes.to_vec()));
    }

    pub fn close_all(&self) {
        let _ = self.outgoing.send(Outgoing::Close);
    }

    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn closed_counter(&self) -> Arc<AtomicUsize> {
        self.closed.clone()
    }
}

async fn serve(
    mut ws: WebSocketStream<TcpStream>,
    mut out: broadcast::Receiver<Outgoing>,
    handshakes: mpsc::UnboundedSender<Value>,
) {
    loop {
        tokio::select! {
            incoming = ws.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    if let Ok(v) = serde_json::from_str(text.as_str()) {
                        let _ = handshakes.send(v);
                    }
                }
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
            outgoing = out.recv() => match outgoing {
                Ok(Outgoing::Text(text)) => {
                    if ws.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                Ok(Outgoing::Binary(bytes)) => {
                    if ws.send(Message::Binary(bytes.into())).await.is_err() {
                        break;
                    }
                }
                Ok(Outgoing::Close) | Err(_) => {
                    let _ = ws.close(None).await;
                    break;
                }
            },
        }
    }
}
