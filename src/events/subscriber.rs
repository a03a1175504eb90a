use crate::client::core::resolve_contract_id;
use crate::client::types::Session;
use crate::events::stream::EventStream;
use crate::transport::ws::{self, WsStream};
use crate::transport::Transport;
use crate::types::events::{ContractEvent, EventNotification};
use crate::{Error, Result};
use futures::{SinkExt, StreamExt};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Receives contract event notifications.
///
/// Observers run on the socket reader task and should return quickly. They may
/// call [`EventSubscriber::unsubscribe`] or [`EventSubscriber::subscribe`].
pub trait EventObserver: Send + Sync + 'static {
    fn on_notification(&self, notification: EventNotification);
}

impl<F> EventObserver for F
where
    F: Fn(EventNotification) + Send + Sync + 'static,
{
    fn on_notification(&self, notification: EventNotification) {
        self(notification)
    }
}

/// Lifecycle of the event subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionState {
    Closed,
    Connecting,
    Open,
}

struct Registered {
    id: u64,
    observer: Arc<dyn EventObserver>,
}

struct Slot {
    state: SubscriptionState,
    /// Bumped on every subscribe/unsubscribe; a socket task only acts while
    /// its generation is current.
    generation: u64,
    next_observer_id: u64,
    observer: Option<Registered>,
    cancel: Option<CancellationToken>,
    /// Thread currently running an observer callback, if any.
    dispatching: Option<ThreadId>,
}

struct Shared {
    session: Arc<Session>,
    transport: Arc<dyn Transport>,
    ws_url: String,
    slot: Mutex<Slot>,
    /// Held for the whole of each observer callback.
    delivery: Mutex<()>,
}

/// Owns at most one live notification socket and dispatches its frames to the
/// registered observer.
///
/// - `Closed --subscribe--> Connecting --handshake sent--> Open`
/// - `Open --unsubscribe | socket closed--> Closed`
#[derive(Clone)]
pub struct EventSubscriber {
    shared: Arc<Shared>,
}

impl EventSubscriber {
    pub(crate) fn new(session: Arc<Session>, transport: Arc<dyn Transport>, ws_url: String) -> Self {
        Self {
            shared: Arc::new(Shared {
                session,
                transport,
                ws_url,
                slot: Mutex::new(Slot {
                    state: SubscriptionState::Closed,
                    generation: 0,
                    next_observer_id: 0,
                    observer: None,
                    cancel: None,
                    dispatching: None,
                }),
                delivery: Mutex::new(()),
            }),
        }
    }

    pub fn ws_url(&self) -> &str {
        &self.shared.ws_url
    }

    pub fn state(&self) -> SubscriptionState {
        self.shared.lock().state
    }

    /// Start delivering contract events to `observer`.
    ///
    /// When a subscription is already connecting or open no new socket is
    /// opened; `observer` simply replaces the current one. Setup failures are
    /// delivered once as [`EventNotification::Error`], never returned.
    pub fn subscribe<O: EventObserver>(&self, observer: O) {
        self.register(Arc::new(observer));
    }

    /// Stop the subscription and close the socket. Idempotent.
    ///
    /// Once this returns, the previous observer receives nothing further. If
    /// its callback is running on another thread, this blocks until the
    /// callback returns; called from inside the callback it returns at once.
    pub fn unsubscribe(&self) {
        let closed = {
            let mut slot = self.shared.lock();
            close_slot(&mut slot).then(|| slot.dispatching)
        };
        if let Some(dispatching) = closed {
            debug!("event subscription cancelled");
            self.shared.await_delivery(dispatching);
        }
    }

    /// Subscribe and consume notifications as a [`futures::Stream`].
    pub fn stream(&self) -> EventStream {
        EventStream::open(self)
    }

    pub(crate) fn register(&self, observer: Arc<dyn EventObserver>) -> u64 {
        let runtime = tokio::runtime::Handle::try_current();

        let mut slot = self.shared.lock();
        slot.next_observer_id += 1;
        let id = slot.next_observer_id;

        if slot.state != SubscriptionState::Closed {
            debug!(state = ?slot.state, "subscription active, replacing observer");
            slot.observer = Some(Registered { id, observer });
            return id;
        }

        let runtime = match runtime {
            Ok(handle) => handle,
            Err(_) => {
                drop(slot);
                observer.on_notification(EventNotification::Error(Error::subscription(
                    "subscribing requires a Tokio runtime",
                    None,
                )));
                return id;
            }
        };

        slot.generation += 1;
        let generation = slot.generation;
        let token = CancellationToken::new();
        slot.state = SubscriptionState::Connecting;
        slot.observer = Some(Registered { id, observer });
        slot.cancel = Some(token.clone());
        drop(slot);

        runtime.spawn(run(self.shared.clone(), generation, token));
        id
    }

    /// Unsubscribe only if `observer_id` is still the registered observer.
    pub(crate) fn release(&self, observer_id: u64) {
        let closed = {
            let mut slot = self.shared.lock();
            let current = slot.observer.as_ref().map(|r| r.id) == Some(observer_id);
            (current && close_slot(&mut slot)).then(|| slot.dispatching)
        };
        if let Some(dispatching) = closed {
            debug!("event stream released its subscription");
            self.shared.await_delivery(dispatching);
        }
    }
}

impl std::fmt::Debug for EventSubscriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSubscriber")
            .field("ws_url", &self.shared.ws_url)
            .field("state", &self.state())
            .finish()
    }
}

/// Move to `Closed` and cancel the socket task. Returns false if already closed.
fn close_slot(slot: &mut Slot) -> bool {
    if slot.state == SubscriptionState::Closed {
        return false;
    }
    slot.generation += 1;
    slot.state = SubscriptionState::Closed;
    slot.observer = None;
    if let Some(token) = slot.cancel.take() {
        token.cancel();
    }
    true
}

async fn run(shared: Arc<Shared>, generation: u64, token: CancellationToken) {
    let opener = shared.clone();
    drive(shared, generation, token, async move { opener.open().await }).await
}

/// Socket task body: wait for `open`, then pump frames until cancelled or
/// closed by the gateway.
async fn drive<F>(shared: Arc<Shared>, generation: u64, token: CancellationToken, open: F)
where
    F: Future<Output = Result<WsStream>>,
{
    let opened = tokio::select! {
        _ = token.cancelled() => return,
        opened = open => opened,
    };

    match opened {
        Ok(mut socket) => {
            if shared.mark_open(generation) {
                shared.pump(&mut socket, generation, &token).await;
            }
            if let Err(e) = socket.close(None).await {
                debug!(error = %e, "socket close failed");
            }
            shared.finish(generation);
        }
        Err(err) => shared.fail(generation, err),
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Wait out a callback running on another thread.
    fn await_delivery(&self, dispatching: Option<ThreadId>) {
        if dispatching != Some(thread::current().id()) {
            drop(self.delivery.lock().unwrap_or_else(PoisonError::into_inner));
        }
    }

    /// Resolve the contract id, connect, and send the subscribe frame.
    async fn open(&self) -> Result<WsStream> {
        let contract_id = resolve_contract_id(self.transport.as_ref(), &self.session)
            .await
            .map_err(|e| Error::subscription("could not resolve contract id", Some(e)))?;

        let socket = ws::connect(&self.ws_url).await.map_err(|e| {
            Error::subscription(format!("could not connect to {}", self.ws_url), Some(e))
        })?;

        self.handshake(socket, &contract_id).await
    }

    async fn handshake(&self, mut socket: WsStream, contract_id: &str) -> Result<WsStream> {
        if let Err(e) = ws::send_subscribe(&mut socket, contract_id).await {
            let _ = socket.close(None).await;
            return Err(Error::subscription("subscribe handshake failed", Some(e)));
        }

        info!(
            contract_id,
            ws_url = self.ws_url.as_str(),
            "subscribed to contract events"
        );
        Ok(socket)
    }

    async fn pump(&self, socket: &mut WsStream, generation: u64, token: &CancellationToken) {
        loop {
            let message = tokio::select! {
                biased;
                _ = token.cancelled() => break,
                message = socket.next() => message,
            };

            match message {
                Some(Ok(Message::Text(text))) => self.dispatch_frame(generation, text.as_str()),
                Some(Ok(Message::Binary(bytes))) => match std::str::from_utf8(&bytes) {
                    Ok(text) => self.dispatch_frame(generation, text),
                    Err(_) => warn!(len = bytes.len(), "dropping non-UTF-8 binary frame"),
                },
                Some(Ok(Message::Close(frame))) => {
                    debug!(?frame, "gateway closed the event socket");
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(error = %e, "event socket error");
                    break;
                }
                None => break,
            }

            if !self.is_current(generation) {
                break;
            }
        }
    }

    fn dispatch_frame(&self, generation: u64, text: &str) {
        match ContractEvent::from_frame(text) {
            Ok(event) => self.notify(generation, EventNotification::Event(event)),
            Err(e) => warn!(error = %e, len = text.len(), "dropping malformed event frame"),
        }
    }

    /// Deliver under the `delivery` lock, so `unsubscribe` on another thread
    /// can wait for a callback that has already passed the generation check.
    fn notify(&self, generation: u64, notification: EventNotification) {
        let _delivery = self.delivery.lock().unwrap_or_else(PoisonError::into_inner);
        let observer = {
            let mut slot = self.lock();
            if slot.generation != generation || slot.state != SubscriptionState::Open {
                return;
            }
            let observer = slot.observer.as_ref().map(|r| r.observer.clone());
            if observer.is_some() {
                slot.dispatching = Some(thread::current().id());
            }
            observer
        };
        if let Some(observer) = observer {
            observer.on_notification(notification);
            self.lock().dispatching = None;
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        let slot = self.lock();
        slot.generation == generation && slot.state == SubscriptionState::Open
    }

    fn mark_open(&self, generation: u64) -> bool {
        let mut slot = self.lock();
        if slot.generation == generation && slot.state == SubscriptionState::Connecting {
            slot.state = SubscriptionState::Open;
            true
        } else {
            false
        }
    }

    /// Setup failed: close and hand the error to the observer once.
    fn fail(&self, generation: u64, err: Error) {
        let observer = {
            let mut slot = self.lock();
            if slot.generation != generation || slot.state == SubscriptionState::Closed {
                return;
            }
            slot.state = SubscriptionState::Closed;
            slot.cancel = None;
            slot.observer.take().map(|r| r.observer)
        };
        warn!(error = %err, "event subscription failed");
        if let Some(observer) = observer {
            observer.on_notification(EventNotification::Error(err));
        }
    }

    /// Socket ended on its own.
    fn finish(&self, generation: u64) {
        let mut slot = self.lock();
        if slot.generation == generation && slot.state != SubscriptionState::Closed {
            slot.state = SubscriptionState::Closed;
            slot.cancel = None;
            slot.observer = None;
            info!("event socket closed");
        }
    }
}
