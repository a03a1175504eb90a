use crate::events::subscriber::{EventObserver, EventSubscriber};
use crate::types::events::EventNotification;
use futures::Stream;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::mpsc;

struct ChannelObserver {
    tx: mpsc::UnboundedSender<EventNotification>,
}

impl EventObserver for ChannelObserver {
    fn on_notification(&self, notification: EventNotification) {
        let _ = self.tx.send(notification);
    }
}

/// Contract events as a [`Stream`].
///
/// The stream ends when the subscription closes, fails (after yielding the
/// error), or another observer takes its place. Dropping the stream
/// unsubscribes unless another observer has been registered since.
pub struct EventStream {
    rx: mpsc::UnboundedReceiver<EventNotification>,
    subscriber: EventSubscriber,
    observer_id: u64,
}

impl EventStream {
    pub(crate) fn open(subscriber: &EventSubscriber) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let observer_id = subscriber.register(Arc::new(ChannelObserver { tx }));
        Self {
            rx,
            subscriber: subscriber.clone(),
            observer_id,
        }
    }

    /// Unsubscribe and stop yielding new items.
    pub fn close(&mut self) {
        self.subscriber.release(self.observer_id);
        self.rx.close();
    }
}

impl Stream for EventStream {
    type Item = EventNotification;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().rx.poll_recv(cx)
    }
}

impl Drop for EventStream {
    fn drop(&mut self) {
        self.subscriber.release(self.observer_id);
    }
}

impl std::fmt::Debug for EventStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventStream")
            .field("observer_id", &self.observer_id)
            .field("subscriber", &self.subscriber)
            .finish()
    }
}
