//! Contract event subscription over the gateway's notification socket.
//!
//! One client owns at most one socket. Frames are parsed into
//! [`ContractEvent`](crate::types::events::ContractEvent)s and handed to a
//! single observer, either a callback ([`EventObserver`]) or an
//! [`EventStream`].

mod stream;
mod subscriber;

pub use stream::EventStream;
pub use subscriber::{EventObserver, EventSubscriber, SubscriptionState};
