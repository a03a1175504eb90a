//! Wire types shared by the client and the event subscriber.

pub mod events;

pub use events::{ContractEvent, EventNotification, SubscribeFrame};
