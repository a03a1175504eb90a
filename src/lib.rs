//! # contract-gateway-client
//!
//! Async client for a smart-contract REST gateway: constant (read-only) calls,
//! state-changing calls that are polled to a terminal status, and a
//! WebSocket subscription to contract events.
//!
//! ## Overview
//!
//! A [`GatewayClient`] is bound to one API key and one target, either a
//! contract id or a project whose *current* contract is used. Every call is an
//! independent request; the only mutable state is the event subscription.
//!
//! ## Key Features
//!
//! - **Constant calls**: [`GatewayClient::call_constant`] returns the gateway's JSON as-is
//! - **State-changing calls**: [`GatewayClient::call_function`] submits, then polls
//!   the call status with exponential backoff until it is terminal or the
//!   [`PollPolicy`] timeout expires
//! - **Events**: [`GatewayClient::subscribe`] keeps at most one notification socket
//!   open and delivers [`EventNotification`]s to a callback or an [`EventStream`]
//! - **Testable transport**: HTTP goes through the [`transport::Transport`] trait
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use contract_gateway_client::{EventNotification, GatewayClient};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> contract_gateway_client::Result<()> {
//!     let client = GatewayClient::new("your-api-key", "your-contract-id")?;
//!
//!     client.subscribe(|n: EventNotification| {
//!         if let EventNotification::Event(e) = n {
//!             println!("{} {}", e.event, e.params);
//!         }
//!     });
//!
//!     let balance = client
//!         .call_constant("balanceOf", json!({ "tokenOwner": "0xabc" }))
//!         .await?;
//!     println!("balance: {}", balance);
//!
//!     let result = client
//!         .call_function(Some("0xabc"), "transfer", json!({ "to": "0xdef", "tokens": "10" }))
//!         .await?;
//!     println!("transfer: {} ({})", result.status, result.is_successful);
//!
//!     client.unsubscribe();
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | Session, builder, call execution and status polling |
//! | [`events`] | Notification socket lifecycle and event delivery |
//! | [`transport`] | HTTP transport, response envelope, socket helpers |
//! | [`types`] | Wire types for event frames |
//! | [`error`] | Error type and structured context |

pub mod client;
pub mod events;
pub mod transport;
pub mod types;

// Re-export main types for convenience
pub use client::{
    CallHandle, CallProgress, CallResult, CallStats, GatewayClient, GatewayClientBuilder,
    Invocation, PollPolicy, Session, Target, DEFAULT_BASE_URL,
};
pub use events::{EventObserver, EventStream, EventSubscriber, SubscriptionState};
pub use transport::ResponseEnvelope;
pub use types::{ContractEvent, EventNotification};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
