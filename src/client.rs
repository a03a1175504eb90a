//! Gateway client: session, configuration and call execution.
//!
//! Keep the public surface small and predictable.
//! Implementation details are split into submodules under `src/client/`.

pub mod builder;
pub mod core;
mod invoke;
pub mod polling;
pub mod types;

pub use self::builder::{GatewayClientBuilder, DEFAULT_BASE_URL};
pub use self::core::GatewayClient;
pub use self::polling::PollPolicy;
pub use self::types::{CallHandle, CallProgress, CallResult, CallStats, Invocation, Session, Target};
