//! Shared fixtures for the integration tests.
#![allow(dead_code)]

pub mod mock_gateway;
pub mod scripted;
pub mod ws_server;

use std::time::Duration;

/// Poll `condition` every 10ms until it holds or 5s pass.
pub async fn eventually<F: Fn() -> bool>(condition: F) -> bool {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
