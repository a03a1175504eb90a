//! Mock HTTP gateway for integration tests

use contract_gateway_client::{GatewayClient, PollPolicy, Target};
use mockito::{Mock, Server, ServerGuard};
use std::time::Duration;

pub const API_KEY: &str = "test-api-key";

/// Test fixture that owns a mockito server standing in for the gateway.
pub struct MockGateway {
    pub server: ServerGuard,
    pub base_url: String,
}

impl MockGateway {
    pub async fn new() -> Self {
        let server = Server::new_async().await;
        let base_url = server.url();
        Self { server, base_url }
    }

    /// Client pointed at the mock server, with a short poll policy.
    pub fn client(&self, target: Target) -> contract_gateway_client::Result<GatewayClient> {
        GatewayClient::builder()
            .api_key(API_KEY)
            .target(target)
            .base_url(&self.base_url)
            .http_timeout(Duration::from_secs(5))
            .poll_policy(
                PollPolicy::default()
                    .with_initial_delay(Duration::from_millis(5))
                    .with_max_delay(Duration::from_millis(20))
                    .with_timeout(Duration::from_secs(2)),
            )
            .build()
    }

    /// Mock an authenticated JSON response.
    pub async fn mock_json(&mut self, method: &str, path: &str, status: usize, body: &str) -> Mock {
        self.server
            .mock(method, path)
            .match_header("authorization", format!("Bearer {}", API_KEY).as_str())
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await
    }
}
