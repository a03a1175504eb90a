//! Basic usage: listen for contract events, read a balance, send a transfer.
//!
//! ```bash
//! GATEWAY_API_KEY=... GATEWAY_CONTRACT_ID=... cargo run --example basic_usage
//! ```

use contract_gateway_client::{EventNotification, GatewayClient};
use serde_json::json;
use tracing_subscriber::EnvFilter;

const OWNER: &str = "0xcd92C45083aB059B1e5Af91c7cE58adf9D199e3c";
const RECIPIENT: &str = "0x73426F686Db8e511310a9fb90F9B22DB71ed53D4";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let client = GatewayClient::builder().build()?;

    client.subscribe(|notification: EventNotification| match notification {
        EventNotification::Event(e) => {
            println!("event={} params={}", e.event, e.params);
            if e.event == "Transfer" {
                println!("this is a Transfer event!");
            }
        }
        EventNotification::Error(err) => eprintln!("subscription error: {}", err),
    });

    match client.call_constant("balanceOf", json!({ "owner": OWNER })).await {
        Ok(balance) => println!("balance={}", balance),
        Err(e) => eprintln!("balanceOf failed: {}", e),
    }

    // Wallet address or name that signs the transaction.
    let result = client
        .call_function(Some(OWNER), "transfer", json!({ "to": RECIPIENT, "value": "100" }))
        .await?;
    println!(
        "transfer {}",
        if result.is_successful { "successful" } else { "failed" }
    );

    // Give late events a moment before closing the socket.
    tokio::time::sleep(std::time::Duration::from_secs(2)).await;
    client.unsubscribe();
    Ok(())
}
