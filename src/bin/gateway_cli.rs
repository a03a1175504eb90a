//! gateway-cli: call contract functions and watch contract events from the shell.
//!
//! Usage:
//!   gateway-cli constant <function> [--params <json>]                 Constant call
//!   gateway-cli invoke <function> [--params <json>] [--sender <w>]    State-changing call
//!   gateway-cli status <call-id>                                      One status check
//!   gateway-cli listen [--count <n>]                                  Print contract events
//!
//! Connection settings come from `GATEWAY_*` environment variables.

use anyhow::{bail, Context};
use contract_gateway_client::{
    CallHandle, CallProgress, EventNotification, GatewayClient, Invocation,
};
use futures::StreamExt;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    let outcome = match args[1].as_str() {
        "constant" => cmd_constant(&args[2..]).await,
        "invoke" => cmd_invoke(&args[2..]).await,
        "status" => cmd_status(&args[2..]).await,
        "listen" => cmd_listen(&args[2..]).await,
        "version" | "--version" | "-V" => {
            cmd_version();
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {other}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    };

    if let Err(e) = outcome {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn print_usage() {
    println!(
        r#"gateway-cli: contract gateway command line

USAGE:
    gateway-cli <COMMAND> [OPTIONS]

COMMANDS:
    constant <function> [--params <json>]
                                Call a constant function and print its JSON answer
    invoke <function> [--params <json>] [--sender <wallet>] [--no-wait]
                                Submit a state-changing call and wait for its status
    status <call-id>            Check the status of a submitted call once
    listen [--count <n>]        Print contract events until interrupted
    version                     Show version information
    help                        Show this help message

ENVIRONMENT:
    GATEWAY_API_KEY             Bearer token (required)
    GATEWAY_CONTRACT_ID         Contract to address
    GATEWAY_PROJECT_ID          Project whose current contract is addressed
    GATEWAY_BASE_URL            Gateway base URL
    GATEWAY_WS_URL              Notification socket URL
    RUST_LOG                    Log filter, e.g. contract_gateway_client=debug"#
    );
}

fn cmd_version() {
    println!("gateway-cli {}", env!("CARGO_PKG_VERSION"));
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str())
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

fn positional<'a>(args: &'a [String], what: &str) -> anyhow::Result<&'a str> {
    match args.first() {
        Some(first) if !first.starts_with("--") => Ok(first.as_str()),
        _ => bail!("missing <{what}>"),
    }
}

fn parse_params(args: &[String]) -> anyhow::Result<Value> {
    match flag_value(args, "--params") {
        Some(raw) => serde_json::from_str(raw).context("--params must be a JSON object"),
        None => Ok(Value::Null),
    }
}

fn client_from_env() -> anyhow::Result<GatewayClient> {
    GatewayClient::builder()
        .build()
        .context("could not configure the gateway client")
}

async fn cmd_constant(args: &[String]) -> anyhow::Result<()> {
    let function = positional(args, "function")?;
    let params = parse_params(args)?;
    let client = client_from_env()?;

    let answer = client.call_constant(function, params).await?;
    println!("{}", serde_json::to_string_pretty(&answer)?);
    Ok(())
}

async fn cmd_invoke(args: &[String]) -> anyhow::Result<()> {
    let function = positional(args, "function")?;
    let params = parse_params(args)?;
    let client = client_from_env()?;

    let mut invocation = Invocation::with_params_value(function, params)?;
    if let Some(sender) = flag_value(args, "--sender") {
        invocation = invocation.sender(sender);
    }

    if has_flag(args, "--no-wait") {
        let handle = client.submit_function(&invocation).await?;
        println!("{}", handle);
        return Ok(());
    }

    let (result, stats) = client.invoke_function_with_stats(&invocation).await?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    eprintln!(
        "call {} finished after {} status checks in {} ms",
        stats.call_id, stats.status_checks, stats.duration_ms
    );
    if !result.is_successful {
        std::process::exit(2);
    }
    Ok(())
}

async fn cmd_status(args: &[String]) -> anyhow::Result<()> {
    let call_id = positional(args, "call-id")?;
    let client = client_from_env()?;

    match client.call_status(&CallHandle::new(call_id)).await? {
        CallProgress::Terminal(result) => println!("{}", serde_json::to_string_pretty(&result)?),
        CallProgress::Pending { status } => {
            println!("pending ({})", status.as_deref().unwrap_or("no status yet"))
        }
    }
    Ok(())
}

async fn cmd_listen(args: &[String]) -> anyhow::Result<()> {
    let limit = match flag_value(args, "--count") {
        Some(n) => Some(n.parse::<usize>().context("--count must be a number")?),
        None => None,
    };
    let client = client_from_env()?;

    let mut events = client.event_stream();
    let mut seen = 0usize;
    loop {
        let next = tokio::select! {
            n = events.next() => n,
            _ = tokio::signal::ctrl_c() => break,
        };
        match next {
            Some(EventNotification::Event(event)) => {
                println!("{} {}", event.event, event.params);
                seen += 1;
                if limit.is_some_and(|l| seen >= l) {
                    break;
                }
            }
            Some(EventNotification::Error(e)) => bail!(e),
            None => break,
        }
    }
    events.close();
    Ok(())
}
