//! Echo client demonstration.
//!
//! Connects to a WebSocket echo server, sends a few messages, and prints
//! whatever comes back, surviving connection drops through the reconnect
//! policy.
//!
//! Usage:
//!   cargo run --example echo_client
//!   cargo run --example echo_client -- ws://127.0.0.1:9001

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use anyhow::Result;
use serde_json::{Value, json};
use tokio::time::sleep;
use tracing_subscriber::EnvFilter;

use ws_session::{ReconnectConfig, Session, SessionConfig};

// ============================================================================
// Constants
// ============================================================================

const DEFAULT_URL: &str = "ws://127.0.0.1:9001";

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .init();

    if let Err(e) = run().await {
        eprintln!("\n[ERROR] {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_URL.to_string());

    println!("=== Echo client: {url} ===\n");

    let config: SessionConfig<(), Value, Value> = SessionConfig::new(url)
        .reconnect(ReconnectConfig::enabled().timeout(Duration::from_millis(500)));

    let session = Session::new(config);
    session.open(())?;

    // Queued while connecting, flushed in order once open.
    for seq in 0..3 {
        session.send(json!({ "kind": "echo", "seq": seq }))?;
    }

    let mut open = session.watch_open();
    loop {
        tokio::select! {
            changed = open.changed() => {
                if changed.is_err() {
                    break;
                }
                println!("[state] open = {}", *open.borrow());
            }
            () = sleep(Duration::from_millis(250)) => {
                if let Some(message) = session.last_message() {
                    println!("[inbound] {message}");
                }
            }
        }
    }

    session.dispose();
    Ok(())
}
