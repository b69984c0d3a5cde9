//! Crossfire session coordinator.
//!
//! Tracks rooms, drives rounds and reports mismatches between participants' programs.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin crossfire-server
//! cargo run --bin crossfire-server -- --host 0.0.0.0 --port 3000 --round-timeout-secs 60
//! ```

use std::time::Duration;

use clap::Parser;

use crossfire_server::{config::ServerConfig, ui::Server};
use crossfire_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "crossfire-server")]
#[command(about = "Session coordinator for distributed differential stress-testing", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,

    /// Abort a room when a test case or an output takes longer than this
    #[arg(long)]
    round_timeout_secs: Option<u64>,
}

impl From<Args> for ServerConfig {
    fn from(args: Args) -> Self {
        Self {
            host: args.host,
            port: args.port,
            round_timeout: args.round_timeout_secs.map(Duration::from_secs),
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let config = ServerConfig::from(Args::parse());

    if let Err(e) = Server::new(config).run().await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
