//! Crossfire client runtime.
//!
//! Joins a room on the coordinator and runs the program under test for every
//! test case. With `--script` the client asks to be the host: it generates the
//! test cases and starts the run when ENTER is pressed.
//! The initial connection is retried (max 5 attempts with 5 second interval).
//!
//! Run with:
//! ```not_rust
//! cargo run --bin crossfire-client -- --room r1 --program ./a.out --script "python3 gen.py"
//! cargo run --bin crossfire-client -- --room r1 --program ./b.out
//! ```

use std::path::PathBuf;

use clap::Parser;

use crossfire_client::config::{ClientConfig, DEFAULT_MATCH_COUNT, DEFAULT_SERVER_URL};
use crossfire_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "crossfire-client")]
#[command(about = "Client runtime for distributed differential stress-testing", long_about = None)]
struct Args {
    /// Path to the executable program to test
    #[arg(long)]
    program: PathBuf,

    /// The room ID to join
    #[arg(long)]
    room: String,

    /// WebSocket URL of the coordinator
    #[arg(long, default_value = DEFAULT_SERVER_URL)]
    server: String,

    /// Test case generator command (requests the host role)
    #[arg(long)]
    script: Option<String>,

    /// Number of consecutive matching rounds required to finish
    #[arg(
        long,
        default_value_t = DEFAULT_MATCH_COUNT,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    count: u32,
}

impl From<Args> for ClientConfig {
    fn from(args: Args) -> Self {
        Self {
            server_url: args.server,
            room: args.room,
            program: args.program,
            script: args.script,
            count: args.count,
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let config = ClientConfig::from(Args::parse());

    match crossfire_client::run_client(config).await {
        Ok(end) => std::process::exit(end.exit_code()),
        Err(e) => {
            tracing::error!("Client error: {}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Result<Args, clap::Error> {
        let base = ["crossfire-client", "--program", "./a.out", "--room", "r1"];
        Args::try_parse_from(base.iter().chain(extra))
    }

    #[test]
    fn test_count_defaults_to_ten() {
        // テスト項目: --count を省略すると既定のマッチ回数になる
        // given (前提条件) / when (操作):
        let args = parse(&[]).unwrap();

        // then (期待する結果):
        assert_eq!(args.count, DEFAULT_MATCH_COUNT);
        assert_eq!(args.server, DEFAULT_SERVER_URL);
    }

    #[test]
    fn test_zero_count_is_rejected() {
        // テスト項目: --count 0 は引数の解析時点で拒否される
        // given (前提条件) / when (操作):
        let zero = parse(&["--count", "0"]);
        let one = parse(&["--count", "1"]);

        // then (期待する結果):
        assert_eq!(
            zero.unwrap_err().kind(),
            clap::error::ErrorKind::ValueValidation
        );
        assert_eq!(one.unwrap().count, 1);
    }
}
