//! Logging setup shared by the coordinator and the client runtime.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Workspace crates whose events are enabled by the default filter.
const WORKSPACE_CRATES: [&str; 3] = ["crossfire_shared", "crossfire_server", "crossfire_client"];

/// Build the default filter directive used when `RUST_LOG` is not set.
///
/// Every workspace crate and the running binary log at `default_log_level`.
pub fn default_directive(binary_name: &str, default_log_level: &str) -> String {
    WORKSPACE_CRATES
        .iter()
        .copied()
        .chain(std::iter::once(binary_name))
        .map(|target| format!("{}={}", target.replace('-', "_"), default_log_level))
        .collect::<Vec<_>>()
        .join(",")
}

/// Initialize the tracing subscriber with the specified default log level.
///
/// The log level can be overridden using the `RUST_LOG` environment variable.
///
/// # Examples
///
/// ```no_run
/// use crossfire_shared::logger::setup_logger;
///
/// setup_logger("crossfire-server", "debug");
/// ```
pub fn setup_logger(binary_name: &str, default_log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_directive(binary_name, default_log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive_covers_workspace_and_binary() {
        // テスト項目: デフォルトのフィルタにワークスペースの全クレートとバイナリが含まれる
        // given (前提条件):
        let binary_name = "crossfire-client";

        // when (操作):
        let directive = default_directive(binary_name, "info");

        // then (期待する結果):
        assert!(directive.contains("crossfire_shared=info"));
        assert!(directive.contains("crossfire_server=info"));
        assert!(directive.contains("crossfire_client=info"));
        assert_eq!(directive.matches("crossfire_client=info").count(), 2);
        assert!(!directive.contains('-'));
    }
}
