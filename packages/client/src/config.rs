//! Client configuration.

use std::path::PathBuf;

/// Default coordinator endpoint
pub const DEFAULT_SERVER_URL: &str = "ws://127.0.0.1:8080/ws";
/// Default number of consecutive matching rounds requested by a host
pub const DEFAULT_MATCH_COUNT: u32 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// WebSocket URL of the coordinator
    pub server_url: String,
    /// Room to join (created on first reference)
    pub room: String,
    /// Program under test; receives the test case file path as its only argument
    pub program: PathBuf,
    /// Generator command line; its presence requests the host role
    pub script: Option<String>,
    /// Required number of consecutive matching rounds
    pub count: u32,
}

impl ClientConfig {
    pub fn new(room: impl Into<String>, program: impl Into<PathBuf>) -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            room: room.into(),
            program: program.into(),
            script: None,
            count: DEFAULT_MATCH_COUNT,
        }
    }

    pub fn has_script(&self) -> bool {
        self.script.is_some()
    }
}
