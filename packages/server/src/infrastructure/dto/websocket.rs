//! WebSocket message DTOs.
//!
//! Every frame is a JSON text frame tagged by `type` (snake_case event name)
//! with camelCase fields. The client runtime reuses these types, so the two
//! sides cannot drift apart.

use serde::{Deserialize, Serialize};

/// Frames sent from a client to the coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    /// Join (and create if needed) a room; `has_script` requests the host role
    SetupRoom {
        room_id: String,
        has_script: bool,
        /// Required number of consecutive matching rounds (host only)
        #[serde(default, skip_serializing_if = "Option::is_none")]
        count: Option<u32>,
    },
    StartTesting {
        room_id: String,
    },
    SubmitInput {
        room_id: String,
        input: String,
    },
    SubmitOutput {
        room_id: String,
        output: String,
    },
    ErrorOccurred {
        message: String,
    },
}

/// Frames sent from the coordinator to a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    SetupSuccess {
        is_host: bool,
        #[serde(default)]
        connection_id: String,
    },
    UserUpdate {
        members: usize,
    },
    GenerateTestCase,
    RunProgram {
        input: String,
    },
    AllMatch {
        #[serde(default)]
        remaining: u32,
    },
    DiffFound {
        input: String,
        diffs: Vec<DiffEntry>,
    },
    ErrorOccurred {
        message: String,
    },
}

/// One pairwise patch inside `diff_found`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffEntry {
    pub users: [String; 2],
    pub patch: String,
}
