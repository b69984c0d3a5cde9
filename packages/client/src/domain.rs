//! Domain logic for client-side operations.
//!
//! This module contains pure functions that implement business logic
//! without side effects, making them easy to test.

use crate::error::ClientError;

/// Reported when the host's generator fails
pub const GENERATION_FAILURE_MESSAGE: &str = "Host failed to generate a test case.";

/// How a joined session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEnd {
    /// The required number of matching rounds was reached
    Completed,
    /// A mismatch was found and reported
    MismatchFound,
    /// The room was errored (`error_occurred`)
    Failed(String),
}

impl SessionEnd {
    /// Process exit code for this outcome
    pub fn exit_code(&self) -> i32 {
        match self {
            SessionEnd::Completed | SessionEnd::MismatchFound => 0,
            SessionEnd::Failed(_) => 1,
        }
    }
}

/// Message reported when this client's program cannot be started.
///
/// # Arguments
///
/// * `connection_id` - The id assigned by the coordinator in `setup_success`
pub fn program_failure_message(connection_id: &str) -> String {
    let short: String = connection_id.chars().take(4).collect();
    format!("User {}'s program failed.", short)
}

/// Check if the client should attempt to reconnect.
///
/// Only the initial connection is retried; a session that was already joined
/// is never re-joined.
///
/// # Arguments
///
/// * `error` - The client error that occurred
/// * `current_attempt` - The number of attempts made so far
/// * `max_attempts` - The maximum number of connection attempts allowed
///
/// # Returns
///
/// `true` if reconnection should be attempted, `false` otherwise
pub fn should_attempt_reconnect(
    error: &ClientError,
    current_attempt: u32,
    max_attempts: u32,
) -> bool {
    if !matches!(error, ClientError::ConnectionError(_)) {
        return false;
    }

    current_attempt < max_attempts
}
