//! Error types for the client runtime.

use thiserror::Error;

/// Session-level errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// The coordinator could not be reached
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// A frame could not be encoded
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// A joined session ended without a verdict (lost connection, interrupted prompt)
    #[error("Session aborted: {0}")]
    SessionAborted(String),
}

/// Failures while running the generator or the program under test
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// The generator could not be started or exited unsuccessfully
    #[error("Test case generation failed: {0}")]
    GenerationFailure(String),

    /// The program under test could not be started
    #[error("Failed to start program '{program}': {reason}")]
    ExecutionStartFailure { program: String, reason: String },

    /// Preparing the test case file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
