//! ドメイン層のエラー定義

use thiserror::Error;

use super::entity::RoomState;

/// Validation errors raised when building value objects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("room id must not be empty")]
    EmptyRoomId,

    #[error("room id is too long ({len} > {max} bytes)")]
    RoomIdTooLong { len: usize, max: usize },

    #[error("match count must be at least 1")]
    ZeroMatchCount,
}

/// Rejections of the room state machine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomError {
    #[error("room is already closed")]
    RoomClosed,

    #[error("connection is not a member of the room")]
    NotMember,

    #[error("only the host may do this")]
    NotHost,

    #[error("not allowed while the room is {0}")]
    InvalidState(RoomState),

    #[error("no output is expected from this connection in the current round")]
    NotPending,
}

/// Errors raised while pushing messages to connections
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    #[error("client '{0}' is not registered")]
    ClientNotFound(String),

    #[error("failed to push message: {0}")]
    PushFailed(String),
}

/// Errors raised by the room table
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("room '{0}' not found")]
    RoomNotFound(String),
}

/// Errors raised while applying a patch produced by the diff engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatchError {
    #[error("malformed hunk header: {0}")]
    MalformedHeader(String),

    #[error("unexpected patch line: {0}")]
    UnexpectedLine(String),

    #[error("hunk does not match the original at line {line}")]
    ContextMismatch { line: usize },

    #[error("hunk refers to line {line} outside of the original")]
    OutOfRange { line: usize },
}
