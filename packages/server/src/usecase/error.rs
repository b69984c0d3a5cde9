//! UseCase 層のエラー定義

use thiserror::Error;

use crate::domain::{RoomError, ValueObjectError};

/// `setup_room` の失敗
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetupRoomError {
    #[error("invalid setup request: {0}")]
    InvalidRequest(#[from] ValueObjectError),

    #[error("cannot join room: {0}")]
    Rejected(#[from] RoomError),
}

/// ルーム宛てのイベント（start_testing / submit_input / submit_output / error_occurred）の失敗
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomEventError {
    /// 存在しない、または既に破棄されたルーム
    #[error("unknown room '{0}'")]
    UnknownRoom(String),

    #[error("connection is not in the room")]
    NotInRoom,

    #[error("event rejected: {0}")]
    Rejected(#[from] RoomError),
}

/// ルーム詳細取得の失敗
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GetRoomDetailError {
    #[error("room '{0}' not found")]
    RoomNotFound(String),
}
