//! Domain 層
//!
//! ルーム・ラウンド・接続レジストリ・差分エンジンを定義します。
//! ここでは I/O を行いません。外部とのやり取りは UseCase 層が
//! [`RoomRepository`] と [`MessagePusher`] を通して行います。

pub mod diff;
pub mod entity;
pub mod error;
pub mod message_pusher;
pub mod registry;
pub mod repository;
pub mod value_object;

pub use entity::{
    LeaveOutcome, PairDiff, Role, Room, RoomState, Round, RoundOutcome, pairwise_diffs,
};
pub use error::{MessagePushError, PatchError, RepositoryError, RoomError, ValueObjectError};
pub use message_pusher::{MessagePusher, Notification, PusherChannel};
pub use registry::{ConnectionEntry, ConnectionRegistry};
pub use repository::{RoomGuard, RoomRepository, SharedRoom};
pub use value_object::{ConnectionId, MatchCount, RoomId, Timestamp};

#[cfg(test)]
pub use message_pusher::MockMessagePusher;
