//! Value Object 定義
//!
//! 接続 ID・ルーム ID・一致回数・タイムスタンプ。生成時に検証を行い、不正な値は作れません。

use std::fmt;

use uuid::Uuid;

use super::error::ValueObjectError;

/// Longest room identifier accepted from a client.
pub const MAX_ROOM_ID_LENGTH: usize = 128;

/// Opaque identifier of one live connection.
///
/// Issued by the coordinator when the channel is established; clients never
/// choose it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// First four characters, used in human-facing messages.
    pub fn short(&self) -> String {
        self.0.simple().to_string().chars().take(4).collect()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Caller-supplied room name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoomId(String);

impl RoomId {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        if value.trim().is_empty() {
            return Err(ValueObjectError::EmptyRoomId);
        }
        if value.len() > MAX_ROOM_ID_LENGTH {
            return Err(ValueObjectError::RoomIdTooLong {
                len: value.len(),
                max: MAX_ROOM_ID_LENGTH,
            });
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for RoomId {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Number of consecutive matching rounds a session must reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchCount(u32);

impl MatchCount {
    pub const DEFAULT: MatchCount = MatchCount(10);

    pub fn new(value: u32) -> Result<Self, ValueObjectError> {
        if value == 0 {
            return Err(ValueObjectError::ZeroMatchCount);
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

impl Default for MatchCount {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Unix timestamp in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_ids_are_unique() {
        // テスト項目: 生成される ConnectionId は毎回異なる
        // given (前提条件):

        // when (操作):
        let a = ConnectionId::generate();
        let b = ConnectionId::generate();

        // then (期待する結果):
        assert_ne!(a, b);
    }

    #[test]
    fn test_connection_id_short_form() {
        // テスト項目: short() は ID の先頭 4 文字を返す
        // given (前提条件):
        let id = ConnectionId::generate();

        // when (操作):
        let short = id.short();

        // then (期待する結果):
        assert_eq!(short.len(), 4);
        assert!(id.to_string().replace('-', "").starts_with(&short));
    }

    #[test]
    fn test_room_id_accepts_regular_name() {
        // テスト項目: 通常のルーム名は RoomId として受け入れられる
        // given (前提条件):
        let name = "r1".to_string();

        // when (操作):
        let result = RoomId::try_from(name);

        // then (期待する結果):
        assert_eq!(result.unwrap().as_str(), "r1");
    }

    #[test]
    fn test_room_id_rejects_blank_name() {
        // テスト項目: 空白のみのルーム名はエラーになる
        // given (前提条件):
        let name = "   ".to_string();

        // when (操作):
        let result = RoomId::new(name);

        // then (期待する結果):
        assert_eq!(result, Err(ValueObjectError::EmptyRoomId));
    }

    #[test]
    fn test_room_id_rejects_too_long_name() {
        // テスト項目: 長すぎるルーム名はエラーになる
        // given (前提条件):
        let name = "x".repeat(MAX_ROOM_ID_LENGTH + 1);

        // when (操作):
        let result = RoomId::new(name);

        // then (期待する結果):
        assert!(matches!(
            result,
            Err(ValueObjectError::RoomIdTooLong { len, max }) if len == MAX_ROOM_ID_LENGTH + 1 && max == MAX_ROOM_ID_LENGTH
        ));
    }

    #[test]
    fn test_match_count_rejects_zero() {
        // テスト項目: 0 回の一致回数は指定できない
        // given (前提条件):

        // when (操作):
        let zero = MatchCount::new(0);
        let one = MatchCount::new(1);

        // then (期待する結果):
        assert_eq!(zero, Err(ValueObjectError::ZeroMatchCount));
        assert_eq!(one.unwrap().value(), 1);
        assert_eq!(MatchCount::default().value(), 10);
    }
}
