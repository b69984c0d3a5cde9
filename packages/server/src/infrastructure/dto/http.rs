//! HTTP API response DTOs.

use serde::{Deserialize, Serialize};

/// Entry of `GET /api/rooms`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummaryDto {
    pub id: String,
    pub state: String,
    pub members: usize,
    /// RFC 3339 (UTC)
    pub created_at: String,
}

/// Response of `GET /api/rooms/{room_id}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomDetailDto {
    pub id: String,
    pub state: String,
    pub host: Option<String>,
    /// Connection ids in join order
    pub members: Vec<String>,
    pub round: Option<RoundDto>,
    pub remaining_matches: u32,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundDto {
    pub number: u64,
    pub awaiting_test_case: bool,
    pub submitted: usize,
    pub pending: usize,
}
