//! Conversion logic between DTOs and domain entities.

use crossfire_shared::time::millis_to_rfc3339;

use crate::domain::{Notification, PairDiff, Room, Round};
use crate::infrastructure::dto::{
    http::{RoomDetailDto, RoomSummaryDto, RoundDto},
    websocket as dto,
};

// ========================================
// Domain → WebSocket DTO
// ========================================

impl From<&PairDiff> for dto::DiffEntry {
    fn from(diff: &PairDiff) -> Self {
        let (left, right) = diff.users;
        Self {
            users: [left.to_string(), right.to_string()],
            patch: diff.patch.clone(),
        }
    }
}

impl From<&Notification> for dto::ServerMessage {
    fn from(notification: &Notification) -> Self {
        match notification {
            Notification::SetupSuccess {
                connection_id,
                is_host,
            } => Self::SetupSuccess {
                is_host: *is_host,
                connection_id: connection_id.to_string(),
            },
            Notification::UserUpdate { members } => Self::UserUpdate { members: *members },
            Notification::GenerateTestCase => Self::GenerateTestCase,
            Notification::RunProgram { input } => Self::RunProgram {
                input: input.clone(),
            },
            Notification::AllMatch { remaining } => Self::AllMatch {
                remaining: *remaining,
            },
            Notification::DiffFound { input, diffs } => Self::DiffFound {
                input: input.clone(),
                diffs: diffs.iter().map(dto::DiffEntry::from).collect(),
            },
            Notification::ErrorOccurred { message } => Self::ErrorOccurred {
                message: message.clone(),
            },
        }
    }
}

// ========================================
// Domain → HTTP DTO
// ========================================

impl From<&Round> for RoundDto {
    fn from(round: &Round) -> Self {
        Self {
            number: round.number,
            awaiting_test_case: round.is_awaiting_test_case(),
            submitted: round.outputs.len(),
            pending: round.pending.len(),
        }
    }
}

impl From<&Room> for RoomSummaryDto {
    fn from(room: &Room) -> Self {
        Self {
            id: room.id.as_str().to_string(),
            state: room.state.to_string(),
            members: room.members.len(),
            created_at: millis_to_rfc3339(room.created_at.value()),
        }
    }
}

impl From<&Room> for RoomDetailDto {
    fn from(room: &Room) -> Self {
        Self {
            id: room.id.as_str().to_string(),
            state: room.state.to_string(),
            host: room.host.map(|host| host.to_string()),
            members: room.members.iter().map(ToString::to_string).collect(),
            round: room.round.as_ref().map(RoundDto::from),
            remaining_matches: room.remaining_matches,
            created_at: millis_to_rfc3339(room.created_at.value()),
        }
    }
}
