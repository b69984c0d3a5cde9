//! Room / Round エンティティ
//!
//! [`Room`] はメンバー・ホスト・進行中の [`Round`]（最大 1 つ）を持ちます。
//! 状態遷移はすべて `Room` のメソッドを通して行い、呼び出し側はルームのロックを
//! 保持しています。そのため 1 つのルームのラウンドは必ず順番に進みます。
//!
//! ```text
//! Forming ──host joins──▶ Ready ──start──▶ Running ──all outputs──▶ Comparing
//!                                            ▲                        │
//!                                            └──────── match ─────────┤
//!                                                                     ├─▶ Completed
//!                                                                     └─▶ Mismatched
//! any non-terminal state ──error / host left / timeout──▶ Errored
//! ```

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use super::{
    diff,
    error::RoomError,
    value_object::{ConnectionId, MatchCount, RoomId, Timestamp},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomState {
    /// No host yet
    Forming,
    /// Host assigned, waiting for the start signal
    Ready,
    /// A round is in flight
    Running,
    /// All outputs collected, comparison in progress
    Comparing,
    Mismatched,
    Errored,
    Completed,
}

impl RoomState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RoomState::Mismatched | RoomState::Errored | RoomState::Completed
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RoomState::Forming => "forming",
            RoomState::Ready => "ready",
            RoomState::Running => "running",
            RoomState::Comparing => "comparing",
            RoomState::Mismatched => "mismatched",
            RoomState::Errored => "errored",
            RoomState::Completed => "completed",
        }
    }
}

impl fmt::Display for RoomState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Host,
    Participant,
}

/// One generate → dispatch → collect → compare cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Round {
    pub number: u64,
    /// Present once the host submitted the generated test case
    pub test_case: Option<String>,
    pub outputs: HashMap<ConnectionId, String>,
    /// Membership snapshot taken at dispatch, minus those who answered or left
    pub pending: BTreeSet<ConnectionId>,
}

impl Round {
    fn new(number: u64) -> Self {
        Self {
            number,
            test_case: None,
            outputs: HashMap::new(),
            pending: BTreeSet::new(),
        }
    }

    pub fn is_awaiting_test_case(&self) -> bool {
        self.test_case.is_none()
    }

    fn is_complete(&self) -> bool {
        self.test_case.is_some() && self.pending.is_empty()
    }
}

/// Patch between two members' outputs for one round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairDiff {
    pub users: (ConnectionId, ConnectionId),
    pub patch: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundOutcome {
    /// Every output matched and another round has already begun
    Matched { remaining: u32 },
    /// Every output matched and the required match count was reached
    Completed,
    /// At least two outputs differ. Carries every submitted output in join
    /// order; the patches are computed by [`pairwise_diffs`] off the room lock.
    Mismatched {
        input: String,
        outputs: Vec<(ConnectionId, String)>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaveOutcome {
    NotMember,
    /// The host left; the room is now errored
    HostLeft,
    /// A regular member left. Carries the round outcome when the departure
    /// emptied the pending set.
    Left { round_outcome: Option<RoundOutcome> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Room {
    pub id: RoomId,
    /// Members in join order
    pub members: Vec<ConnectionId>,
    pub host: Option<ConnectionId>,
    pub state: RoomState,
    pub rounds_started: u64,
    pub remaining_matches: u32,
    pub round: Option<Round>,
    /// Bumped every time the room starts waiting at a barrier
    pub epoch: u64,
    pub created_at: Timestamp,
}

impl Room {
    pub fn new(id: RoomId, created_at: Timestamp) -> Self {
        Self {
            id,
            members: Vec::new(),
            host: None,
            state: RoomState::Forming,
            rounds_started: 0,
            remaining_matches: MatchCount::DEFAULT.value(),
            round: None,
            epoch: 0,
            created_at,
        }
    }

    pub fn is_member(&self, connection_id: &ConnectionId) -> bool {
        self.members.contains(connection_id)
    }

    pub fn is_host(&self, connection_id: &ConnectionId) -> bool {
        self.host.as_ref() == Some(connection_id)
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn role_of(&self, connection_id: &ConnectionId) -> Option<Role> {
        if self.is_host(connection_id) {
            Some(Role::Host)
        } else if self.is_member(connection_id) {
            Some(Role::Participant)
        } else {
            None
        }
    }

    /// Add a member. The first joiner that wants the host role gets it and
    /// sets the required match count.
    ///
    /// Joining twice is a no-op that reports the existing role.
    pub fn join(
        &mut self,
        connection_id: ConnectionId,
        wants_host: bool,
        required_matches: MatchCount,
    ) -> Result<Role, RoomError> {
        if self.is_terminal() {
            return Err(RoomError::RoomClosed);
        }
        if let Some(role) = self.role_of(&connection_id) {
            return Ok(role);
        }

        self.members.push(connection_id);
        if wants_host && self.host.is_none() {
            self.host = Some(connection_id);
            self.remaining_matches = required_matches.value();
            self.state = RoomState::Ready;
            return Ok(Role::Host);
        }
        Ok(Role::Participant)
    }

    /// Host's start signal. Opens the first round, waiting for a test case.
    pub fn start(&mut self, connection_id: &ConnectionId) -> Result<ConnectionId, RoomError> {
        self.ensure_host(connection_id)?;
        if self.state != RoomState::Ready {
            return Err(RoomError::InvalidState(self.state));
        }
        self.begin_round();
        Ok(*connection_id)
    }

    /// Host's generated test case. Snapshots the membership as the pending set
    /// and returns the members the test case must be dispatched to.
    pub fn submit_test_case(
        &mut self,
        connection_id: &ConnectionId,
        input: String,
    ) -> Result<Vec<ConnectionId>, RoomError> {
        self.ensure_host(connection_id)?;
        let round = match (self.state, self.round.as_mut()) {
            (RoomState::Running, Some(round)) if round.is_awaiting_test_case() => round,
            _ => return Err(RoomError::InvalidState(self.state)),
        };

        round.test_case = Some(input);
        round.pending = self.members.iter().copied().collect();
        self.epoch += 1;
        Ok(self.members.clone())
    }

    /// A member's program output for the current round.
    ///
    /// Returns the round outcome once the last pending output arrives.
    pub fn submit_output(
        &mut self,
        connection_id: &ConnectionId,
        output: String,
    ) -> Result<Option<RoundOutcome>, RoomError> {
        if self.is_terminal() {
            return Err(RoomError::RoomClosed);
        }
        if !self.is_member(connection_id) {
            return Err(RoomError::NotMember);
        }
        let round = match (self.state, self.round.as_mut()) {
            (RoomState::Running, Some(round)) if !round.is_awaiting_test_case() => round,
            _ => return Err(RoomError::InvalidState(self.state)),
        };
        if !round.pending.remove(connection_id) {
            return Err(RoomError::NotPending);
        }

        round.outputs.insert(*connection_id, output);
        Ok(self.conclude_if_complete())
    }

    /// Remove a member.
    ///
    /// A departing participant stops blocking the round and its output is
    /// dropped from the comparison. A departing host errors the room.
    pub fn leave(&mut self, connection_id: &ConnectionId) -> LeaveOutcome {
        let Some(position) = self.members.iter().position(|id| id == connection_id) else {
            return LeaveOutcome::NotMember;
        };
        self.members.remove(position);

        if self.is_host(connection_id) {
            self.fail();
            return LeaveOutcome::HostLeft;
        }
        if self.is_terminal() {
            return LeaveOutcome::Left {
                round_outcome: None,
            };
        }

        if let Some(round) = self.round.as_mut() {
            round.pending.remove(connection_id);
            round.outputs.remove(connection_id);
        }
        LeaveOutcome::Left {
            round_outcome: self.conclude_if_complete(),
        }
    }

    /// Move to `Errored`, abandoning the in-flight round.
    pub fn fail(&mut self) {
        if !self.is_terminal() {
            self.state = RoomState::Errored;
        }
        self.round = None;
    }

    /// Whether the room is still waiting at the barrier identified by `epoch`.
    pub fn is_waiting_at(&self, epoch: u64) -> bool {
        self.state == RoomState::Running && self.epoch == epoch
    }

    fn ensure_host(&self, connection_id: &ConnectionId) -> Result<(), RoomError> {
        if self.is_terminal() {
            return Err(RoomError::RoomClosed);
        }
        if !self.is_member(connection_id) {
            return Err(RoomError::NotMember);
        }
        if !self.is_host(connection_id) {
            return Err(RoomError::NotHost);
        }
        Ok(())
    }

    fn begin_round(&mut self) {
        self.rounds_started += 1;
        self.round = Some(Round::new(self.rounds_started));
        self.state = RoomState::Running;
        self.epoch += 1;
    }

    fn conclude_if_complete(&mut self) -> Option<RoundOutcome> {
        if !self.round.as_ref().is_some_and(Round::is_complete) {
            return None;
        }
        self.state = RoomState::Comparing;
        let round = self.round.take()?;
        Some(self.compare(round))
    }

    fn compare(&mut self, mut round: Round) -> RoundOutcome {
        let outputs: Vec<(ConnectionId, String)> = self
            .members
            .iter()
            .filter_map(|id| round.outputs.remove(id).map(|output| (*id, output)))
            .collect();

        if outputs.windows(2).any(|pair| pair[0].1 != pair[1].1) {
            self.state = RoomState::Mismatched;
            return RoundOutcome::Mismatched {
                input: round.test_case.unwrap_or_default(),
                outputs,
            };
        }

        self.remaining_matches = self.remaining_matches.saturating_sub(1);
        if self.remaining_matches == 0 {
            self.state = RoomState::Completed;
            return RoundOutcome::Completed;
        }
        self.begin_round();
        RoundOutcome::Matched {
            remaining: self.remaining_matches,
        }
    }
}

/// Diff every unordered pair of outputs that differ, in the given order.
///
/// CPU-bound on large outputs; async callers run it on the blocking pool.
pub fn pairwise_diffs(outputs: &[(ConnectionId, String)]) -> Vec<PairDiff> {
    let mut diffs = Vec::new();
    for (i, (left_id, left)) in outputs.iter().enumerate() {
        for (right_id, right) in &outputs[i + 1..] {
            if left == right {
                continue;
            }
            diffs.push(PairDiff {
                users: (*left_id, *right_id),
                patch: diff::diff(left.as_bytes(), right.as_bytes()),
            });
        }
    }
    diffs
}
