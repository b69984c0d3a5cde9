//! UseCase: テスト開始処理（start_testing）
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - StartTestingUseCase::execute() メソッド
//! - ホストの開始合図で最初のラウンドが始まり、ホストだけに generate_test_case が届くこと
//!
//! ### なぜこのテストが必要か
//! - ラウンドを駆動できるのはホストだけ
//! - 同じルームで 2 つのラウンドが同時に走ってはいけない
//!
//! ### どのような状況を想定しているか
//! - 正常系：ホストによる開始
//! - 異常系：参加者による開始、二重の開始、存在しないルーム

use std::sync::Arc;

use crate::domain::ConnectionId;

use super::{error::RoomEventError, round_controller::RoundController};

/// テスト開始のユースケース
pub struct StartTestingUseCase {
    round_controller: Arc<RoundController>,
}

impl StartTestingUseCase {
    /// 新しい StartTestingUseCase を作成
    pub fn new(round_controller: Arc<RoundController>) -> Self {
        Self { round_controller }
    }

    /// ホストの開始合図を処理し、ホストに最初のテストケースを要求する
    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        room_id: &str,
    ) -> Result<(), RoomEventError> {
        let mut room = self
            .round_controller
            .lock_member_room(connection_id, room_id)
            .await?;
        room.start(connection_id)?;

        tracing::info!(
            "Room '{}': testing started with {} member(s)",
            room.id,
            room.members.len()
        );
        self.round_controller.request_test_case(&room).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use mockall::predicate::eq;

    use super::*;
    use crate::{
        domain::{
            MatchCount, MockMessagePusher, Notification, Role, RoomError, RoomId, RoomRepository,
            RoomState, Timestamp,
        },
        infrastructure::{
            dto::websocket::ServerMessage, repository::InMemoryRoomRepository,
        },
        usecase::test_support::Harness,
    };

    #[tokio::test]
    async fn test_host_start_requests_test_case_from_host_only() {
        // テスト項目: ホストが開始するとホストにだけ generate_test_case が送られる
        // given (前提条件):
        let repository = Arc::new(InMemoryRoomRepository::new());
        let host = repository.register_connection().await;
        let participant = repository.register_connection().await;
        let room_id = RoomId::new("r1".to_string()).unwrap();
        {
            let handle = repository
                .get_or_create_room(&room_id, Timestamp::new(0))
                .await;
            let mut room = handle.lock().await;
            room.join(host, true, MatchCount::DEFAULT).unwrap();
            room.join(participant, false, MatchCount::DEFAULT).unwrap();
        }
        repository
            .attach_connection(&host, room_id.clone(), Role::Host)
            .await;

        let mut pusher = MockMessagePusher::new();
        pusher
            .expect_push_to()
            .with(eq(host), eq(Notification::GenerateTestCase))
            .times(1)
            .returning(|_, _| Ok(()));
        pusher.expect_broadcast().never();
        let controller = Arc::new(RoundController::new(
            repository.clone(),
            Arc::new(pusher),
            None,
        ));
        let usecase = StartTestingUseCase::new(controller);

        // when (操作):
        let result = usecase.execute(&host, "r1").await;

        // then (期待する結果):
        assert_eq!(result, Ok(()));
        let handle = repository.find_room(&room_id).await.unwrap();
        assert_eq!(handle.lock().await.state, RoomState::Running);
    }

    #[tokio::test]
    async fn test_participant_cannot_start() {
        // テスト項目: 参加者が開始しようとすると NotHost で拒否される
        // given (前提条件):
        let harness = Harness::new(None);
        let (_host, mut host_rx) = harness.join("r1", true).await;
        let (participant, _participant_rx) = harness.join("r1", false).await;
        harness.drain(&mut host_rx);

        // when (操作):
        let result = harness.start_testing.execute(&participant, "r1").await;

        // then (期待する結果):
        assert_eq!(result, Err(RoomEventError::Rejected(RoomError::NotHost)));
        assert!(harness.drain(&mut host_rx).is_empty());
    }

    #[tokio::test]
    async fn test_second_start_is_rejected() {
        // テスト項目: 実行中のルームで再度開始しても新しいラウンドは始まらない
        // given (前提条件):
        let harness = Harness::new(None);
        let (host, mut host_rx) = harness.join("r1", true).await;
        harness.start("r1", &host).await;
        harness.drain(&mut host_rx);

        // when (操作):
        let result = harness.start_testing.execute(&host, "r1").await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(RoomEventError::Rejected(RoomError::InvalidState(
                RoomState::Running
            )))
        );
        assert!(harness.drain(&mut host_rx).is_empty());
    }

    #[tokio::test]
    async fn test_start_in_unknown_room_is_rejected() {
        // テスト項目: 存在しないルームへの開始は UnknownRoom になる
        // given (前提条件):
        let harness = Harness::new(None);
        let (host, mut host_rx) = harness.join("r1", true).await;
        harness.drain(&mut host_rx);

        // when (操作):
        let result = harness.start_testing.execute(&host, "r2").await;

        // then (期待する結果):
        assert_eq!(result, Err(RoomEventError::UnknownRoom("r2".to_string())));
        assert_eq!(
            harness.drain(&mut host_rx),
            Vec::<ServerMessage>::new()
        );
    }
}
