//! UseCase: 参加者切断処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - DisconnectParticipantUseCase::execute() メソッド
//! - 切断した接続のルームからの除去と、残りのメンバーへの通知
//!
//! ### なぜこのテストが必要か
//! - ラウンド中に切断した参加者がラウンドを止めてはいけない
//! - ホストが切断した場合はルームを必ずエラー終了させる必要がある
//!
//! ### どのような状況を想定しているか
//! - 正常系：参加者の切断（user_update の通知）
//! - 正常系：ラウンド中の参加者の切断（ラウンドの完了）
//! - 異常系：ホストの切断（error_occurred とルームの破棄）
//! - エッジケース：ルームに所属していない接続の切断、最後のメンバーの切断

use std::sync::Arc;

use crate::domain::{ConnectionId, MessagePusher, RoomRepository};

use super::round_controller::RoundController;

/// 参加者切断のユースケース
pub struct DisconnectParticipantUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn RoomRepository>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
    round_controller: Arc<RoundController>,
}

impl DisconnectParticipantUseCase {
    /// 新しい DisconnectParticipantUseCase を作成
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        round_controller: Arc<RoundController>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
            round_controller,
        }
    }

    /// 参加者切断を実行
    ///
    /// 未知の接続に対しては何もしません。
    pub async fn execute(&self, connection_id: &ConnectionId) {
        // 1. 接続レジストリから削除（所属していたルームが返る）
        let affected_room = self.repository.detach_connection(connection_id).await;

        // 2. MessagePusher からクライアントを登録解除
        self.message_pusher.unregister_client(connection_id).await;

        // 3. ルームから外し、残りのメンバーに通知
        if let Some(room_id) = affected_room {
            self.round_controller
                .remove_member(connection_id, &room_id)
                .await;
        }

        tracing::info!("Connection '{}' closed", connection_id);
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        infrastructure::dto::websocket::ServerMessage,
        usecase::{round_controller::HOST_DISCONNECTED_MESSAGE, test_support::Harness},
    };

    #[tokio::test]
    async fn test_participant_disconnect_updates_members() {
        // テスト項目: 参加者が切断すると残りのメンバーに user_update が通知される
        // given (前提条件):
        let harness = Harness::new(None);
        let (_host, mut host_rx) = harness.join("r1", true).await;
        let (participant, _participant_rx) = harness.join("r1", false).await;
        harness.drain(&mut host_rx);

        // when (操作):
        harness.disconnect.execute(&participant).await;

        // then (期待する結果):
        assert_eq!(
            harness.drain(&mut host_rx),
            vec![ServerMessage::UserUpdate { members: 1 }]
        );
        assert_eq!(harness.count_connections().await, 1);
    }

    #[tokio::test]
    async fn test_host_disconnect_errors_room() {
        // テスト項目: ホストが切断するとルームがエラー終了し、残りのメンバーに通知される
        // given (前提条件):
        let harness = Harness::new(None);
        let (host, _host_rx) = harness.join("r1", true).await;
        let (participant, mut participant_rx) = harness.join("r1", false).await;
        harness.drain(&mut participant_rx);

        // when (操作):
        harness.disconnect.execute(&host).await;

        // then (期待する結果):
        assert_eq!(
            harness.drain(&mut participant_rx),
            vec![ServerMessage::ErrorOccurred {
                message: HOST_DISCONNECTED_MESSAGE.to_string(),
            }]
        );
        assert!(harness.find_room("r1").await.is_none());
        assert_eq!(harness.room_of(&participant).await, None);
    }

    #[tokio::test]
    async fn test_disconnect_mid_round_does_not_block_round() {
        // テスト項目: ラウンド中に未提出の参加者が切断すると、残りの出力でラウンドが完了する
        // given (前提条件):
        let harness = Harness::new(None);
        let (host, mut host_rx) = harness.join("r1", true).await;
        let (slow, _slow_rx) = harness.join("r1", false).await;
        harness.start("r1", &host).await;
        harness.submit_input("r1", &host, "5\n3\n").await;
        harness.submit_output("r1", &host, "5\n3\n").await;
        harness.drain(&mut host_rx);

        // when (操作):
        harness.disconnect.execute(&slow).await;

        // then (期待する結果):
        assert_eq!(
            harness.drain(&mut host_rx),
            vec![
                ServerMessage::UserUpdate { members: 1 },
                ServerMessage::AllMatch { remaining: 9 },
                ServerMessage::GenerateTestCase,
            ]
        );
    }

    #[tokio::test]
    async fn test_last_member_disconnect_removes_room() {
        // テスト項目: 最後のメンバーが切断するとルームが削除される
        // given (前提条件):
        let harness = Harness::new(None);
        let (participant, _rx) = harness.join("r1", false).await;

        // when (操作):
        harness.disconnect.execute(&participant).await;

        // then (期待する結果):
        assert!(harness.find_room("r1").await.is_none());
    }

    #[tokio::test]
    async fn test_disconnect_without_room_is_noop() {
        // テスト項目: ルームに所属していない接続の切断は何も通知しない
        // given (前提条件):
        let harness = Harness::new(None);
        let (lonely, _lonely_rx) = harness.connect().await;
        let (_host, mut host_rx) = harness.join("r1", true).await;
        harness.drain(&mut host_rx);

        // when (操作):
        harness.disconnect.execute(&lonely).await;

        // then (期待する結果):
        assert!(harness.drain(&mut host_rx).is_empty());
        assert_eq!(harness.count_connections().await, 1);
    }
}
