//! UseCase: 接続確立処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ConnectParticipantUseCase::execute() メソッド
//! - 接続 ID の発行と MessagePusher への登録
//!
//! ### なぜこのテストが必要か
//! - 接続 ID はクライアントが選ぶのではなくコーディネーターが発行するため、一意であることを保証
//! - 登録直後から通知が届くことを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：複数クライアントの接続

use std::sync::Arc;

use crate::domain::{ConnectionId, MessagePusher, PusherChannel, RoomRepository};

/// 接続確立のユースケース
pub struct ConnectParticipantUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn RoomRepository>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
}

impl ConnectParticipantUseCase {
    /// 新しい ConnectParticipantUseCase を作成
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
        }
    }

    /// 接続を登録し、発行した接続 ID を返す
    ///
    /// # Arguments
    ///
    /// * `sender` - クライアントへのメッセージ送信用チャンネル
    pub async fn execute(&self, sender: PusherChannel) -> ConnectionId {
        // 1. 接続レジストリに登録（ID の発行）
        let connection_id = self.repository.register_connection().await;

        // 2. MessagePusher にクライアントを登録
        self.message_pusher
            .register_client(connection_id, sender)
            .await;

        tracing::info!(
            "Connection '{}' established ({} connected)",
            connection_id,
            self.repository.count_connections().await
        );
        connection_id
    }
}
