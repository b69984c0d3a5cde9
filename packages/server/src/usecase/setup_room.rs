//! UseCase: ルームへの参加処理（setup_room）
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SetupRoomUseCase::execute() メソッド
//! - ルームの作成・参加、ホストの割り当て、setup_success / user_update の通知
//!
//! ### なぜこのテストが必要か
//! - スクリプトを持つ最初の参加者だけがホストになることを保証
//! - 接続は同時に 1 つのルームにしか所属できない
//!
//! ### どのような状況を想定しているか
//! - 正常系：ホスト・参加者の参加
//! - 正常系：同じルームへの再参加（冪等）、別のルームへの移動
//! - 異常系：不正なルーム ID、0 回のマッチ回数

use std::sync::Arc;

use crossfire_shared::time::now_millis;

use crate::domain::{
    ConnectionId, MatchCount, MessagePusher, Notification, Role, RoomGuard, RoomId,
    RoomRepository, Timestamp,
};

use super::{error::SetupRoomError, round_controller::RoundController};

/// ルーム参加のユースケース
pub struct SetupRoomUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn RoomRepository>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
    round_controller: Arc<RoundController>,
}

impl SetupRoomUseCase {
    /// 新しい SetupRoomUseCase を作成
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

    /// ルームへの参加を実行
    ///
    /// # Arguments
    ///
    /// * `connection_id` - 参加する接続
    /// * `room_id` - クライアントが指定したルーム名
    /// * `has_script` - ジェネレーターを持っているか（ホスト希望）
    /// * `count` - 必要な連続一致回数（ホストになった場合のみ使われる）
    ///
    /// # Returns
    ///
    /// * `Ok(Role)` - 割り当てられたロール
    /// * `Err(SetupRoomError)` - 参加失敗。送信元には error_occurred で理由を通知済み
    pub async fn execute(
        &self,
        connection_id: ConnectionId,
        room_id: String,
        has_script: bool,
        count: Option<u32>,
    ) -> Result<Role, SetupRoomError> {
        let result = self
            .join_room(connection_id, room_id, has_script, count)
            .await;

        if let Err(e) = &result {
            let notification = Notification::ErrorOccurred {
                message: e.to_string(),
            };
            if let Err(push_error) = self
                .message_pusher
                .push_to(&connection_id, &notification)
                .await
            {
                tracing::warn!(
                    "Failed to report setup rejection to '{}': {}",
                    connection_id,
                    push_error
                );
            }
        }
        result
    }

    async fn join_room(
        &self,
        connection_id: ConnectionId,
        room_id: String,
        has_script: bool,
        count: Option<u32>,
    ) -> Result<Role, SetupRoomError> {
        let room_id = RoomId::new(room_id)?;
        let required_matches = count.map(MatchCount::new).transpose()?.unwrap_or_default();

        // 1. 別のルームに所属していれば先に抜ける
        if let Some(previous) = self.repository.room_of(&connection_id).await
            && previous != room_id
        {
            self.round_controller
                .remove_member(&connection_id, &previous)
                .await;
        }

        // 2. ルームをロックして参加
        let mut room = self.lock_or_create(&room_id).await;
        let role = room.join(connection_id, has_script, required_matches)?;
        self.repository
            .attach_connection(&connection_id, room_id.clone(), role)
            .await;
        tracing::info!(
            "Connection '{}' joined room '{}' as {:?} ({} member(s))",
            connection_id,
            room_id,
            role,
            room.members.len()
        );

        // 3. 参加者本人に setup_success、ルーム全体に user_update を通知
        let setup_success = Notification::SetupSuccess {
            connection_id,
            is_host: role == Role::Host,
        };
        if let Err(e) = self
            .message_pusher
            .push_to(&connection_id, &setup_success)
            .await
        {
            tracing::warn!("Failed to send setup_success to '{}': {}", connection_id, e);
        }
        self.round_controller.broadcast_user_update(&room).await;

        Ok(role)
    }

    /// ルームを取得（なければ作成）してロックする
    ///
    /// ロックを待っている間にルームが破棄・再作成された場合は、テーブル上の最新のルームで
    /// やり直します。
    async fn lock_or_create(&self, room_id: &RoomId) -> RoomGuard {
        loop {
            let handle = self
                .repository
                .get_or_create_room(room_id, Timestamp::new(now_millis()))
                .await;
            let room = Arc::clone(&handle).lock_owned().await;

            match self.repository.find_room(room_id).await {
                Some(current) if Arc::ptr_eq(&current, &handle) => return room,
                _ => tracing::debug!("Room '{}' was replaced while waiting, retrying", room_id),
            }
        }
    }
}
