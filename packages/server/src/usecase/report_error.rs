//! UseCase: エラー報告処理（error_occurred）
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ReportErrorUseCase::execute() メソッド
//! - クライアントからのエラー報告でルームが即座に破棄されること
//!
//! ### なぜこのテストが必要か
//! - ラウンド内の部分的な失敗は許容しない（1 人でも実行に失敗したら全員に通知して終了）
//!
//! ### どのような状況を想定しているか
//! - 正常系：テストケース生成の失敗、プログラムの起動失敗
//! - 異常系：ルームに所属していない接続からの報告

use std::sync::Arc;

use crate::domain::{ConnectionId, RoomRepository};

use super::{error::RoomEventError, round_controller::RoundController};

/// エラー報告のユースケース
pub struct ReportErrorUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn RoomRepository>,
    round_controller: Arc<RoundController>,
}

impl ReportErrorUseCase {
    /// 新しい ReportErrorUseCase を作成
    pub fn new(repository: Arc<dyn RoomRepository>, round_controller: Arc<RoundController>) -> Self {
        Self {
            repository,
            round_controller,
        }
    }

    /// 報告元が所属するルームをエラー終了させ、報告者を含む全メンバーに通知する
    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        message: String,
    ) -> Result<(), RoomEventError> {
        let room_id = self
            .repository
            .room_of(connection_id)
            .await
            .ok_or(RoomEventError::NotInRoom)?;
        let mut room = self
            .round_controller
            .lock_member_room(connection_id, room_id.as_str())
            .await?;

        tracing::info!(
            "Room '{}': error reported by '{}': {}",
            room.id,
            connection_id,
            message
        );
        self.round_controller.abort(&mut room, message).await;
        Ok(())
    }
}
