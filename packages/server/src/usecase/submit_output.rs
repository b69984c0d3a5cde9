//! UseCase: 出力受信処理（submit_output）
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SubmitOutputUseCase::execute() メソッド
//! - 全員の出力が揃った時点での比較と、all_match / diff_found の通知
//!
//! ### なぜこのテストが必要か
//! - 出力が 1 つでも欠けている間は比較してはいけない
//! - 一致のたびに残り回数が 1 ずつ減り、0 でセッションが終了することを保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：全員一致（次のラウンドへ）、規定回数到達（完了）
//! - 正常系：不一致（diff_found とルームの破棄）
//! - 異常系：破棄されたルームへの出力

use std::sync::Arc;

use crate::domain::ConnectionId;

use super::{error::RoomEventError, round_controller::RoundController};

/// 出力受信のユースケース
pub struct SubmitOutputUseCase {
    round_controller: Arc<RoundController>,
}

impl SubmitOutputUseCase {
    /// 新しい SubmitOutputUseCase を作成
    pub fn new(round_controller: Arc<RoundController>) -> Self {
        Self { round_controller }
    }

    /// メンバーの出力を記録し、揃っていれば比較結果を通知する
    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        room_id: &str,
        output: String,
    ) -> Result<(), RoomEventError> {
        let mut room = self
            .round_controller
            .lock_member_room(connection_id, room_id)
            .await?;

        match room.submit_output(connection_id, output)? {
            Some(outcome) => self.round_controller.conclude(&mut room, outcome).await,
            None => tracing::debug!(
                "Room '{}': output from '{}' recorded",
                room.id,
                connection_id
            ),
        }
        Ok(())
    }
}
