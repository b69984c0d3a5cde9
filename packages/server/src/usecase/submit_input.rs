//! UseCase: テストケース受信処理（submit_input）
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SubmitInputUseCase::execute() メソッド
//! - ホストが生成したテストケースが、その時点の全メンバー（ホストを含む）に配布されること
//!
//! ### なぜこのテストが必要か
//! - ラウンドの pending はテストケース配布時点のメンバーのスナップショットで決まる
//!
//! ### どのような状況を想定しているか
//! - 正常系：全メンバーへの run_program
//! - 異常系：ホスト以外からのテストケース、要求していないテストケース

use std::sync::Arc;

use crate::domain::ConnectionId;

use super::{error::RoomEventError, round_controller::RoundController};

/// テストケース受信のユースケース
pub struct SubmitInputUseCase {
    round_controller: Arc<RoundController>,
}

impl SubmitInputUseCase {
    /// 新しい SubmitInputUseCase を作成
    pub fn new(round_controller: Arc<RoundController>) -> Self {
        Self { round_controller }
    }

    /// ホストのテストケースを受け取り、全メンバーに配布する
    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        room_id: &str,
        input: String,
    ) -> Result<(), RoomEventError> {
        let mut room = self
            .round_controller
            .lock_member_room(connection_id, room_id)
            .await?;
        let targets = room.submit_test_case(connection_id, input.clone())?;

        self.round_controller
            .dispatch(&room, &targets, input)
            .await;
        Ok(())
    }
}
