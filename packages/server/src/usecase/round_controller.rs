//! Round Controller
//!
//! 1 つのルームの「生成 → 配布 → 収集 → 比較」サイクルを駆動し、
//! ラウンドに関わる全ての通知（generate_test_case / run_program / all_match /
//! diff_found / error_occurred）を送信します。
//!
//! ## 呼び出し規約
//!
//! [`RoomGuard`] を受け取るメソッドは、呼び出し側がそのルームのロックを
//! 保持していることを前提とします。ルームのロックを取得するのは
//! [`RoundController::lock_member_room`] などの `SharedRoom` を扱うメソッドだけです。
//!
//! ## 終了処理
//!
//! ルームが終了状態になると、ルームテーブルから削除し、まだ接続中のメンバーと
//! ルームとの紐付けを接続レジストリから外します。破棄後に届いたイベントは
//! `UnknownRoom` として捨てられます。
//!
//! 同じ ID のルームは破棄後に作り直されることがあるため、削除やタイムアウトは
//! ID ではなくロックしているハンドルそのものを基準に行います。

use std::{
    sync::{Arc, Weak},
    time::Duration,
};

use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::{
    ConnectionId, LeaveOutcome, MessagePusher, Notification, Room, RoomGuard, RoomId,
    RoomRepository, RoundOutcome, pairwise_diffs,
};

use super::error::RoomEventError;

/// ホスト切断時にルームへ通知するメッセージ
pub const HOST_DISCONNECTED_MESSAGE: &str = "The host has disconnected.";
/// ラウンドがタイムアウトしたときのメッセージ
pub const ROUND_TIMED_OUT_MESSAGE: &str = "Round timed out";
/// 差分の計算が異常終了したときのメッセージ
pub const COMPARISON_FAILED_MESSAGE: &str = "Failed to compare outputs";

pub struct RoundController {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn RoomRepository>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
    /// バリア（テストケース待ち・出力待ち）1 回あたりの待ち時間の上限
    round_timeout: Option<Duration>,
}

impl RoundController {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        round_timeout: Option<Duration>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
            round_timeout,
        }
    }

    /// イベントの宛先ルームをロックして返す
    ///
    /// ルームが存在しない・既に破棄されている場合は `UnknownRoom`、
    /// 接続がメンバーでない場合は `NotInRoom` を返します。
    pub async fn lock_member_room(
        &self,
        connection_id: &ConnectionId,
        room_id: &str,
    ) -> Result<RoomGuard, RoomEventError> {
        let unknown = || RoomEventError::UnknownRoom(room_id.to_string());
        let room_id = RoomId::new(room_id.to_string()).map_err(|_| unknown())?;
        let handle = self
            .repository
            .find_room(&room_id)
            .await
            .ok_or_else(unknown)?;

        let room = handle.lock_owned().await;
        if room.is_terminal() {
            return Err(unknown());
        }
        if !room.is_member(connection_id) {
            return Err(RoomEventError::NotInRoom);
        }
        Ok(room)
    }

    /// ホストに次のテストケースを要求する
    pub async fn request_test_case(self: &Arc<Self>, room: &RoomGuard) {
        let Some(host) = room.host else {
            return;
        };
        let round = room.round.as_ref().map_or(0, |round| round.number);
        tracing::info!("Room '{}': round {} started", room.id, round);

        if let Err(e) = self
            .message_pusher
            .push_to(&host, &Notification::GenerateTestCase)
            .await
        {
            tracing::warn!("Room '{}': failed to request a test case: {}", room.id, e);
        }
        self.arm_watchdog(room);
    }

    /// テストケースを配布対象（ラウンド開始時点のメンバー）に送信する
    pub async fn dispatch(
        self: &Arc<Self>,
        room: &RoomGuard,
        targets: &[ConnectionId],
        input: String,
    ) {
        tracing::info!(
            "Room '{}': dispatching test case ({} bytes) to {} member(s)",
            room.id,
            input.len(),
            targets.len()
        );
        self.broadcast(targets, &Notification::RunProgram { input })
            .await;
        self.arm_watchdog(room);
    }

    /// 比較結果をルームに通知し、次のラウンドへ進むか終了処理を行う
    ///
    /// 不一致の場合、差分の計算はブロッキング用のスレッドプールで行います。
    /// ルームのロックは保持したままなので、同じルームのイベントは計算の完了を待ちます。
    pub async fn conclude(self: &Arc<Self>, room: &mut RoomGuard, outcome: RoundOutcome) {
        match outcome {
            RoundOutcome::Matched { remaining } => {
                tracing::info!("Room '{}': outputs match, {} to go", room.id, remaining);
                self.broadcast(&room.members, &Notification::AllMatch { remaining })
                    .await;
                self.request_test_case(room).await;
            }
            RoundOutcome::Completed => {
                tracing::info!("Room '{}': required matches reached", room.id);
                self.broadcast(&room.members, &Notification::AllMatch { remaining: 0 })
                    .await;
                self.tear_down(room).await;
            }
            RoundOutcome::Mismatched { input, outputs } => {
                let diffs =
                    match tokio::task::spawn_blocking(move || pairwise_diffs(&outputs)).await {
                        Ok(diffs) => diffs,
                        Err(e) => {
                            tracing::error!("Room '{}': diff task failed: {}", room.id, e);
                            self.abort(room, COMPARISON_FAILED_MESSAGE.to_string())
                                .await;
                            return;
                        }
                    };
                tracing::info!(
                    "Room '{}': mismatch found ({} differing pair(s))",
                    room.id,
                    diffs.len()
                );
                self.broadcast(&room.members, &Notification::DiffFound { input, diffs })
                    .await;
                self.tear_down(room).await;
            }
        }
    }

    /// ルームをエラー終了させ、残っている全メンバーに通知する
    pub async fn abort(&self, room: &mut RoomGuard, message: String) {
        tracing::info!("Room '{}': aborted: {}", room.id, message);
        room.fail();
        self.broadcast(&room.members, &Notification::ErrorOccurred { message })
            .await;
        self.tear_down(room).await;
    }

    /// 接続をルームから外し、その結果に応じた通知を行う
    ///
    /// ロックを待つ間にルームが破棄された（同じ ID で作り直された場合を含む）ときは
    /// 何もしません。
    pub async fn remove_member(self: &Arc<Self>, connection_id: &ConnectionId, room_id: &RoomId) {
        let Some(handle) = self.repository.find_room(room_id).await else {
            return;
        };
        let mut room = handle.lock_owned().await;
        if room.is_terminal() || !self.is_current(&room).await {
            tracing::debug!(
                "Room '{}' was torn down before '{}' could leave",
                room_id,
                connection_id
            );
            return;
        }

        match room.leave(connection_id) {
            LeaveOutcome::NotMember => {}
            LeaveOutcome::HostLeft => {
                tracing::info!("Room '{}': host '{}' left", room.id, connection_id);
                self.broadcast(
                    &room.members,
                    &Notification::ErrorOccurred {
                        message: HOST_DISCONNECTED_MESSAGE.to_string(),
                    },
                )
                .await;
                self.tear_down(&room).await;
            }
            LeaveOutcome::Left { round_outcome } => {
                tracing::info!("Room '{}': member '{}' left", room.id, connection_id);
                if room.is_empty() {
                    self.tear_down(&room).await;
                    return;
                }
                self.broadcast_user_update(&room).await;
                if let Some(outcome) = round_outcome {
                    self.conclude(&mut room, outcome).await;
                }
            }
        }
    }

    /// メンバー数の変化をルーム全体に通知する
    pub async fn broadcast_user_update(&self, room: &Room) {
        let notification = Notification::UserUpdate {
            members: room.members.len(),
        };
        self.broadcast(&room.members, &notification).await;
    }

    /// ロック中のルームがまだテーブルに登録されているハンドルかどうか
    async fn is_current(&self, room: &RoomGuard) -> bool {
        self.repository
            .find_room(&room.id)
            .await
            .is_some_and(|current| Arc::ptr_eq(&current, OwnedMutexGuard::mutex(room)))
    }

    /// ルームをテーブルから削除し、メンバーの紐付けを外す
    async fn tear_down(&self, room: &RoomGuard) {
        let handle = OwnedMutexGuard::mutex(room);
        if let Err(e) = self.repository.remove_room(&room.id, handle).await {
            tracing::debug!("Room '{}' was already removed: {}", room.id, e);
        }
        for member in &room.members {
            self.repository.release_connection(member, &room.id).await;
        }
    }

    async fn broadcast(&self, targets: &[ConnectionId], notification: &Notification) {
        if let Err(e) = self.message_pusher.broadcast(targets, notification).await {
            tracing::warn!("Failed to broadcast: {}", e);
        }
    }

    /// 現在のバリアに対してタイムアウトを仕掛ける
    ///
    /// タイマーはルームを弱参照で保持するため、破棄済みのルームを延命しません。
    fn arm_watchdog(self: &Arc<Self>, room: &RoomGuard) {
        let Some(timeout) = self.round_timeout else {
            return;
        };
        let controller = Arc::clone(self);
        let handle = Arc::downgrade(OwnedMutexGuard::mutex(room));
        let epoch = room.epoch;
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            controller.expire(handle, epoch).await;
        });
    }

    async fn expire(&self, handle: Weak<Mutex<Room>>, epoch: u64) {
        let Some(handle) = handle.upgrade() else {
            return;
        };
        let mut room = handle.lock_owned().await;
        if room.is_waiting_at(epoch) && self.is_current(&room).await {
            tracing::warn!("Room '{}': round timed out", room.id);
            self.abort(&mut room, ROUND_TIMED_OUT_MESSAGE.to_string())
                .await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::diff,
        infrastructure::dto::websocket::ServerMessage,
        usecase::test_support::{Harness, recv_message},
    };

    #[tokio::test]
    async fn test_lock_member_room_rejects_unknown_room_and_strangers() {
        // テスト項目: 存在しないルームは UnknownRoom、メンバー以外は NotInRoom になる
        // given (前提条件):
        let harness = Harness::new(None);
        let (host, _host_rx) = harness.join("r1", true).await;
        let (stranger, _stranger_rx) = harness.connect().await;

        // when (操作):
        let unknown = harness.controller.lock_member_room(&host, "nope").await;
        let not_in_room = harness.controller.lock_member_room(&stranger, "r1").await;
        let ok = harness.controller.lock_member_room(&host, "r1").await;

        // then (期待する結果):
        assert!(matches!(unknown, Err(RoomEventError::UnknownRoom(id)) if id == "nope"));
        assert!(matches!(not_in_room, Err(RoomEventError::NotInRoom)));
        assert!(ok.is_ok());
    }

    #[tokio::test]
    async fn test_watchdog_errors_stalled_room() {
        // テスト項目: タイムアウトを設定すると、出力が揃わないラウンドはエラー終了する
        // given (前提条件):
        let harness = Harness::new(Some(Duration::from_millis(50)));
        let (host, mut host_rx) = harness.join("r1", true).await;
        let (_participant, mut participant_rx) = harness.join("r1", false).await;
        harness.start("r1", &host).await;
        harness.submit_input("r1", &host, "1\n").await;
        harness.submit_output("r1", &host, "1\n").await;
        harness.drain(&mut host_rx);
        harness.drain(&mut participant_rx);

        // when (操作):
        tokio::time::sleep(Duration::from_millis(200)).await;

        // then (期待する結果):
        let expected = ServerMessage::ErrorOccurred {
            message: ROUND_TIMED_OUT_MESSAGE.to_string(),
        };
        assert_eq!(recv_message(&mut host_rx).await, expected);
        assert_eq!(recv_message(&mut participant_rx).await, expected);
        assert!(harness.find_room("r1").await.is_none());
    }

    #[tokio::test]
    async fn test_watchdog_ignores_progressed_barrier() {
        // テスト項目: バリアを通過済みのルームはタイムアウトしない
        // given (前提条件):
        let harness = Harness::new(Some(Duration::from_millis(200)));
        let (host, mut host_rx) = harness.join("r1", true).await;
        harness.start("r1", &host).await;

        // when (操作):
        harness.submit_input("r1", &host, "1\n").await;
        tokio::time::sleep(Duration::from_millis(120)).await;
        harness.submit_output("r1", &host, "1\n").await;
        tokio::time::sleep(Duration::from_millis(140)).await;

        // then (期待する結果): 古いバリアのタイマーは発火済みだがルームは生きている
        assert!(harness.find_room("r1").await.is_some());
        assert!(
            !harness
                .drain(&mut host_rx)
                .iter()
                .any(|message| matches!(message, ServerMessage::ErrorOccurred { .. }))
        );
    }

    #[tokio::test]
    async fn test_stale_disconnect_keeps_recreated_room() {
        // テスト項目: ロック待ちの間にルームが破棄・再作成されても、古い切断処理は新しいルームを壊さない
        // given (前提条件):
        let harness = Harness::new(None);
        let (old_host, _old_host_rx) = harness.join("r1", true).await;
        let (_participant, _participant_rx) = harness.join("r1", false).await;
        let old_handle = harness.find_room("r1").await.unwrap();
        let mut old_room = Arc::clone(&old_handle).lock_owned().await;

        let controller = Arc::clone(&harness.controller);
        let room_id = RoomId::new("r1".to_string()).unwrap();
        let stale =
            tokio::spawn(async move { controller.remove_member(&old_host, &room_id).await });
        tokio::time::sleep(Duration::from_millis(50)).await;

        harness
            .controller
            .abort(&mut old_room, "first session failed".to_string())
            .await;
        let (new_host, mut new_host_rx) = harness.join("r1", true).await;
        harness.drain(&mut new_host_rx);

        // when (操作):
        drop(old_room);
        stale.await.unwrap();

        // then (期待する結果):
        let current = harness.find_room("r1").await.unwrap();
        assert!(!Arc::ptr_eq(&current, &old_handle));
        assert_eq!(current.lock().await.members, vec![new_host]);
        assert_eq!(
            harness.room_of(&new_host).await,
            Some(RoomId::new("r1".to_string()).unwrap())
        );
        assert!(harness.drain(&mut new_host_rx).is_empty());
    }

    #[tokio::test]
    async fn test_stale_watchdog_ignores_recreated_room() {
        // テスト項目: 破棄されたルームのタイマーは、同じ ID で作り直されたルームをタイムアウトさせない
        // given (前提条件):
        let harness = Harness::new(Some(Duration::from_millis(300)));
        let (old_host, mut old_host_rx) = harness.join("r1", true).await;
        harness.start("r1", &old_host).await;
        harness
            .report_error
            .execute(&old_host, "first session failed".to_string())
            .await
            .unwrap();
        harness.drain(&mut old_host_rx);

        // when (操作): 古いタイマーと同じエポックで新しいルームが待機している間に発火させる
        tokio::time::sleep(Duration::from_millis(150)).await;
        let (new_host, mut new_host_rx) = harness.join("r1", true).await;
        harness.start("r1", &new_host).await;
        tokio::time::sleep(Duration::from_millis(230)).await;

        // then (期待する結果):
        let current = harness.find_room("r1").await.unwrap();
        assert!(current.lock().await.is_waiting_at(1));
        assert!(
            !harness
                .drain(&mut new_host_rx)
                .iter()
                .any(|message| matches!(message, ServerMessage::ErrorOccurred { .. }))
        );
    }

    #[tokio::test]
    async fn test_large_mismatch_is_diffed_on_blocking_pool() {
        // テスト項目: 5 万行ずつの全く異なる出力でも差分が計算され、diff_found が届く
        // given (前提条件):
        let harness = Harness::new(None);
        let (host, mut host_rx) = harness.join("r1", true).await;
        let (participant, mut participant_rx) = harness.join("r1", false).await;
        harness.start("r1", &host).await;
        harness.submit_input("r1", &host, "1\n").await;
        harness.drain(&mut host_rx);
        harness.drain(&mut participant_rx);
        let host_output: String = (0..50_000).map(|i| format!("host {i}\n")).collect();
        let participant_output: String = (0..50_000).map(|i| format!("other {i}\n")).collect();

        // when (操作):
        harness.submit_output("r1", &host, &host_output).await;
        harness
            .submit_output("r1", &participant, &participant_output)
            .await;

        // then (期待する結果):
        let ServerMessage::DiffFound { input, diffs } = recv_message(&mut host_rx).await else {
            panic!("expected diff_found");
        };
        assert_eq!(input, "1\n");
        assert_eq!(diffs.len(), 1);
        let rebuilt = diff::apply_patch(host_output.as_bytes(), &diffs[0].patch).unwrap();
        assert_eq!(rebuilt, participant_output.as_bytes());
        assert!(harness.find_room("r1").await.is_none());
    }
}
