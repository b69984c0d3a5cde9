//! MessagePusher trait 定義
//!
//! ## 概要
//!
//! クライアントへの通知（メッセージ送信）を抽象化する trait。
//! UseCase 層は [`Notification`] というドメインの言葉で通知を組み立て、
//! ワイヤフォーマットへの変換は Infrastructure 層の実装が担当します。

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{ConnectionId, MessagePushError, PairDiff};

/// 接続ごとの送信チャンネル（UI 層で生成され、MessagePusher に登録される）
pub type PusherChannel = mpsc::UnboundedSender<String>;

/// コーディネーターからクライアントへの通知
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// ルームへの参加が受理された
    SetupSuccess {
        connection_id: ConnectionId,
        is_host: bool,
    },
    /// ルームのメンバー数が変化した
    UserUpdate { members: usize },
    /// ホストへの次のテストケース生成要求
    GenerateTestCase,
    /// テストケースでプログラムを実行する要求
    RunProgram { input: String },
    /// ラウンドが一致した（`remaining == 0` でセッション完了）
    AllMatch { remaining: u32 },
    /// 出力の不一致が見つかった
    DiffFound { input: String, diffs: Vec<PairDiff> },
    /// 致命的なエラー（ルームは破棄される）
    ErrorOccurred { message: String },
}

/// MessagePusher trait
///
/// ## 依存性の逆転（DIP）
///
/// - ドメイン層が通知のインターフェースを定義
/// - Infrastructure 層（WebSocket など）がこれを実装
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// クライアントの送信チャンネルを登録
    async fn register_client(&self, connection_id: ConnectionId, sender: PusherChannel);

    /// クライアントの送信チャンネルを登録解除
    async fn unregister_client(&self, connection_id: &ConnectionId);

    /// 特定のクライアントに通知を送信
    async fn push_to(
        &self,
        connection_id: &ConnectionId,
        notification: &Notification,
    ) -> Result<(), MessagePushError>;

    /// 複数のクライアントに通知を送信（一部の失敗は許容）
    async fn broadcast(
        &self,
        targets: &[ConnectionId],
        notification: &Notification,
    ) -> Result<(), MessagePushError>;
}
