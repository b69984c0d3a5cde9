//! Repository trait 定義
//!
//! ドメイン層が必要とするデータアクセスのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。
//!
//! ## ロックの順序
//!
//! ルームは 1 つずつ `tokio::sync::Mutex` で保護され（[`SharedRoom`]）、
//! 同一ルームのイベント処理はこのロックで直列化されます。
//! ルームのロックを保持したまま Repository のメソッドを呼ぶことは許可されますが、
//! Repository の実装はルームのロックを取得してはいけません（[`RoomRepository::list_rooms`] を除く。
//! これは内部のテーブルのロックを解放してからルームをロックします）。

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{ConnectionId, RepositoryError, Role, Room, RoomId, Timestamp};

/// ルームごとに排他制御されたハンドル
pub type SharedRoom = Arc<Mutex<Room>>;

/// ロック済みのルーム。[`OwnedMutexGuard::mutex`] で元のハンドルを辿れる
pub type RoomGuard = OwnedMutexGuard<Room>;

/// Room Repository trait
///
/// 接続レジストリとルームテーブルという、プロセス全体で共有される 2 つの状態への
/// インターフェース。UseCase 層はこの trait に依存し、Infrastructure 層の具体的な実装には依存しない。
#[async_trait]
pub trait RoomRepository: Send + Sync {
    /// 新しい接続を登録し、接続 ID を発行
    async fn register_connection(&self) -> ConnectionId;

    /// 接続をルームに紐付け、直前に所属していた別のルームがあれば返す
    async fn attach_connection(
        &self,
        connection_id: &ConnectionId,
        room_id: RoomId,
        role: Role,
    ) -> Option<RoomId>;

    /// 接続が現在所属しているルーム
    async fn room_of(&self, connection_id: &ConnectionId) -> Option<RoomId>;

    /// 接続とルームの紐付けを外す（接続そのものは残る）
    async fn release_connection(&self, connection_id: &ConnectionId, room_id: &RoomId);

    /// 接続を削除し、通知が必要なルームを返す
    async fn detach_connection(&self, connection_id: &ConnectionId) -> Option<RoomId>;

    /// 接続中のクライアント数を取得
    async fn count_connections(&self) -> usize;

    /// ルームを取得し、存在しなければ作成する
    async fn get_or_create_room(&self, room_id: &RoomId, created_at: Timestamp) -> SharedRoom;

    async fn find_room(&self, room_id: &RoomId) -> Option<SharedRoom>;

    /// ルームをテーブルから削除
    ///
    /// テーブル上のエントリが `handle` 自身である場合だけ削除します。
    /// 同じ ID で作り直された別のルームは残り、`RoomNotFound` を返します。
    async fn remove_room(
        &self,
        room_id: &RoomId,
        handle: &SharedRoom,
    ) -> Result<(), RepositoryError>;

    /// 全ルームのスナップショットを取得（作成日時順）
    async fn list_rooms(&self) -> Vec<Room>;
}
