//! InMemory Room Repository 実装
//!
//! ドメイン層が定義する RoomRepository trait の具体的な実装。
//! HashMap をインメモリ DB として使用します。
//!
//! 接続レジストリとルームテーブルはそれぞれ別の `Mutex` で保護し、
//! どちらのロックも短時間しか保持しません。ルームそのものは [`SharedRoom`] として
//! 個別にロックされるため、あるルームの処理が他のルームを待たせることはありません。

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    ConnectionId, ConnectionRegistry, RepositoryError, Role, Room, RoomId, RoomRepository,
    SharedRoom, Timestamp,
};

/// インメモリ Room Repository 実装
pub struct InMemoryRoomRepository {
    /// 接続レジストリ
    connections: Mutex<ConnectionRegistry>,
    /// ルームテーブル
    ///
    /// Key: RoomId
    /// Value: SharedRoom
    rooms: Mutex<HashMap<RoomId, SharedRoom>>,
}

impl InMemoryRoomRepository {
    /// 新しい InMemoryRoomRepository を作成
    pub fn new() -> Self {
        Self {
            connections: Mutex::new(ConnectionRegistry::new()),
            rooms: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryRoomRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RoomRepository for InMemoryRoomRepository {
    async fn register_connection(&self) -> ConnectionId {
        self.connections.lock().await.register()
    }

    async fn attach_connection(
        &self,
        connection_id: &ConnectionId,
        room_id: RoomId,
        role: Role,
    ) -> Option<RoomId> {
        self.connections
            .lock()
            .await
            .attach_to_room(connection_id, room_id, role)
    }

    async fn room_of(&self, connection_id: &ConnectionId) -> Option<RoomId> {
        self.connections.lock().await.room_of(connection_id)
    }

    async fn release_connection(&self, connection_id: &ConnectionId, room_id: &RoomId) {
        self.connections
            .lock()
            .await
            .release(connection_id, room_id);
    }

    async fn detach_connection(&self, connection_id: &ConnectionId) -> Option<RoomId> {
        self.connections.lock().await.detach(connection_id)
    }

    async fn count_connections(&self) -> usize {
        self.connections.lock().await.len()
    }

    async fn get_or_create_room(&self, room_id: &RoomId, created_at: Timestamp) -> SharedRoom {
        let mut rooms = self.rooms.lock().await;
        rooms
            .entry(room_id.clone())
            .or_insert_with(|| {
                tracing::info!("Room '{}' created", room_id);
                Arc::new(Mutex::new(Room::new(room_id.clone(), created_at)))
            })
            .clone()
    }

    async fn find_room(&self, room_id: &RoomId) -> Option<SharedRoom> {
        self.rooms.lock().await.get(room_id).cloned()
    }

    async fn remove_room(
        &self,
        room_id: &RoomId,
        handle: &SharedRoom,
    ) -> Result<(), RepositoryError> {
        let mut rooms = self.rooms.lock().await;
        match rooms.get(room_id) {
            Some(current) if Arc::ptr_eq(current, handle) => {
                rooms.remove(room_id);
                tracing::info!("Room '{}' removed", room_id);
                Ok(())
            }
            _ => Err(RepositoryError::RoomNotFound(room_id.to_string())),
        }
    }

    async fn list_rooms(&self) -> Vec<Room> {
        // テーブルのロックを解放してから各ルームをロックする
        let handles: Vec<SharedRoom> = self.rooms.lock().await.values().cloned().collect();

        let mut rooms = Vec::with_capacity(handles.len());
        for handle in handles {
            rooms.push(handle.lock().await.clone());
        }
        rooms.sort_by(|a, b| {
            a.created_at
                .value()
                .cmp(&b.created_at.value())
                .then_with(|| a.id.cmp(&b.id))
        });
        rooms
    }
}
