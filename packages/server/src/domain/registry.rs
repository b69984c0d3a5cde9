//! 接続レジストリ
//!
//! 接続 ID から「現在所属しているルーム」と「ロール」を引くための表。
//! 1 つの接続が同時に所属できるルームは高々 1 つです。
//! 未知の接続 ID に対する操作はすべて no-op として扱います。

use std::collections::HashMap;

use super::{
    entity::Role,
    value_object::{ConnectionId, RoomId},
};

/// レジストリ上の 1 接続分のエントリ
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionEntry {
    pub room_id: Option<RoomId>,
    pub role: Option<Role>,
}

#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: HashMap<ConnectionId, ConnectionEntry>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 新しい接続を登録し、発行した ID を返す
    pub fn register(&mut self) -> ConnectionId {
        let id = ConnectionId::generate();
        self.connections.insert(id, ConnectionEntry::default());
        id
    }

    /// 接続をルームに紐付ける
    ///
    /// 直前に所属していたルームが別のルームだった場合はその ID を返します。
    pub fn attach_to_room(
        &mut self,
        id: &ConnectionId,
        room_id: RoomId,
        role: Role,
    ) -> Option<RoomId> {
        let entry = self.connections.get_mut(id)?;
        let previous = entry.room_id.replace(room_id);
        entry.role = Some(role);
        previous.filter(|previous| Some(previous) != entry.room_id.as_ref())
    }

    pub fn room_of(&self, id: &ConnectionId) -> Option<RoomId> {
        self.connections.get(id)?.room_id.clone()
    }

    pub fn entry(&self, id: &ConnectionId) -> Option<&ConnectionEntry> {
        self.connections.get(id)
    }

    /// 接続は残したまま、ルームとの紐付けだけを外す
    ///
    /// ルームが終了状態になったときに、まだ接続中のメンバーに対して使います。
    pub fn release(&mut self, id: &ConnectionId, room_id: &RoomId) {
        if let Some(entry) = self.connections.get_mut(id)
            && entry.room_id.as_ref() == Some(room_id)
        {
            entry.room_id = None;
            entry.role = None;
        }
    }

    /// 接続を削除し、通知が必要なルームの ID を返す
    pub fn detach(&mut self, id: &ConnectionId) -> Option<RoomId> {
        self.connections.remove(id)?.room_id
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}
