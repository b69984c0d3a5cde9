//! UseCase: ルーム情報の取得（HTTP API 用）

use std::sync::Arc;

use crate::domain::{Room, RoomId, RoomRepository};

use super::error::GetRoomDetailError;

/// ルーム一覧取得のユースケース
pub struct GetRoomsUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn RoomRepository>,
}

impl GetRoomsUseCase {
    /// 新しい GetRoomsUseCase を作成
    pub fn new(repository: Arc<dyn RoomRepository>) -> Self {
        Self { repository }
    }

    /// 稼働中の全ルームのスナップショットを取得
    pub async fn execute(&self) -> Vec<Room> {
        let mut rooms = self.repository.list_rooms().await;
        rooms.retain(|room| !room.is_terminal());
        rooms
    }
}

/// ルーム詳細取得のユースケース
pub struct GetRoomDetailUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn RoomRepository>,
}

impl GetRoomDetailUseCase {
    /// 新しい GetRoomDetailUseCase を作成
    pub fn new(repository: Arc<dyn RoomRepository>) -> Self {
        Self { repository }
    }

    /// 指定したルームのスナップショットを取得
    ///
    /// 終了処理中のルームは既に破棄されたものとして扱います。
    pub async fn execute(&self, room_id: String) -> Result<Room, GetRoomDetailError> {
        let not_found = || GetRoomDetailError::RoomNotFound(room_id.clone());
        let id = RoomId::new(room_id.clone()).map_err(|_| not_found())?;
        let handle = self.repository.find_room(&id).await.ok_or_else(not_found)?;
        let room = handle.lock().await;
        if room.is_terminal() {
            return Err(not_found());
        }
        Ok(room.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecase::test_support::Harness;

    #[tokio::test]
    async fn test_get_rooms_lists_live_rooms() {
        // テスト項目: 稼働中のルームが一覧に含まれる
        // given (前提条件):
        let harness = Harness::new(None);
        let (_a, _a_rx) = harness.join("alpha", true).await;
        let (_b, _b_rx) = harness.join("beta", false).await;
        let usecase = GetRoomsUseCase::new(harness.repository.clone());

        // when (操作):
        let rooms = usecase.execute().await;

        // then (期待する結果):
        let mut ids: Vec<&str> = rooms.iter().map(|room| room.id.as_str()).collect();
        ids.sort();
        assert_eq!(ids, vec!["alpha", "beta"]);
    }

    #[tokio::test]
    async fn test_get_room_detail() {
        // テスト項目: 存在するルームの詳細が取得でき、存在しないルームは RoomNotFound になる
        // given (前提条件):
        let harness = Harness::new(None);
        let (host, _host_rx) = harness.join("r1", true).await;
        let usecase = GetRoomDetailUseCase::new(harness.repository.clone());

        // when (操作):
        let found = usecase.execute("r1".to_string()).await;
        let missing = usecase.execute("r2".to_string()).await;
        let invalid = usecase.execute(String::new()).await;

        // then (期待する結果):
        assert_eq!(found.unwrap().host, Some(host));
        assert_eq!(
            missing,
            Err(GetRoomDetailError::RoomNotFound("r2".to_string()))
        );
        assert_eq!(invalid, Err(GetRoomDetailError::RoomNotFound(String::new())));
    }
}
