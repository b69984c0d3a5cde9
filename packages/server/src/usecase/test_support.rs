//! UseCase のテスト用ヘルパー
//!
//! 本物の InMemoryRoomRepository と WebSocketMessagePusher を組み立て、
//! クライアントに届いたメッセージを `mpsc` の受信側から観測します。

use std::{sync::Arc, time::Duration};

use tokio::sync::mpsc;

use crate::{
    domain::{ConnectionId, RoomId, RoomRepository, SharedRoom},
    infrastructure::{
        dto::websocket::ServerMessage, message_pusher::WebSocketMessagePusher,
        repository::InMemoryRoomRepository,
    },
};

use super::{
    ConnectParticipantUseCase, DisconnectParticipantUseCase, ReportErrorUseCase, RoundController,
    SetupRoomUseCase, StartTestingUseCase, SubmitInputUseCase, SubmitOutputUseCase,
};

pub struct Harness {
    pub repository: Arc<InMemoryRoomRepository>,
    pub pusher: Arc<WebSocketMessagePusher>,
    pub controller: Arc<RoundController>,
    pub connect: ConnectParticipantUseCase,
    pub disconnect: DisconnectParticipantUseCase,
    pub setup: SetupRoomUseCase,
    pub start_testing: StartTestingUseCase,
    pub submit_input: SubmitInputUseCase,
    pub submit_output: SubmitOutputUseCase,
    pub report_error: ReportErrorUseCase,
}

impl Harness {
    pub fn new(round_timeout: Option<Duration>) -> Self {
        let repository = Arc::new(InMemoryRoomRepository::new());
        let pusher = Arc::new(WebSocketMessagePusher::new());
        let controller = Arc::new(RoundController::new(
            repository.clone(),
            pusher.clone(),
            round_timeout,
        ));

        Self {
            connect: ConnectParticipantUseCase::new(repository.clone(), pusher.clone()),
            disconnect: DisconnectParticipantUseCase::new(
                repository.clone(),
                pusher.clone(),
                controller.clone(),
            ),
            setup: SetupRoomUseCase::new(repository.clone(), pusher.clone(), controller.clone()),
            start_testing: StartTestingUseCase::new(controller.clone()),
            submit_input: SubmitInputUseCase::new(controller.clone()),
            submit_output: SubmitOutputUseCase::new(controller.clone()),
            report_error: ReportErrorUseCase::new(repository.clone(), controller.clone()),
            repository,
            pusher,
            controller,
        }
    }

    pub async fn connect(&self) -> (ConnectionId, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.connect.execute(tx).await;
        (id, rx)
    }

    /// 接続してルームに参加する（マッチ回数はデフォルト）
    pub async fn join(
        &self,
        room_id: &str,
        has_script: bool,
    ) -> (ConnectionId, mpsc::UnboundedReceiver<String>) {
        let (id, rx) = self.connect().await;
        self.setup
            .execute(id, room_id.to_string(), has_script, None)
            .await
            .unwrap();
        (id, rx)
    }

    pub async fn start(&self, room_id: &str, host: &ConnectionId) {
        self.start_testing.execute(host, room_id).await.unwrap();
    }

    pub async fn submit_input(&self, room_id: &str, host: &ConnectionId, input: &str) {
        self.submit_input
            .execute(host, room_id, input.to_string())
            .await
            .unwrap();
    }

    pub async fn submit_output(&self, room_id: &str, member: &ConnectionId, output: &str) {
        self.submit_output
            .execute(member, room_id, output.to_string())
            .await
            .unwrap();
    }

    pub async fn find_room(&self, room_id: &str) -> Option<SharedRoom> {
        let room_id = RoomId::new(room_id.to_string()).unwrap();
        self.repository.find_room(&room_id).await
    }

    pub async fn room_of(&self, id: &ConnectionId) -> Option<RoomId> {
        self.repository.room_of(id).await
    }

    pub async fn count_connections(&self) -> usize {
        self.repository.count_connections().await
    }

    /// 既に届いているメッセージを全て取り出す
    pub fn drain(&self, rx: &mut mpsc::UnboundedReceiver<String>) -> Vec<ServerMessage> {
        let mut messages = Vec::new();
        while let Ok(text) = rx.try_recv() {
            messages.push(serde_json::from_str(&text).unwrap());
        }
        messages
    }
}

/// 次のメッセージを待って返す（1 秒でタイムアウト）
pub async fn recv_message(rx: &mut mpsc::UnboundedReceiver<String>) -> ServerMessage {
    let text = tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("timed out waiting for a message")
        .expect("channel closed");
    serde_json::from_str(&text).unwrap()
}
