//! Server execution logic.

use std::sync::Arc;

use axum::{Router, routing::get};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::{
    config::ServerConfig,
    domain::{MessagePusher, RoomRepository},
    infrastructure::{message_pusher::WebSocketMessagePusher, repository::InMemoryRoomRepository},
    usecase::{
        ConnectParticipantUseCase, DisconnectParticipantUseCase, GetRoomDetailUseCase,
        GetRoomsUseCase, ReportErrorUseCase, RoundController, SetupRoomUseCase,
        StartTestingUseCase, SubmitInputUseCase, SubmitOutputUseCase,
    },
};

use super::{
    handler::{get_room_detail, get_rooms, health_check, websocket_handler},
    signal::shutdown_signal,
    state::AppState,
};

/// Session coordinator server
///
/// # Example
///
/// ```ignore
/// let server = Server::new(ServerConfig::default());
/// server.run().await?;
/// ```
pub struct Server {
    config: ServerConfig,
    state: Arc<AppState>,
}

impl Server {
    /// Wire the repository, the pusher and the use cases together.
    ///
    /// Dependencies are created in order:
    /// 1. Repository
    /// 2. MessagePusher
    /// 3. RoundController
    /// 4. UseCases
    pub fn new(config: ServerConfig) -> Self {
        // 1. Create Repository (in-memory database)
        let repository: Arc<dyn RoomRepository> = Arc::new(InMemoryRoomRepository::new());

        // 2. Create MessagePusher (WebSocket implementation)
        let message_pusher: Arc<dyn MessagePusher> = Arc::new(WebSocketMessagePusher::new());

        // 3. Create RoundController
        let round_controller = Arc::new(RoundController::new(
            repository.clone(),
            message_pusher.clone(),
            config.round_timeout,
        ));

        // 4. Create UseCases
        let state = Arc::new(AppState {
            connect_participant_usecase: Arc::new(ConnectParticipantUseCase::new(
                repository.clone(),
                message_pusher.clone(),
            )),
            disconnect_participant_usecase: Arc::new(DisconnectParticipantUseCase::new(
                repository.clone(),
                message_pusher.clone(),
                round_controller.clone(),
            )),
            setup_room_usecase: Arc::new(SetupRoomUseCase::new(
                repository.clone(),
                message_pusher.clone(),
                round_controller.clone(),
            )),
            start_testing_usecase: Arc::new(StartTestingUseCase::new(round_controller.clone())),
            submit_input_usecase: Arc::new(SubmitInputUseCase::new(round_controller.clone())),
            submit_output_usecase: Arc::new(SubmitOutputUseCase::new(round_controller.clone())),
            report_error_usecase: Arc::new(ReportErrorUseCase::new(
                repository.clone(),
                round_controller,
            )),
            get_rooms_usecase: Arc::new(GetRoomsUseCase::new(repository.clone())),
            get_room_detail_usecase: Arc::new(GetRoomDetailUseCase::new(repository)),
        });

        Self { config, state }
    }

    /// Build the router serving `/ws` and the read-only HTTP API.
    pub fn router(&self) -> Router {
        Router::new()
            // WebSocket エンドポイント
            .route("/ws", get(websocket_handler))
            // HTTP エンドポイント
            .route("/api/health", get(health_check))
            .route("/api/rooms", get(get_rooms))
            .route("/api/rooms/{room_id}", get(get_room_detail))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Run the coordinator until a shutdown signal arrives
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the configured address or
    /// if there's an error during server execution.
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        let bind_addr = self.config.bind_addr();
        let listener = TcpListener::bind(&bind_addr).await?;

        tracing::info!(
            "Crossfire coordinator listening on {}",
            listener.local_addr()?
        );
        tracing::info!("Connect to: ws://{}/ws", bind_addr);
        match self.config.round_timeout {
            Some(timeout) => tracing::info!("Round timeout: {:?}", timeout),
            None => tracing::info!("Round timeout: disabled"),
        }
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");

        Ok(())
    }
}
