//! WebSocket connection handlers.

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;

use crate::{
    domain::ConnectionId,
    infrastructure::dto::websocket::ClientMessage,
    ui::state::AppState,
};

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Spawns a task that receives messages from the rx channel and pushes them to the WebSocket sender.
///
/// This function handles the outbound message flow: notifications produced by the use cases
/// (via rx channel) are sent to this client's WebSocket connection.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    })
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (sender, mut receiver) = socket.split();

    // Create a channel for this client to receive messages
    let (tx, rx) = mpsc::unbounded_channel();
    let connection_id = state.connect_participant_usecase.execute(tx).await;

    let state_clone = state.clone();

    // Spawn a task to receive events from this client
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::warn!("WebSocket error on '{}': {}", connection_id, e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(event) => dispatch(&state_clone, &connection_id, event).await,
                    Err(e) => {
                        tracing::warn!("Dropping unparsable frame from '{}': {}", connection_id, e);
                    }
                },
                Message::Binary(data) => {
                    tracing::warn!(
                        "Dropping binary frame ({} bytes) from '{}'",
                        data.len(),
                        connection_id
                    );
                }
                Message::Close(_) => {
                    tracing::info!("Client '{}' requested close", connection_id);
                    break;
                }
                // Ping/pong is handled automatically by the WebSocket protocol
                Message::Ping(_) | Message::Pong(_) => {}
            }
        }
    });

    // Spawn a task to push notifications to this client
    let mut send_task = pusher_loop(rx, sender);

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    state
        .disconnect_participant_usecase
        .execute(&connection_id)
        .await;
}

/// Route one inbound event to its use case.
///
/// Rejected events are logged and otherwise ignored; they never close the connection.
async fn dispatch(state: &AppState, connection_id: &ConnectionId, event: ClientMessage) {
    let result = match event {
        ClientMessage::SetupRoom {
            room_id,
            has_script,
            count,
        } => state
            .setup_room_usecase
            .execute(*connection_id, room_id, has_script, count)
            .await
            .map(|_| ())
            .map_err(|e| e.to_string()),
        ClientMessage::StartTesting { room_id } => state
            .start_testing_usecase
            .execute(connection_id, &room_id)
            .await
            .map_err(|e| e.to_string()),
        ClientMessage::SubmitInput { room_id, input } => state
            .submit_input_usecase
            .execute(connection_id, &room_id, input)
            .await
            .map_err(|e| e.to_string()),
        ClientMessage::SubmitOutput { room_id, output } => state
            .submit_output_usecase
            .execute(connection_id, &room_id, output)
            .await
            .map_err(|e| e.to_string()),
        ClientMessage::ErrorOccurred { message } => state
            .report_error_usecase
            .execute(connection_id, message)
            .await
            .map_err(|e| e.to_string()),
    };

    if let Err(reason) = result {
        tracing::warn!("Ignoring event from '{}': {}", connection_id, reason);
    }
}
