//! WebSocket client session management.
//!
//! 1 回の接続 = 1 つのルームへの参加です。コーディネータから届くイベントに応じて
//! ジェネレータやテスト対象プログラムを別タスクで実行し、結果を送り返します。
//! 受信ループ自体は外部プロセスの終了を待ちません。

use futures_util::{SinkExt, StreamExt, stream::SplitSink};
use tokio::{
    net::TcpStream,
    sync::{mpsc, oneshot},
    task::JoinHandle,
};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async, tungstenite::protocol::Message,
};

use crossfire_server::infrastructure::dto::websocket::{ClientMessage, ServerMessage};

use crate::{
    config::ClientConfig,
    error::{ClientError, ExecutionError},
    runtime,
};

use super::{
    domain::{GENERATION_FAILURE_MESSAGE, SessionEnd, program_failure_message},
    formatter::MessageFormatter,
    ui::{StartPrompt, spawn_start_prompt},
};

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

/// Run one session: connect, join the room and follow it until it ends.
///
/// Returns `Err(ClientError::ConnectionError)` only when the coordinator cannot
/// be reached; everything after the connection is established ends in a
/// [`SessionEnd`] or `Err(ClientError::SessionAborted)`.
pub async fn run_client_session(config: &ClientConfig) -> Result<SessionEnd, ClientError> {
    let (ws_stream, _response) = connect_async(config.server_url.as_str())
        .await
        .map_err(|e| ClientError::ConnectionError(e.to_string()))?;

    tracing::info!("Connected to coordinator at {}", config.server_url);
    print!("{}", MessageFormatter::format_connected(&config.server_url));

    let (write, mut read) = ws_stream.split();
    let (outbound, outbound_rx) = mpsc::unbounded_channel();
    let mut write_task = writer_loop(outbound_rx, write);

    let mut session = Session {
        config: config.clone(),
        outbound,
        connection_id: String::new(),
        start_prompt: None,
    };
    session.send(ClientMessage::SetupRoom {
        room_id: config.room.clone(),
        has_script: config.has_script(),
        count: Some(config.count),
    });

    let result = loop {
        tokio::select! {
            frame = read.next() => match frame {
                Some(Ok(Message::Text(text))) => match serde_json::from_str::<ServerMessage>(&text) {
                    Ok(message) => {
                        if let Some(end) = session.handle(message) {
                            break Ok(end);
                        }
                    }
                    Err(e) => tracing::warn!("Dropping unparsable frame: {}", e),
                },
                Some(Ok(Message::Binary(data))) => {
                    tracing::warn!("Dropping binary frame ({} bytes)", data.len());
                }
                Some(Ok(Message::Close(_))) | None => {
                    tracing::info!("Server closed the connection");
                    break Err(ClientError::SessionAborted("Connection lost".to_string()));
                }
                // Ping/pong is answered by tungstenite
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::warn!("WebSocket read error: {}", e);
                    break Err(ClientError::SessionAborted("Connection lost".to_string()));
                }
            },
            prompt = wait_for_prompt(&mut session.start_prompt) => {
                session.start_prompt = None;
                match prompt {
                    StartPrompt::Start => {
                        session.send(ClientMessage::StartTesting {
                            room_id: config.room.clone(),
                        });
                        print!("{}", MessageFormatter::format_test_run_started());
                    }
                    StartPrompt::Cancelled => {
                        break Err(ClientError::SessionAborted(
                            "Start prompt cancelled".to_string(),
                        ));
                    }
                }
            },
            _ = &mut write_task => {
                break Err(ClientError::SessionAborted("Connection lost".to_string()));
            },
        }
    };

    write_task.abort();
    result
}

/// Serialize outbound messages onto the WebSocket.
fn writer_loop(
    mut rx: mpsc::UnboundedReceiver<ClientMessage>,
    mut write: WsSink,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            let json = match serde_json::to_string(&message) {
                Ok(json) => json,
                Err(e) => {
                    tracing::error!("{}", ClientError::Protocol(e.to_string()));
                    continue;
                }
            };

            if let Err(e) = write.send(Message::Text(json.into())).await {
                tracing::warn!("Failed to send message: {}", e);
                break;
            }
        }
    })
}

/// Resolve once the host answers the start prompt; never resolves without one.
async fn wait_for_prompt(prompt: &mut Option<oneshot::Receiver<StartPrompt>>) -> StartPrompt {
    match prompt {
        Some(rx) => rx.await.unwrap_or(StartPrompt::Cancelled),
        None => std::future::pending().await,
    }
}

fn send(outbound: &mpsc::UnboundedSender<ClientMessage>, message: ClientMessage) {
    if outbound.send(message).is_err() {
        tracing::warn!("Dropping outbound message: session already closed");
    }
}

/// Per-connection state
struct Session {
    config: ClientConfig,
    outbound: mpsc::UnboundedSender<ClientMessage>,
    /// Assigned by the coordinator in `setup_success`
    connection_id: String,
    start_prompt: Option<oneshot::Receiver<StartPrompt>>,
}

impl Session {
    fn send(&self, message: ClientMessage) {
        send(&self.outbound, message);
    }

    /// React to one coordinator event; `Some` ends the session.
    fn handle(&mut self, message: ServerMessage) -> Option<SessionEnd> {
        match message {
            ServerMessage::SetupSuccess {
                is_host,
                connection_id,
            } => {
                tracing::info!(
                    "Joined room '{}' as {} ({})",
                    self.config.room,
                    if is_host { "host" } else { "participant" },
                    connection_id
                );
                self.connection_id = connection_id;
                print!(
                    "{}",
                    MessageFormatter::format_setup_success(&self.config.room, is_host)
                );
                if is_host && self.start_prompt.is_none() {
                    self.start_prompt = Some(spawn_start_prompt());
                }
                None
            }
            ServerMessage::UserUpdate { members } => {
                print!("{}", MessageFormatter::format_user_update(members));
                None
            }
            ServerMessage::GenerateTestCase => {
                self.spawn_generator();
                None
            }
            ServerMessage::RunProgram { input } => {
                print!("{}", MessageFormatter::format_test_case_received());
                self.spawn_program(input);
                None
            }
            ServerMessage::AllMatch { remaining } => {
                print!("{}", MessageFormatter::format_all_match(remaining));
                (remaining == 0).then_some(SessionEnd::Completed)
            }
            ServerMessage::DiffFound { input, diffs } => {
                tracing::info!("Mismatch reported ({} differing pair(s))", diffs.len());
                print!("{}", MessageFormatter::format_diff_report(&input, &diffs));
                Some(SessionEnd::MismatchFound)
            }
            ServerMessage::ErrorOccurred { message } => {
                eprint!("{}", MessageFormatter::format_error(&message));
                Some(SessionEnd::Failed(message))
            }
        }
    }

    fn spawn_generator(&self) {
        let outbound = self.outbound.clone();
        let room_id = self.config.room.clone();
        let script = self.config.script.clone();

        tokio::spawn(async move {
            let result = match script.as_deref() {
                Some(script) => runtime::generate_test_case(script).await,
                None => Err(ExecutionError::GenerationFailure(
                    "no generator script configured".to_string(),
                )),
            };

            let message = match result {
                Ok(input) => ClientMessage::SubmitInput { room_id, input },
                Err(e) => {
                    tracing::error!("{}", e);
                    eprintln!("Failed to generate test case: {}", e);
                    ClientMessage::ErrorOccurred {
                        message: GENERATION_FAILURE_MESSAGE.to_string(),
                    }
                }
            };
            send(&outbound, message);
        });
    }

    fn spawn_program(&self, input: String) {
        let outbound = self.outbound.clone();
        let room_id = self.config.room.clone();
        let program = self.config.program.clone();
        let connection_id = self.connection_id.clone();

        tokio::spawn(async move {
            let message = match runtime::run_program(&program, &input).await {
                Ok(output) => {
                    println!("Program finished. Sending output to server.");
                    ClientMessage::SubmitOutput {
                        room_id,
                        output: String::from_utf8_lossy(&output).into_owned(),
                    }
                }
                Err(e) => {
                    tracing::error!("{}", e);
                    eprintln!("Failed to run program: {}", e);
                    ClientMessage::ErrorOccurred {
                        message: program_failure_message(&connection_id),
                    }
                }
            };
            send(&outbound, message);
        });
    }
}
