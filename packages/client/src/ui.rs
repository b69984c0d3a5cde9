//! UI utilities for the client.

use rustyline::{DefaultEditor, error::ReadlineError};
use tokio::sync::oneshot;

/// Result of the host's start prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartPrompt {
    /// ENTER was pressed
    Start,
    /// Ctrl+C / Ctrl+D or a terminal error
    Cancelled,
}

/// Wait for the host to press ENTER on a dedicated thread.
///
/// rustyline reads synchronously, so the prompt runs outside the async runtime
/// and reports back through a oneshot channel.
pub fn spawn_start_prompt() -> oneshot::Receiver<StartPrompt> {
    let (tx, rx) = oneshot::channel();

    std::thread::spawn(move || {
        let result = match DefaultEditor::new() {
            Ok(mut rl) => match rl.readline("") {
                Ok(_) => StartPrompt::Start,
                Err(ReadlineError::Interrupted) => {
                    tracing::info!("Interrupted");
                    StartPrompt::Cancelled
                }
                Err(ReadlineError::Eof) => {
                    tracing::info!("EOF");
                    StartPrompt::Cancelled
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    StartPrompt::Cancelled
                }
            },
            Err(e) => {
                tracing::error!("Failed to initialize readline: {}", e);
                StartPrompt::Cancelled
            }
        };

        // The session may already be over
        tx.send(result).ok();
    });

    rx
}
