//! Client execution logic with reconnection support.

use std::time::Duration;

use crate::{config::ClientConfig, error::ClientError};

use super::{
    domain::{SessionEnd, should_attempt_reconnect},
    session::run_client_session,
};

const MAX_CONNECT_ATTEMPTS: u32 = 5;
const RECONNECT_INTERVAL_SECS: u64 = 5;

/// Run the client, retrying the initial connection
///
/// Once a room has been joined the session is never re-joined: a lost
/// connection ends the run with [`ClientError::SessionAborted`].
pub async fn run_client(config: ClientConfig) -> Result<SessionEnd, ClientError> {
    let mut attempt = 0;

    loop {
        tracing::info!(
            "Attempting to connect to {} for room '{}' (attempt {}/{})",
            config.server_url,
            config.room,
            attempt + 1,
            MAX_CONNECT_ATTEMPTS
        );

        match run_client_session(&config).await {
            Ok(end) => {
                tracing::info!("Client session ended: {:?}", end);
                return Ok(end);
            }
            Err(e) => {
                attempt += 1;

                if !should_attempt_reconnect(&e, attempt, MAX_CONNECT_ATTEMPTS) {
                    if matches!(e, ClientError::ConnectionError(_)) {
                        tracing::error!(
                            "Failed to connect after {} attempts. Exiting.",
                            attempt
                        );
                    }
                    return Err(e);
                }

                tracing::warn!("{}", e);
                tracing::info!(
                    "Reconnecting in {} seconds... (attempt {}/{})",
                    RECONNECT_INTERVAL_SECS,
                    attempt + 1,
                    MAX_CONNECT_ATTEMPTS
                );

                tokio::time::sleep(Duration::from_secs(RECONNECT_INTERVAL_SECS)).await;
            }
        }
    }
}
