//! WebSocket client that drives the session from network frames.
//!
//! The network host runs the server. We connect, request the node name
//! tables, then answer every `update` frame with one tick's sensor batch.
//! Dropped connections are retried forever with exponential backoff.

use std::time::Duration;

use anyhow::{Result, anyhow};
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use nervesim_core::{ArenaBounds, CallbackIds, Envelope, Inbound, handle_inbound};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tracing::{debug, info, warn};

use crate::{Backoff, SharedSession};

/// Connection settings for [`run_client`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub url: String,
    pub bounds: ArenaBounds,
    pub reconnect: Duration,
    pub max_reconnect: Duration,
}

/// Decodes one text frame and runs it against the session.
///
/// The lock is released before returning, so the caller can send the
/// serialized reply without holding it.
pub fn process_frame(
    session: &SharedSession,
    text: &str,
    bounds: &ArenaBounds,
) -> Result<Option<String>> {
    let inbound = Inbound::parse(text)?;
    let reply = {
        let mut guard = session
            .lock()
            .map_err(|_| anyhow!("session lock poisoned"))?;
        handle_inbound(&mut guard, inbound, bounds)
    };
    Ok(reply.map(|envelope| envelope.to_json()).transpose()?)
}

/// Serves one established connection until the peer closes it.
pub async fn run_connection<S>(
    session: &SharedSession,
    mut socket: S,
    bounds: &ArenaBounds,
) -> Result<()>
where
    S: Stream<Item = Result<Message, WsError>> + Sink<Message, Error = WsError> + Unpin,
{
    let mut callbacks = CallbackIds::default();
    let init = Envelope::init().with_callback(callbacks.next_id()).to_json()?;
    socket.send(Message::text(init)).await?;

    while let Some(message) = socket.next().await {
        match message? {
            Message::Text(text) => match process_frame(session, text.as_str(), bounds) {
                Ok(Some(reply)) => socket.send(Message::text(reply)).await?,
                Ok(None) => {}
                Err(err) => warn!(error = %err, "dropping frame"),
            },
            Message::Close(frame) => {
                info!(?frame, "peer closed connection");
                break;
            }
            Message::Binary(bytes) => debug!(len = bytes.len(), "ignoring binary frame"),
            _ => {}
        }
    }
    Ok(())
}

/// Connects to `config.url` and keeps reconnecting after every disconnect.
pub async fn run_client(session: SharedSession, config: ClientConfig) -> Result<()> {
    let mut backoff = Backoff::new(config.reconnect, config.max_reconnect);
    loop {
        match connect_async(config.url.as_str()).await {
            Ok((socket, _)) => {
                info!(url = %config.url, "connected");
                backoff.reset();
                match run_connection(&session, socket, &config.bounds).await {
                    Ok(()) => info!("disconnected"),
                    Err(err) => warn!(error = %err, "connection dropped"),
                }
            }
            Err(err) => warn!(url = %config.url, error = %err, "connect failed"),
        }
        let delay = backoff.next_delay();
        info!(?delay, "reconnecting");
        tokio::time::sleep(delay).await;
    }
}
