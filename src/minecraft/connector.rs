//! Chat relay TCP connection.
//!
//! The relay is a headless Minecraft client that exposes the game chat
//! as newline-delimited JSON frames tagged by `type`.

use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_util::codec::{Framed, LinesCodec};
use tracing::{debug, error, info, warn};

use crate::bridge::channels::ConnectorChannels;
use crate::common::error::{ConnectionError, ConnectionResult};
use crate::common::reconnect::{next_delay, reconnect_backoff};
use crate::common::GameEvent;
use crate::config::types::RelayConfig;

/// Longest frame accepted from the relay.
const MAX_FRAME_LENGTH: usize = 64 * 1024;

/// One line of the relay protocol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RelayFrame {
    /// A chat line (inbound) or a line to type (outbound).
    Chat { message: String },
    /// The relay joined the server under this name.
    Login { username: String },
    /// The relay was kicked.
    Kicked { reason: String },
}

/// A framed relay connection.
pub type RelayConnection<S> = Framed<S, LinesCodec>;

/// Create a new relay connection from a stream.
pub fn new_relay_connection<S: AsyncRead + AsyncWrite>(stream: S) -> RelayConnection<S> {
    Framed::new(stream, LinesCodec::new_with_max_length(MAX_FRAME_LENGTH))
}

/// How a session ended without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The relay closed the socket.
    Closed,
    /// Shutdown was requested.
    Shutdown,
}

pub struct MinecraftConnector {
    relay: RelayConfig,
    pub channels: ConnectorChannels,
}

impl MinecraftConnector {
    pub fn new(relay: RelayConfig, channels: ConnectorChannels) -> Self {
        Self { relay, channels }
    }

    fn shutdown_requested(&self) -> bool {
        *self.channels.shutdown_rx.borrow()
    }

    /// Connect, run sessions and reconnect until shutdown.
    pub async fn run(mut self) {
        let mut backoff = reconnect_backoff();

        loop {
            if self.shutdown_requested() {
                info!("Shutdown signal detected, stopping reconnection loop");
                break;
            }

            info!("Connecting to chat relay at {}:{}...", self.relay.host, self.relay.port);
            match self.connect().await {
                Ok(stream) => {
                    backoff = reconnect_backoff();
                    match self.handle_connection(stream).await {
                        Ok(SessionEnd::Shutdown) => break,
                        Ok(SessionEnd::Closed) => info!("Chat relay disconnected"),
                        Err(e) => error!("Chat relay error: {}", e),
                    }
                }
                Err(e) => error!("{}", e),
            }

            if let Err(e) = self.channels.game_events_tx.send(GameEvent::Disconnected) {
                debug!("Game event channel closed: {}", e);
            }

            let delay = next_delay(&mut backoff);
            info!("Reconnecting in {:.1} seconds...", delay.as_secs_f64());
            if self.wait_for_retry(delay).await {
                info!("Shutdown signal received during backoff");
                break;
            }
        }
    }

    /// Sleep for `delay`, discarding chat queued while offline.
    /// Returns true if shutdown was requested meanwhile.
    async fn wait_for_retry(&mut self, delay: std::time::Duration) -> bool {
        let sleep = tokio::time::sleep(delay);
        tokio::pin!(sleep);

        loop {
            tokio::select! {
                _ = &mut sleep => return false,
                changed = self.channels.shutdown_rx.changed() => {
                    if changed.is_err() || *self.channels.shutdown_rx.borrow() {
                        return true;
                    }
                }
                message = self.channels.outgoing_rx.recv() => match message {
                    Some(message) => debug!("Dropping message while offline: {}", message.content),
                    // No senders left: nothing to discard, just wait out the delay
                    None => {
                        (&mut sleep).await;
                        return false;
                    }
                },
            }
        }
    }

    async fn connect(&self) -> ConnectionResult<TcpStream> {
        TcpStream::connect((self.relay.host.as_str(), self.relay.port))
            .await
            .map_err(|source| ConnectionError::ConnectFailed {
                host: self.relay.host.clone(),
                port: self.relay.port,
                source,
            })
    }

    /// Pump frames between the relay and the bridge channels.
    pub async fn handle_connection<S>(&mut self, stream: S) -> ConnectionResult<SessionEnd>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let mut connection = new_relay_connection(stream);
        info!("Chat relay connection established");

        loop {
            tokio::select! {
                line = connection.next() => {
                    match line {
                        Some(Ok(line)) => self.handle_line(&line)?,
                        Some(Err(e)) => return Err(e.into()),
                        None => return Ok(SessionEnd::Closed),
                    }
                }

                message = self.channels.outgoing_rx.recv() => {
                    let Some(message) = message else {
                        warn!("Outgoing message channel closed");
                        return Ok(SessionEnd::Shutdown);
                    };
                    let frame = RelayFrame::Chat { message: message.content };
                    connection.send(serde_json::to_string(&frame)?).await?;
                }

                changed = self.channels.shutdown_rx.changed() => {
                    if changed.is_err() || *self.channels.shutdown_rx.borrow() {
                        info!("Shutdown signal received, closing chat relay connection");
                        return Ok(SessionEnd::Shutdown);
                    }
                }
            }
        }
    }

    fn handle_line(&self, line: &str) -> ConnectionResult<()> {
        if line.trim().is_empty() {
            return Ok(());
        }

        let frame = match serde_json::from_str::<RelayFrame>(line) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Skipping malformed relay frame: {}", e);
                return Ok(());
            }
        };

        let event = match frame {
            RelayFrame::Chat { message } => GameEvent::Chat { message },
            RelayFrame::Login { username } => {
                info!("Chat relay logged in as {}", username);
                GameEvent::LoggedIn { username }
            }
            RelayFrame::Kicked { reason } => {
                let kicked = GameEvent::Kicked {
                    reason: reason.clone(),
                };
                if let Err(e) = self.channels.game_events_tx.send(kicked) {
                    debug!("Game event channel closed: {}", e);
                }
                return Err(ConnectionError::Kicked { reason });
            }
        };

        if let Err(e) = self.channels.game_events_tx.send(event) {
            debug!("Game event channel closed: {}", e);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::OutgoingGameMessage;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
    use tokio::sync::{mpsc, watch};

    struct Harness {
        connector: MinecraftConnector,
        events_rx: mpsc::UnboundedReceiver<GameEvent>,
        outgoing_tx: mpsc::UnboundedSender<OutgoingGameMessage>,
        shutdown_tx: watch::Sender<bool>,
    }

    fn harness() -> Harness {
        let (game_events_tx, events_rx) = mpsc::unbounded_channel();
        let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Harness {
            connector: MinecraftConnector::new(
                RelayConfig::default(),
                ConnectorChannels {
                    game_events_tx,
                    outgoing_rx,
                    shutdown_rx,
                },
            ),
            events_rx,
            outgoing_tx,
            shutdown_tx,
        }
    }

    #[test]
    fn test_frame_format() {
        let frame: RelayFrame =
            serde_json::from_str(r#"{"type":"chat","message":"§2Guild > hi"}"#).unwrap();
        assert_eq!(frame, RelayFrame::Chat { message: "§2Guild > hi".to_string() });

        let outbound = serde_json::to_string(&RelayFrame::Chat {
            message: "/gc hello".to_string(),
        })
        .unwrap();
        assert_eq!(outbound, r#"{"type":"chat","message":"/gc hello"}"#);
    }

    #[tokio::test]
    async fn test_inbound_frames_become_events() {
        let mut h = harness();
        let (client, mut relay) = tokio::io::duplex(4096);

        relay
            .write_all(
                concat!(
                    r#"{"type":"login","username":"Bot"}"#,
                    "\nnot json\n",
                    r#"{"type":"chat","message":"Guild > hi"}"#,
                    "\n",
                )
                .as_bytes(),
            )
            .await
            .unwrap();
        drop(relay);

        let end = h.connector.handle_connection(client).await.unwrap();
        assert_eq!(end, SessionEnd::Closed);

        assert_eq!(
            h.events_rx.recv().await.unwrap(),
            GameEvent::LoggedIn { username: "Bot".to_string() }
        );
        assert_eq!(
            h.events_rx.recv().await.unwrap(),
            GameEvent::Chat { message: "Guild > hi".to_string() }
        );
    }

    #[tokio::test]
    async fn test_outgoing_messages_are_written() {
        let mut h = harness();
        let (client, relay) = tokio::io::duplex(4096);

        h.outgoing_tx
            .send(OutgoingGameMessage { content: "/gc Alex: hi".to_string() })
            .unwrap();

        // The relay half must outlive the read, or the session sees EOF
        let reader = tokio::spawn(async move {
            let mut lines = BufReader::new(relay).lines();
            let line = lines.next_line().await.unwrap();
            (lines, line)
        });

        let shutdown_tx = h.shutdown_tx;
        let session = tokio::spawn(async move {
            let result = h.connector.handle_connection(client).await;
            (result, h.connector)
        });

        let (_relay, line) = reader.await.unwrap();
        assert_eq!(
            line.as_deref(),
            Some(r#"{"type":"chat","message":"/gc Alex: hi"}"#)
        );

        shutdown_tx.send(true).unwrap();
        let (result, _connector) = session.await.unwrap();
        assert_eq!(result.unwrap(), SessionEnd::Shutdown);
    }

    #[tokio::test]
    async fn test_kick_ends_session_with_error() {
        let mut h = harness();
        let (client, mut relay) = tokio::io::duplex(4096);

        relay
            .write_all(b"{\"type\":\"kicked\",\"reason\":\"banned\"}\n")
            .await
            .unwrap();

        let result = h.connector.handle_connection(client).await;
        assert!(matches!(result, Err(ConnectionError::Kicked { reason }) if reason == "banned"));
        assert_eq!(
            h.events_rx.recv().await.unwrap(),
            GameEvent::Kicked { reason: "banned".to_string() }
        );
    }

    #[tokio::test]
    async fn test_kick_without_listener_still_ends_session() {
        let mut h = harness();
        drop(h.events_rx);
        let (client, mut relay) = tokio::io::duplex(4096);

        relay
            .write_all(b"{\"type\":\"kicked\",\"reason\":\"restart\"}\n")
            .await
            .unwrap();

        let result = h.connector.handle_connection(client).await;
        assert!(matches!(result, Err(ConnectionError::Kicked { reason }) if reason == "restart"));
    }
}
