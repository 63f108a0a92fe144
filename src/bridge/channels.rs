//! Bridge channel management.
//!
//! Groups the channels connecting the Minecraft connector, the
//! Minecraft event handler and the Discord side.

use tokio::sync::{mpsc, watch};

use crate::common::{GameEvent, OutgoingGameMessage};

/// Channels owned by the Minecraft relay connector.
pub struct ConnectorChannels {
    /// Sender for events read from the relay (Minecraft -> bridge).
    pub game_events_tx: mpsc::UnboundedSender<GameEvent>,
    /// Receiver for chat lines to write to the relay (Discord -> Minecraft).
    pub outgoing_rx: mpsc::UnboundedReceiver<OutgoingGameMessage>,
    /// Receiver for shutdown signal.
    pub shutdown_rx: watch::Receiver<bool>,
}

/// Channels used by the event handlers on both sides.
pub struct HandlerChannels {
    /// Receiver for relay events (Minecraft handler listens).
    pub game_events_rx: mpsc::UnboundedReceiver<GameEvent>,
    /// Sender for chat lines into the game. Cloned by the Discord side.
    pub outgoing_tx: mpsc::UnboundedSender<OutgoingGameMessage>,
    /// Receiver for shutdown signal.
    pub shutdown_rx: watch::Receiver<bool>,
}

/// Control channels for shutdown coordination.
pub struct ControlChannels {
    /// Sender to trigger shutdown.
    pub shutdown_tx: watch::Sender<bool>,
}

/// Bundle of all channels created by the bridge.
pub struct ChannelBundle {
    pub connector: ConnectorChannels,
    pub handlers: HandlerChannels,
    pub control: ControlChannels,
}

impl ChannelBundle {
    pub fn new() -> Self {
        let (game_events_tx, game_events_rx) = mpsc::unbounded_channel();
        let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Self {
            connector: ConnectorChannels {
                game_events_tx,
                outgoing_rx,
                shutdown_rx: shutdown_rx.clone(),
            },
            handlers: HandlerChannels {
                game_events_rx,
                outgoing_tx,
                shutdown_rx,
            },
            control: ControlChannels { shutdown_tx },
        }
    }
}

impl Default for ChannelBundle {
    fn default() -> Self {
        Self::new()
    }
}
