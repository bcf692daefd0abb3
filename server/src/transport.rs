//! Outbound delivery seam between a room and its connections
//!
//! A room never touches sockets directly. Each participant is paired with a
//! [`Transport`] that accepts serialized text frames; the WebSocket adapter
//! backs it with a channel drained by a per-connection writer task, and
//! tests back it with an in-memory recorder.

use log::debug;
use tokio::sync::mpsc;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("connection {0} is closed")]
    Closed(u32),

    #[error("failed to serialize outbound message: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Frames queued for a connection's writer task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Text(String),
    Close,
}

pub trait Transport: Send + Sync {
    /// Identifies the underlying connection. Participants sharing a socket
    /// report the same id and receive one copy of each broadcast.
    fn connection_id(&self) -> u32;

    fn send(&self, payload: &str) -> Result<(), TransportError>;

    /// Asks the connection to shut down. Best-effort; never fails.
    fn close(&self);
}

/// Transport backed by the queue of a connection writer task.
#[derive(Debug, Clone)]
pub struct ChannelTransport {
    connection_id: u32,
    sender: mpsc::UnboundedSender<Outbound>,
}

impl ChannelTransport {
    pub fn new(connection_id: u32, sender: mpsc::UnboundedSender<Outbound>) -> Self {
        Self {
            connection_id,
            sender,
        }
    }

    /// Creates a transport together with the receiving end its writer drains.
    pub fn pair(connection_id: u32) -> (Self, mpsc::UnboundedReceiver<Outbound>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self::new(connection_id, sender), receiver)
    }
}

impl Transport for ChannelTransport {
    fn connection_id(&self) -> u32 {
        self.connection_id
    }

    fn send(&self, payload: &str) -> Result<(), TransportError> {
        self.sender
            .send(Outbound::Text(payload.to_string()))
            .map_err(|_| TransportError::Closed(self.connection_id))
    }

    fn close(&self) {
        if self.sender.send(Outbound::Close).is_err() {
            debug!("Connection {} already closed", self.connection_id);
        }
    }
}
