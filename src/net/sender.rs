//! Outbound side of the connection
//!
//! The simulation loop hands each non-empty diff to a [`NetworkSender`] and
//! forgets about it. The channel-backed sender encodes the message and queues
//! it for whatever task owns the socket.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use tracing::warn;

use crate::net::protocol::{encode, ClientMessage};
use crate::sync::PlayerDiff;

/// Opaque identifier of the server connection a message is bound for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionHandle(u64);

impl ConnectionHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Fire-and-forget network send
pub trait NetworkSender {
    fn send_data(&mut self, connection: ConnectionHandle, diff: &PlayerDiff);
}

/// Encoded message waiting for the socket task
#[derive(Debug, Clone)]
pub struct OutboundMessage {
    pub connection: ConnectionHandle,
    pub payload: Vec<u8>,
}

/// Outbound send errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SendError {
    #[error("Outbound queue full")]
    Full,
    #[error("Socket task gone")]
    Disconnected,
    #[error("{0}")]
    Encode(String),
}

/// Sender that queues bincode-encoded [`ClientMessage::Input`]s on a bounded channel
pub struct ChannelSender {
    sender: Sender<OutboundMessage>,
    sent: u64,
    dropped: u64,
}

impl ChannelSender {
    /// Create a sender and the receiving end for the socket task
    pub fn new(capacity: usize) -> (Self, Receiver<OutboundMessage>) {
        let (sender, receiver) = bounded(capacity);
        (
            Self {
                sender,
                sent: 0,
                dropped: 0,
            },
            receiver,
        )
    }

    /// Encode and queue without blocking
    pub fn try_send(&mut self, connection: ConnectionHandle, diff: &PlayerDiff) -> Result<(), SendError> {
        let payload = encode(&ClientMessage::Input(*diff)).map_err(|e| SendError::Encode(e.to_string()))?;
        self.sender
            .try_send(OutboundMessage { connection, payload })
            .map_err(|e| match e {
                TrySendError::Full(_) => SendError::Full,
                TrySendError::Disconnected(_) => SendError::Disconnected,
            })?;
        self.sent += 1;
        Ok(())
    }

    #[inline]
    pub fn sent_count(&self) -> u64 {
        self.sent
    }

    #[inline]
    pub fn dropped_count(&self) -> u64 {
        self.dropped
    }
}

impl NetworkSender for ChannelSender {
    fn send_data(&mut self, connection: ConnectionHandle, diff: &PlayerDiff) {
        if let Err(e) = self.try_send(connection, diff) {
            self.dropped += 1;
            warn!("Dropped input for connection {}: {}", connection.id(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::protocol::decode;

    fn aim(degrees: f32) -> PlayerDiff {
        PlayerDiff {
            mouse_angle_degrees: Some(degrees),
        }
    }

    #[test]
    fn test_send_encodes_input() {
        let (mut sender, receiver) = ChannelSender::new(4);
        sender.send_data(ConnectionHandle::new(9), &aim(22.5));

        let msg = receiver.try_recv().unwrap();
        assert_eq!(msg.connection, ConnectionHandle::new(9));
        match decode::<ClientMessage>(&msg.payload).unwrap() {
            ClientMessage::Input(diff) => assert_eq!(diff.mouse_angle_degrees, Some(22.5)),
        }
        assert_eq!(sender.sent_count(), 1);
    }

    #[test]
    fn test_full_queue_drops() {
        let (mut sender, _receiver) = ChannelSender::new(1);
        let conn = ConnectionHandle::new(1);
        assert!(sender.try_send(conn, &aim(1.0)).is_ok());
        assert_eq!(sender.try_send(conn, &aim(2.0)), Err(SendError::Full));

        sender.send_data(conn, &aim(3.0));
        assert_eq!(sender.dropped_count(), 1);
        assert_eq!(sender.sent_count(), 1);
    }

    #[test]
    fn test_disconnected_receiver() {
        let (mut sender, receiver) = ChannelSender::new(1);
        drop(receiver);
        assert_eq!(
            sender.try_send(ConnectionHandle::new(1), &aim(1.0)),
            Err(SendError::Disconnected)
        );
    }
}
