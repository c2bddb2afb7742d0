use serde::{Deserialize, Serialize};

use crate::sync::PlayerDiff;
use crate::world::{PlayerState, WorldState};

/// Messages from client to server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ClientMessage {
    /// Locally-authored fields that changed since the last send
    Input(PlayerDiff),
}

/// Messages from server to client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ServerMessage {
    /// Full world snapshot (players, items, leaderboard)
    World(WorldState),
    /// Authoritative state of this client's own player
    Player(PlayerState),
    /// This client's player was knocked out
    Eliminated,
}

/// Encode a message using bincode
/// Uses legacy config for fixed-size integers, matching the server's framing
pub fn encode<T: Serialize>(message: &T) -> Result<Vec<u8>, EncodeError> {
    bincode::serde::encode_to_vec(message, bincode::config::legacy())
        .map_err(|e| EncodeError(e.to_string()))
}

/// Decode a message using bincode
pub fn decode<T: for<'de> Deserialize<'de>>(data: &[u8]) -> Result<T, DecodeError> {
    bincode::serde::decode_from_slice(data, bincode::config::legacy())
        .map(|(msg, _)| msg)
        .map_err(|e| DecodeError(e.to_string()))
}

#[derive(Debug, thiserror::Error)]
#[error("Encode error: {0}")]
pub struct EncodeError(String);

#[derive(Debug, thiserror::Error)]
#[error("Decode error: {0}")]
pub struct DecodeError(String);
