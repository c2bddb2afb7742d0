//! Latest server state, replaced wholesale on every update
//!
//! Readers take an `Arc` and keep it for the rest of their cycle. A new
//! update swaps the `Arc` in the store; it never mutates the old one, so a
//! frame that captured a snapshot sees a consistent world until it finishes.

use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info};

use crate::net::protocol::{decode, DecodeError, ServerMessage};
use crate::world::{PlayerId, PlayerState, WorldState};

/// Read side of the world snapshot used by both clocks.
///
/// `None` means not connected yet; callers treat that as a no-op cycle.
pub trait WorldSnapshotProvider {
    fn player_state(&self) -> Option<Arc<PlayerState>>;
    fn state(&self) -> Option<Arc<WorldState>>;
}

impl<T: WorldSnapshotProvider + ?Sized> WorldSnapshotProvider for Arc<T> {
    fn player_state(&self) -> Option<Arc<PlayerState>> {
        (**self).player_state()
    }

    fn state(&self) -> Option<Arc<WorldState>> {
        (**self).state()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid world fixture: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Shared holder of the latest world and local-player snapshots
#[derive(Debug, Default)]
pub struct SnapshotStore {
    world: RwLock<Option<Arc<WorldState>>>,
    player: RwLock<Option<Arc<PlayerState>>>,
    local_id: RwLock<Option<PlayerId>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id of this client's player, once the server has told us
    pub fn local_id(&self) -> Option<PlayerId> {
        *self.local_id.read()
    }

    pub fn replace_world(&self, world: WorldState) {
        let local = self
            .local_id()
            .and_then(|id| world.players.get(&id).cloned());
        debug!(
            players = world.players.len(),
            items = world.items.len(),
            "world snapshot replaced"
        );
        *self.world.write() = Some(Arc::new(world));
        if let Some(player) = local {
            *self.player.write() = Some(Arc::new(player));
        }
    }

    pub fn replace_player(&self, player: PlayerState) {
        let mut local_id = self.local_id.write();
        if local_id.is_none() {
            info!("Local player {} ({})", player.id, player.username);
            *local_id = Some(player.id);
        }
        *self.player.write() = Some(Arc::new(player));
    }

    /// Apply one decoded server message
    pub fn apply(&self, message: ServerMessage) {
        match message {
            ServerMessage::World(world) => self.replace_world(world),
            ServerMessage::Player(player) => self.replace_player(player),
            ServerMessage::Eliminated => self.mark_eliminated(),
        }
    }

    /// Edit a copy of the local player and swap it in under one write lock.
    /// Returns `false` when there is no player snapshot yet.
    pub fn modify_player<F>(&self, edit: F) -> bool
    where
        F: FnOnce(&mut PlayerState),
    {
        let mut slot = self.player.write();
        let Some(current) = slot.as_ref() else {
            return false;
        };
        let mut player = PlayerState::clone(current);
        edit(&mut player);
        *slot = Some(Arc::new(player));
        true
    }

    /// Flag the local player inactive; the simulation clock turns that into game over
    pub fn mark_eliminated(&self) {
        let marked = self.modify_player(|player| {
            player.active = false;
            info!("Local player {} eliminated", player.id);
        });
        if !marked {
            debug!("elimination before any player snapshot, ignored");
        }
    }

    /// Decode and apply one bincode-encoded server message
    pub fn apply_bytes(&self, data: &[u8]) -> Result<(), SnapshotError> {
        let message: ServerMessage = decode(data)?;
        self.apply(message);
        Ok(())
    }

    /// Read a JSON world fixture (same shape as [`WorldState`])
    pub fn load_json(path: impl AsRef<Path>) -> Result<WorldState, SnapshotError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Forget everything (session ended)
    pub fn clear(&self) {
        *self.world.write() = None;
        *self.player.write() = None;
        *self.local_id.write() = None;
    }
}

impl WorldSnapshotProvider for SnapshotStore {
    fn player_state(&self) -> Option<Arc<PlayerState>> {
        self.player.read().clone()
    }

    fn state(&self) -> Option<Arc<WorldState>> {
        self.world.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::protocol::encode;
    use crate::util::vec2::Vec2;
    use uuid::Uuid;

    #[test]
    fn test_empty_store_has_nothing() {
        let store = SnapshotStore::new();
        assert!(store.state().is_none());
        assert!(store.player_state().is_none());
        assert!(store.local_id().is_none());
    }

    #[test]
    fn test_captured_snapshot_survives_replacement() {
        let store = SnapshotStore::new();
        let id = Uuid::new_v4();
        store.replace_world(WorldState::default().with_player(PlayerState::new(id, "a", Vec2::ZERO)));

        let captured = store.state().unwrap();
        store.replace_world(WorldState::default());

        assert_eq!(captured.players.len(), 1);
        assert!(store.state().unwrap().players.is_empty());
    }

    #[test]
    fn test_world_update_refreshes_local_player() {
        let store = SnapshotStore::new();
        let id = Uuid::new_v4();
        store.replace_player(PlayerState::new(id, "me", Vec2::ZERO));

        let mut moved = PlayerState::new(id, "me", Vec2::new(40.0, 50.0));
        moved.active = false;
        store.replace_world(WorldState::default().with_player(moved));

        let player = store.player_state().unwrap();
        assert_eq!(player.position, Vec2::new(40.0, 50.0));
        assert!(!player.active);
    }

    #[test]
    fn test_apply_bytes() {
        let store = SnapshotStore::new();
        let id = Uuid::new_v4();
        let bytes = encode(&ServerMessage::Player(PlayerState::new(id, "me", Vec2::ZERO))).unwrap();
        store.apply_bytes(&bytes).unwrap();
        assert_eq!(store.local_id(), Some(id));
        assert!(store.apply_bytes(&[1, 2]).is_err());
    }

    #[test]
    fn test_eliminated_marks_player_inactive() {
        let store = SnapshotStore::new();
        store.apply(ServerMessage::Eliminated);
        assert!(store.player_state().is_none());

        let id = Uuid::new_v4();
        store.replace_player(PlayerState::new(id, "me", Vec2::new(1.0, 2.0)));
        let before = store.player_state().unwrap();

        let bytes = encode(&ServerMessage::Eliminated).unwrap();
        store.apply_bytes(&bytes).unwrap();
        let after = store.player_state().unwrap();
        assert!(!after.active);
        assert_eq!(after.id, id);
        assert!(before.active);
    }

    #[test]
    fn test_modify_player_without_snapshot() {
        let store = SnapshotStore::new();
        assert!(!store.modify_player(|p| p.mouse_angle_degrees = 10.0));
        assert!(store.player_state().is_none());
    }

    #[test]
    fn test_elimination_survives_concurrent_aim_updates() {
        let store = SnapshotStore::new();
        store.replace_player(PlayerState::new(Uuid::new_v4(), "me", Vec2::ZERO));

        std::thread::scope(|scope| {
            scope.spawn(|| {
                for i in 0..1000 {
                    store.modify_player(|p| p.mouse_angle_degrees = i as f32);
                }
            });
            scope.spawn(|| store.mark_eliminated());
        });

        let player = store.player_state().unwrap();
        assert!(!player.active);
        assert_eq!(player.mouse_angle_degrees, 999.0);
    }

    #[test]
    fn test_clear() {
        let store = SnapshotStore::new();
        store.replace_player(PlayerState::new(Uuid::new_v4(), "me", Vec2::ZERO));
        store.replace_world(WorldState::default());
        store.clear();
        assert!(store.state().is_none());
        assert!(store.player_state().is_none());
    }
}
