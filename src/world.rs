//! World snapshot data model
//!
//! These types mirror what the authoritative server sends. The client never
//! mutates them in place: a new snapshot replaces the old one wholesale.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::constants::items;
use crate::util::vec2::Vec2;

pub type PlayerId = uuid::Uuid;
pub type ItemId = u64;

/// Equipment flags a player has picked up
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnedItems {
    pub armor: bool,
    pub helm: bool,
    pub sword: bool,
}

/// World-space collider outline, drawn in debug mode
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColliderBox {
    pub position: Vec2,
    pub width: f32,
    pub height: f32,
}

/// Local mirror of one player as last reported by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    pub id: PlayerId,
    pub username: String,
    /// Anchor of the player's box in world coordinates
    pub position: Vec2,
    pub width: f32,
    pub height: f32,
    /// Aim direction in degrees; the only field this client authors
    pub mouse_angle_degrees: f32,
    /// False once the player has been eliminated
    pub active: bool,
    /// Health percentage (0-100)
    pub health: f32,
    /// Raw boost meter value (0..=BOOST_MAX)
    pub boost_value: f32,
    pub is_boosting: bool,
    pub items: OwnedItems,
    pub level: u32,
    pub xp: u32,
    #[serde(default)]
    pub colliders: Vec<ColliderBox>,
}

impl PlayerState {
    pub fn new(id: PlayerId, username: impl Into<String>, position: Vec2) -> Self {
        Self {
            id,
            username: username.into(),
            position,
            width: 50.0,
            height: 50.0,
            mouse_angle_degrees: 0.0,
            active: true,
            health: 100.0,
            boost_value: 0.0,
            is_boosting: false,
            items: OwnedItems::default(),
            level: 1,
            xp: 0,
            colliders: Vec::new(),
        }
    }
}

/// Item type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    Armor,
    Helm,
    Sword,
    Life,
    Blood,
    Other,
}

impl ItemKind {
    /// Dimensions used when the snapshot leaves the item's size at zero
    pub fn default_size(&self) -> (f32, f32) {
        match self {
            ItemKind::Armor => (items::ARMOR_WIDTH, items::ARMOR_HEIGHT),
            ItemKind::Helm => (items::HELM_WIDTH, items::HELM_HEIGHT),
            ItemKind::Sword => (items::SWORD_WIDTH, items::SWORD_HEIGHT),
            ItemKind::Life => (items::LIFE_WIDTH, items::LIFE_HEIGHT),
            ItemKind::Blood => (items::BLOOD_WIDTH, items::BLOOD_HEIGHT),
            ItemKind::Other => (items::OTHER_SIZE, items::OTHER_SIZE),
        }
    }
}

/// A collectible lying in the arena
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemState {
    pub id: ItemId,
    pub position: Vec2,
    pub width: f32,
    pub height: f32,
    pub kind: ItemKind,
}

impl ItemState {
    /// Size to draw with, falling back to the kind's default per axis
    pub fn draw_size(&self) -> (f32, f32) {
        let (default_w, default_h) = self.kind.default_size();
        let w = if self.width > 0.0 { self.width } else { default_w };
        let h = if self.height > 0.0 { self.height } else { default_h };
        (w, h)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub id: PlayerId,
    pub username: String,
    pub score: u32,
}

/// Full world state as last received from the server
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldState {
    pub players: HashMap<PlayerId, PlayerState>,
    pub items: HashMap<ItemId, ItemState>,
    #[serde(default)]
    pub leaderboard: Vec<LeaderboardEntry>,
}

impl WorldState {
    pub fn with_player(mut self, player: PlayerState) -> Self {
        self.players.insert(player.id, player);
        self
    }

    pub fn with_item(mut self, item: ItemState) -> Self {
        self.items.insert(item.id, item);
        self
    }
}
