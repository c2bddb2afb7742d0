//! Drawing collaborator interface
//!
//! Surfaces receive screen-relative coordinates only. All world-to-screen
//! translation happens in the render clock before anything is handed over.

pub mod recording;

use crate::spatial::Region;
use crate::util::vec2::Vec2;
use crate::world::{ColliderBox, ItemKind, LeaderboardEntry, OwnedItems, PlayerId, PlayerState};

pub use recording::{DrawCommand, RecordingSurface};

/// Drawable area in pixels. May be (0, 0) before layout.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// World position of the screen's top-left corner when `center` is drawn mid-screen
    #[inline]
    pub fn world_origin(&self, center: Vec2) -> Vec2 {
        center - Vec2::new(self.width, self.height) * 0.5
    }

    /// The visible part of the world when centred on `center`
    pub fn world_region(&self, center: Vec2) -> Region {
        let origin = self.world_origin(center);
        Region::region(origin.x, origin.y, self.width, self.height)
    }
}

/// World position to screen position given the screen's world origin
#[inline]
pub fn to_screen(world: Vec2, origin: Vec2) -> Vec2 {
    world - origin
}

/// Everything a surface needs to draw one player
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSprite<'a> {
    pub position: Vec2,
    pub width: f32,
    pub height: f32,
    pub aim_radians: f32,
    pub username: &'a str,
    pub boost_percent: u32,
    pub health_percent: f32,
    pub primary_color: &'static str,
    pub secondary_color: &'static str,
    pub level: u32,
    pub xp: u32,
    pub items: OwnedItems,
}

/// Drawing primitives and HUD widgets provided by the host
pub trait DrawSurface {
    fn viewport(&self) -> Viewport;
    fn clear(&mut self, width: f32, height: f32);
    fn background(&mut self, width: f32, height: f32, aim_radians: f32, boosting: bool);
    fn grid(&mut self, width: f32, height: f32);
    fn item(&mut self, kind: ItemKind, position: Vec2, width: f32, height: f32);
    fn player(&mut self, sprite: &PlayerSprite<'_>);
    fn colliders(&mut self, boxes: &[ColliderBox]);
    /// Minimap works in its own map space, so it gets world positions
    fn minimap(&mut self, width: f32, height: f32, local: Vec2, others: &[&PlayerState]);
    fn leaderboard(&mut self, width: f32, height: f32, entries: &[LeaderboardEntry], local_id: PlayerId);
}
