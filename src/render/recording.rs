//! Headless surface that records draw calls
//!
//! Used by the headless client and by tests. Each `clear` starts a new frame
//! and drops the previous frame's commands.

use crate::render::{DrawSurface, PlayerSprite, Viewport};
use crate::util::vec2::Vec2;
use crate::world::{ColliderBox, ItemKind, LeaderboardEntry, OwnedItems, PlayerId, PlayerState};

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear,
    Background { aim_radians: f32, boosting: bool },
    Grid,
    Item { kind: ItemKind, position: Vec2, width: f32, height: f32 },
    Player {
        position: Vec2,
        username: String,
        boost_percent: u32,
        primary_color: &'static str,
        items: OwnedItems,
    },
    Colliders(Vec<ColliderBox>),
    Minimap { local: Vec2, others: usize },
    Leaderboard { entries: usize },
}

#[derive(Debug, Default)]
pub struct RecordingSurface {
    viewport: Viewport,
    commands: Vec<DrawCommand>,
    frames: u64,
}

impl RecordingSurface {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            viewport: Viewport::new(width, height),
            ..Default::default()
        }
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.viewport = Viewport::new(width, height);
    }

    /// Commands of the current (last cleared) frame
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Frames started so far
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn players(&self) -> impl Iterator<Item = &DrawCommand> {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Player { .. }))
    }

    pub fn items(&self) -> impl Iterator<Item = &DrawCommand> {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Item { .. }))
    }
}

impl DrawSurface for RecordingSurface {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn clear(&mut self, _width: f32, _height: f32) {
        self.commands.clear();
        self.commands.push(DrawCommand::Clear);
        self.frames += 1;
    }

    fn background(&mut self, _width: f32, _height: f32, aim_radians: f32, boosting: bool) {
        self.commands.push(DrawCommand::Background { aim_radians, boosting });
    }

    fn grid(&mut self, _width: f32, _height: f32) {
        self.commands.push(DrawCommand::Grid);
    }

    fn item(&mut self, kind: ItemKind, position: Vec2, width: f32, height: f32) {
        self.commands.push(DrawCommand::Item { kind, position, width, height });
    }

    fn player(&mut self, sprite: &PlayerSprite<'_>) {
        self.commands.push(DrawCommand::Player {
            position: sprite.position,
            username: sprite.username.to_string(),
            boost_percent: sprite.boost_percent,
            primary_color: sprite.primary_color,
            items: sprite.items,
        });
    }

    fn colliders(&mut self, boxes: &[ColliderBox]) {
        self.commands.push(DrawCommand::Colliders(boxes.to_vec()));
    }

    fn minimap(&mut self, _width: f32, _height: f32, local: Vec2, others: &[&PlayerState]) {
        self.commands.push(DrawCommand::Minimap { local, others: others.len() });
    }

    fn leaderboard(&mut self, _width: f32, _height: f32, entries: &[LeaderboardEntry], _local_id: PlayerId) {
        self.commands.push(DrawCommand::Leaderboard { entries: entries.len() });
    }
}
