//! Per-refresh render pass and frame-rate sampling
//!
//! Runs once per display refresh, independent of the simulation tick. Each
//! frame captures the current snapshot once, rebuilds the item and player
//! quadtrees over the visible region, queries them and hands the hits,
//! translated to screen space, to the draw surface. The trees hold entity ids
//! and are reset rather than reallocated between frames.

use std::collections::VecDeque;
use std::time::Duration;

use tracing::trace;

use crate::clock::TimeSource;
use crate::config::ClientConfig;
use crate::constants::player;
use crate::net::snapshot::WorldSnapshotProvider;
use crate::render::{to_screen, DrawSurface, PlayerSprite};
use crate::spatial::{Quadtree, Rectangle, Region};
use crate::telemetry::Telemetry;
use crate::world::{ColliderBox, ItemId, PlayerId, PlayerState};

/// Rolling frame-duration average reported as FPS once per sampling window
#[derive(Debug, Clone)]
pub struct FpsSampler {
    render_times: VecDeque<Duration>,
    max_samples: usize,
    window: Duration,
    /// Milliseconds of rendering left before the next report; may go negative
    countdown_ms: f64,
}

impl FpsSampler {
    pub fn new(max_samples: usize, window: Duration) -> Self {
        let max_samples = max_samples.max(1);
        Self {
            render_times: VecDeque::with_capacity(max_samples + 1),
            max_samples,
            window,
            countdown_ms: window.as_secs_f64() * 1000.0,
        }
    }

    /// Record one frame duration. Returns the FPS when a report is due.
    pub fn record(&mut self, frame: Duration) -> Option<u32> {
        self.render_times.push_back(frame);
        while self.render_times.len() > self.max_samples {
            self.render_times.pop_front();
        }

        self.countdown_ms -= frame.as_secs_f64() * 1000.0;
        if self.countdown_ms > 0.0 {
            return None;
        }
        self.countdown_ms = self.window.as_secs_f64() * 1000.0;

        let mean_ms = self.average_frame_time().as_secs_f64() * 1000.0;
        if mean_ms <= 0.0 {
            return None;
        }
        Some((1000.0 / mean_ms).round() as u32)
    }

    pub fn average_frame_time(&self) -> Duration {
        if self.render_times.is_empty() {
            return Duration::ZERO;
        }
        let sum: Duration = self.render_times.iter().sum();
        sum / self.render_times.len() as u32
    }

    #[inline]
    pub fn sample_count(&self) -> usize {
        self.render_times.len()
    }
}

/// Why a frame drew nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    EmptyViewport,
    NoWorld,
    NoPlayer,
}

/// What one drawn frame contained
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameReport {
    pub items_visible: usize,
    pub players_visible: usize,
    pub item_nodes: usize,
    pub player_nodes: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Drawn(FrameReport),
    Skipped(SkipReason),
}

/// Collaborators a frame reads from and draws to
pub struct RenderContext<'a> {
    pub time: &'a dyn TimeSource,
    pub world: &'a dyn WorldSnapshotProvider,
    pub surface: &'a mut dyn DrawSurface,
    pub telemetry: &'a mut dyn Telemetry,
}

#[derive(Debug)]
pub struct RenderClock {
    fps: FpsSampler,
    last_render_start: Duration,
    show_performance_metrics: bool,
    show_grid: bool,
    show_bounding_boxes: bool,
    item_tree: Quadtree<ItemId>,
    player_tree: Quadtree<PlayerId>,
    frames: u64,
}

impl RenderClock {
    pub fn new(config: &ClientConfig, now: Duration) -> Self {
        Self {
            fps: FpsSampler::new(config.fps_samples, config.fps_sample_window),
            last_render_start: now,
            show_performance_metrics: config.show_performance_metrics,
            show_grid: config.show_grid,
            show_bounding_boxes: config.show_bounding_boxes,
            item_tree: Quadtree::with_max_depth(
                Region::region(0.0, 0.0, 0.0, 0.0),
                config.quadtree_capacity,
                config.quadtree_max_depth,
            ),
            player_tree: Quadtree::with_max_depth(
                Region::region(0.0, 0.0, 0.0, 0.0),
                config.quadtree_capacity,
                config.quadtree_max_depth,
            ),
            frames: 0,
        }
    }

    #[inline]
    pub fn fps_sampler(&self) -> &FpsSampler {
        &self.fps
    }

    #[inline]
    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    /// Run one frame
    pub fn frame(&mut self, ctx: &mut RenderContext<'_>) -> FrameOutcome {
        let render_start = ctx.time.now();
        let frame_time = render_start.saturating_sub(self.last_render_start);
        self.last_render_start = render_start;
        self.frames += 1;

        if self.show_performance_metrics {
            if let Some(fps) = self.fps.record(frame_time) {
                ctx.telemetry.fps(fps);
            }
        }

        let viewport = ctx.surface.viewport();
        if viewport.is_empty() {
            return FrameOutcome::Skipped(SkipReason::EmptyViewport);
        }
        let Some(world) = ctx.world.state() else {
            return FrameOutcome::Skipped(SkipReason::NoWorld);
        };
        let Some(local) = ctx.world.player_state() else {
            return FrameOutcome::Skipped(SkipReason::NoPlayer);
        };

        let (width, height) = (viewport.width, viewport.height);
        let surface = &mut *ctx.surface;

        surface.clear(width, height);
        surface.background(
            width,
            height,
            local.mouse_angle_degrees.to_radians(),
            local.is_boosting,
        );
        if self.show_grid {
            surface.grid(width, height);
        }

        let origin = viewport.world_origin(local.position);
        let visible = viewport.world_region(local.position);
        let mut report = FrameReport::default();

        // Items
        self.item_tree.reset(visible);
        for item in world.items.values() {
            let (w, h) = item.draw_size();
            self.item_tree
                .insert(Rectangle::new(item.position.x, item.position.y, w, h, item.id));
        }
        for hit in self.item_tree.query_unique(&visible) {
            let Some(item) = world.items.get(hit.payload()) else {
                continue;
            };
            surface.item(
                item.kind,
                to_screen(item.position, origin),
                hit.width(),
                hit.height(),
            );
            report.items_visible += 1;
        }
        report.item_nodes = self.item_tree.stats().node_count;

        // Players
        self.player_tree.reset(visible);
        for p in world.players.values() {
            self.player_tree
                .insert(Rectangle::new(p.position.x, p.position.y, p.width, p.height, p.id));
        }
        for hit in self.player_tree.query_unique(&visible) {
            let Some(p) = world.players.get(hit.payload()) else {
                continue;
            };
            let primary_color = if p.id == local.id {
                player::LOCAL_COLOR
            } else {
                player::OPPONENT_COLOR
            };
            surface.player(&PlayerSprite {
                position: to_screen(p.position, origin),
                width: p.width,
                height: p.height,
                aim_radians: p.mouse_angle_degrees.to_radians(),
                username: &p.username,
                boost_percent: boost_percent(p.boost_value),
                health_percent: p.health,
                primary_color,
                secondary_color: player::SECONDARY_COLOR,
                level: p.level,
                xp: p.xp,
                items: p.items,
            });
            if self.show_bounding_boxes && !p.colliders.is_empty() {
                let boxes: Vec<ColliderBox> = p
                    .colliders
                    .iter()
                    .map(|c| ColliderBox {
                        position: to_screen(c.position, origin),
                        ..*c
                    })
                    .collect();
                surface.colliders(&boxes);
            }
            report.players_visible += 1;
        }
        report.player_nodes = self.player_tree.stats().node_count;

        let others: Vec<&PlayerState> = world
            .players
            .values()
            .filter(|p| p.id != local.id)
            .collect();
        surface.minimap(width, height, local.position, &others);
        surface.leaderboard(width, height, &world.leaderboard, local.id);

        if self.show_performance_metrics {
            ctx.telemetry.player_coordinates(local.position);
            ctx.telemetry.mouse_angle(local.mouse_angle_degrees);
        }

        trace!(
            items = report.items_visible,
            players = report.players_visible,
            "frame drawn"
        );
        FrameOutcome::Drawn(report)
    }
}

/// Boost meter as a whole percentage of its maximum
#[inline]
pub fn boost_percent(boost_value: f32) -> u32 {
    ((boost_value / player::BOOST_MAX) * 100.0).round().max(0.0) as u32
}
