//! Debug stats display
//!
//! The clocks push plain values here. In production with metrics disabled
//! the [`NullTelemetry`] sink discards them.

use tracing::{debug, info, trace};

use crate::clock::simulation::ClockStats;
use crate::util::vec2::Vec2;

/// Sink for on-screen debug values and the game-over signal
pub trait Telemetry {
    fn clock(&mut self, _stats: &ClockStats) {}
    fn fps(&mut self, _fps: u32) {}
    fn player_coordinates(&mut self, _position: Vec2) {}
    fn mouse_angle(&mut self, _degrees: f32) {}
    /// Show the game-over view
    fn game_over(&mut self) {}
}

impl<T: Telemetry + ?Sized> Telemetry for Box<T> {
    fn clock(&mut self, stats: &ClockStats) {
        (**self).clock(stats)
    }

    fn fps(&mut self, fps: u32) {
        (**self).fps(fps)
    }

    fn player_coordinates(&mut self, position: Vec2) {
        (**self).player_coordinates(position)
    }

    fn mouse_angle(&mut self, degrees: f32) {
        (**self).mouse_angle(degrees)
    }

    fn game_over(&mut self) {
        (**self).game_over()
    }
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullTelemetry;

impl Telemetry for NullTelemetry {}

/// Last reported values, as the stats overlay would show them
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ClientStats {
    pub clock: Option<ClockStats>,
    pub fps: Option<u32>,
    pub fps_reports: u64,
    pub clock_reports: u64,
    pub player_coordinates: Option<Vec2>,
    pub mouse_angle: Option<f32>,
    pub game_over_shown: u32,
}

impl ClientStats {
    /// Lines of the debug overlay
    pub fn overlay_lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(4);
        if let Some(fps) = self.fps {
            lines.push(format!("{} fps", fps));
        }
        if let Some(clock) = &self.clock {
            lines.push(format!(
                "delta {}ms elapsed {}ms sleep {}ms",
                clock.delta.as_millis(),
                clock.elapsed.as_millis(),
                clock.sleep.as_millis()
            ));
        }
        if let Some(pos) = self.player_coordinates {
            lines.push(format!("x: {:.0} y: {:.0}", pos.x, pos.y));
        }
        if let Some(angle) = self.mouse_angle {
            lines.push(format!("angle: {:.1}", angle));
        }
        lines
    }
}

/// Records the latest values and mirrors them to `tracing`
#[derive(Debug, Default)]
pub struct TracingTelemetry {
    stats: ClientStats,
}

impl TracingTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> &ClientStats {
        &self.stats
    }
}

impl Telemetry for TracingTelemetry {
    fn clock(&mut self, stats: &ClockStats) {
        trace!(
            delta_ms = stats.delta.as_millis() as u64,
            elapsed_ms = stats.elapsed.as_millis() as u64,
            sleep_ms = stats.sleep.as_millis() as u64,
            "tick"
        );
        self.stats.clock = Some(*stats);
        self.stats.clock_reports += 1;
    }

    fn fps(&mut self, fps: u32) {
        debug!("{} fps", fps);
        self.stats.fps = Some(fps);
        self.stats.fps_reports += 1;
    }

    fn player_coordinates(&mut self, position: Vec2) {
        self.stats.player_coordinates = Some(position);
    }

    fn mouse_angle(&mut self, degrees: f32) {
        self.stats.mouse_angle = Some(degrees);
    }

    fn game_over(&mut self) {
        info!("Game over");
        self.stats.game_over_shown += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_tracing_telemetry_records_latest() {
        let mut telemetry = TracingTelemetry::new();
        telemetry.fps(58);
        telemetry.fps(61);
        telemetry.mouse_angle(12.0);
        telemetry.player_coordinates(Vec2::new(1.0, 2.0));

        let stats = telemetry.stats();
        assert_eq!(stats.fps, Some(61));
        assert_eq!(stats.fps_reports, 2);
        assert_eq!(stats.mouse_angle, Some(12.0));
        assert_eq!(stats.player_coordinates, Some(Vec2::new(1.0, 2.0)));
    }

    #[test]
    fn test_overlay_lines() {
        let mut telemetry = TracingTelemetry::new();
        telemetry.fps(63);
        telemetry.clock(&ClockStats {
            delta: Duration::from_millis(33),
            elapsed: Duration::from_millis(2),
            sleep: Duration::from_millis(31),
            ..Default::default()
        });
        let lines = telemetry.stats().overlay_lines();
        assert_eq!(lines[0], "63 fps");
        assert_eq!(lines[1], "delta 33ms elapsed 2ms sleep 31ms");
    }

    #[test]
    fn test_null_telemetry_accepts_everything() {
        let mut telemetry = NullTelemetry;
        telemetry.fps(60);
        telemetry.game_over();
        telemetry.clock(&ClockStats::default());
    }
}
