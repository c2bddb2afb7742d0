use std::time::Duration;

use crate::constants::{fps, quadtree, tick};

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Fixed period of the simulation (input) loop
    pub tick_period: Duration,
    /// Frame durations kept for the rolling FPS average
    pub fps_samples: usize,
    /// Rendering time between two FPS reports
    pub fps_sample_window: Duration,
    /// Report FPS, clock telemetry and player debug values
    pub show_performance_metrics: bool,
    /// Draw the debug grid
    pub show_grid: bool,
    /// Draw player collider outlines
    pub show_bounding_boxes: bool,
    /// Items a quadtree node holds before subdividing
    pub quadtree_capacity: usize,
    /// Depth limit for quadtree subdivision
    pub quadtree_max_depth: u8,
    /// Display refresh period used by the headless driver
    pub frame_interval: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            tick_period: Duration::from_millis(tick::TICK_TIME_MS),
            fps_samples: fps::SAMPLES,
            fps_sample_window: Duration::from_millis(fps::SAMPLE_RATE_MS),
            show_performance_metrics: false,
            show_grid: false,
            show_bounding_boxes: false,
            quadtree_capacity: quadtree::CAPACITY,
            quadtree_max_depth: quadtree::MAX_DEPTH,
            frame_interval: Duration::from_millis(fps::FRAME_INTERVAL_MS),
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("tick period cannot be 0")]
    ZeroTickPeriod,
    #[error("fps_samples must be at least 1")]
    ZeroFpsSamples,
    #[error("fps sample window cannot be 0")]
    ZeroFpsWindow,
    #[error("quadtree capacity must be at least 1")]
    ZeroQuadtreeCapacity,
    #[error("frame interval cannot be 0")]
    ZeroFrameInterval,
}

impl ClientConfig {
    /// Load config from environment or use defaults
    pub fn load_or_default() -> Self {
        Self::load_from(|key| std::env::var(key).ok())
    }

    /// Load config through an arbitrary variable lookup (tests pass a map)
    pub fn load_from<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(ms) = parse_var::<u64, _>(&lookup, "TICK_TIME_MS") {
            if ms > 0 {
                config.tick_period = Duration::from_millis(ms);
            } else {
                tracing::warn!("TICK_TIME_MS must be > 0, using default");
            }
        }

        if let Some(samples) = parse_var::<usize, _>(&lookup, "FPS_SAMPLES") {
            if samples > 0 && samples <= 10_000 {
                config.fps_samples = samples;
            } else {
                tracing::warn!("FPS_SAMPLES must be 1-10000, using default");
            }
        }

        if let Some(ms) = parse_var::<u64, _>(&lookup, "FPS_SAMPLE_RATE_MS") {
            if ms > 0 {
                config.fps_sample_window = Duration::from_millis(ms);
            } else {
                tracing::warn!("FPS_SAMPLE_RATE_MS must be > 0, using default");
            }
        }

        if let Some(flag) = parse_flag(&lookup, "SHOW_PERFORMANCE_METRICS") {
            config.show_performance_metrics = flag;
        }
        if let Some(flag) = parse_flag(&lookup, "SHOW_GRID") {
            config.show_grid = flag;
        }
        if let Some(flag) = parse_flag(&lookup, "SHOW_BOUNDING_BOXES") {
            config.show_bounding_boxes = flag;
        }

        if let Some(capacity) = parse_var::<usize, _>(&lookup, "QUADTREE_CAPACITY") {
            if capacity > 0 {
                config.quadtree_capacity = capacity;
            } else {
                tracing::warn!("QUADTREE_CAPACITY must be > 0, using default");
            }
        }

        if let Some(depth) = parse_var::<u8, _>(&lookup, "QUADTREE_MAX_DEPTH") {
            config.quadtree_max_depth = depth;
        }

        if let Some(ms) = parse_var::<u64, _>(&lookup, "FRAME_INTERVAL_MS") {
            if ms > 0 {
                config.frame_interval = Duration::from_millis(ms);
            } else {
                tracing::warn!("FRAME_INTERVAL_MS must be > 0, using default");
            }
        }

        config
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_period.is_zero() {
            return Err(ConfigError::ZeroTickPeriod);
        }
        if self.fps_samples == 0 {
            return Err(ConfigError::ZeroFpsSamples);
        }
        if self.fps_sample_window.is_zero() {
            return Err(ConfigError::ZeroFpsWindow);
        }
        if self.quadtree_capacity == 0 {
            return Err(ConfigError::ZeroQuadtreeCapacity);
        }
        if self.frame_interval.is_zero() {
            return Err(ConfigError::ZeroFrameInterval);
        }
        Ok(())
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            tracing::warn!("Invalid {} '{}', using default", key, raw);
            None
        }
    }
}

fn parse_flag<F>(lookup: &F, key: &str) -> Option<bool>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => {
            tracing::warn!("Invalid {} '{}', using default", key, raw);
            None
        }
    }
}
