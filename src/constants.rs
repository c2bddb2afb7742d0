/// Simulation (input) loop timing
pub mod tick {
    /// Simulation tick rate in Hz
    pub const TICK_RATE: u32 = 30;
    /// Tick period in milliseconds
    pub const TICK_TIME_MS: u64 = 1000 / TICK_RATE as u64;
}

/// Render loop frame-rate sampling
pub mod fps {
    /// Number of frame durations kept in the rolling buffer
    pub const SAMPLES: usize = 60;
    /// Milliseconds of rendering between two FPS reports
    pub const SAMPLE_RATE_MS: u64 = 1000;
    /// Headless display refresh period (~60 Hz)
    pub const FRAME_INTERVAL_MS: u64 = 16;
}

/// Broad-phase index tuning
pub mod quadtree {
    /// Items a node holds before it subdivides
    pub const CAPACITY: usize = 4;
    /// Depth at which leaves stop subdividing and just grow.
    /// Coincident boxes would otherwise split forever.
    pub const MAX_DEPTH: u8 = 8;
}

/// Player rendering values
pub mod player {
    /// Boost meter full value (boost percent = boost / BOOST_MAX * 100)
    pub const BOOST_MAX: f32 = 100.0;
    /// Primary colour of the local player
    pub const LOCAL_COLOR: &str = "#0F9BF2";
    /// Primary colour of every other player
    pub const OPPONENT_COLOR: &str = "#F25C05";
    /// Outline colour shared by all players
    pub const SECONDARY_COLOR: &str = "black";
}

/// Default item dimensions, used when the snapshot carries a zero size
pub mod items {
    pub const ARMOR_WIDTH: f32 = 40.0;
    pub const ARMOR_HEIGHT: f32 = 40.0;
    pub const HELM_WIDTH: f32 = 36.0;
    pub const HELM_HEIGHT: f32 = 36.0;
    pub const SWORD_WIDTH: f32 = 16.0;
    pub const SWORD_HEIGHT: f32 = 56.0;
    pub const LIFE_WIDTH: f32 = 32.0;
    pub const LIFE_HEIGHT: f32 = 32.0;
    pub const BLOOD_WIDTH: f32 = 24.0;
    pub const BLOOD_HEIGHT: f32 = 24.0;
    /// Generic orb items are drawn as circles of this diameter
    pub const OTHER_SIZE: f32 = 20.0;
}
