//! Arena Client Library
//!
//! Client-side loops of a real-time arena game: a fixed-period simulation
//! tick that ships aim changes to the server, and a per-refresh render pass
//! that culls the world snapshot through a quadtree before drawing.

pub mod clock;
pub mod config;
pub mod constants;
pub mod driver;
pub mod input;
pub mod net;
pub mod render;
pub mod spatial;
pub mod sync;
pub mod telemetry;
pub mod util;
pub mod world;
