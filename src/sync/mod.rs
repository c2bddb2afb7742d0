//! Outbound state synchronisation

pub mod diff;

pub use diff::{diff, PlayerDiff};
