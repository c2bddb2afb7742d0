//! Partial player updates for the outbound input channel
//!
//! The client only authors a small subset of its own player state. Each tick
//! that subset is compared field by field against what was last transmitted,
//! and only changed fields go on the wire. When nothing changed there is no
//! record at all and the tick sends nothing.

use serde::{Deserialize, Serialize};

use crate::world::PlayerState;

/// Sparse record of the locally-authored fields that changed.
///
/// Every field is optional; a record is only ever built with at least one set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerDiff {
    #[serde(default)]
    pub mouse_angle_degrees: Option<f32>,
}

impl PlayerDiff {
    /// True when no field is set
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.mouse_angle_degrees.is_none()
    }
}

/// Compare the locally-authored fields of two player states.
///
/// Returns `None` when they match; otherwise a record holding only the
/// changed fields with their `updated` values. Fields the server owns
/// (position, health, items, ...) are ignored.
pub fn diff(previous: &PlayerState, updated: &PlayerState) -> Option<PlayerDiff> {
    let mut record = PlayerDiff::default();

    // Bitwise compare keeps NaN == NaN so a stuck NaN is not resent every tick
    if previous.mouse_angle_degrees.to_bits() != updated.mouse_angle_degrees.to_bits() {
        record.mouse_angle_degrees = Some(updated.mouse_angle_degrees);
    }

    if record.is_empty() {
        None
    } else {
        Some(record)
    }
}
