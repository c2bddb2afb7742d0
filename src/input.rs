//! Pointer-derived aim input

use std::sync::Arc;

use parking_lot::Mutex;

use crate::util::vec2::Vec2;

/// Current aim intent, sampled once per simulation tick. Pure query.
pub trait InputSampler {
    fn aim_degrees(&self) -> f32;
}

#[derive(Debug, Clone, Copy)]
struct PointerState {
    pointer: Vec2,
    viewport: Vec2,
}

/// Aim from the last pointer position relative to the viewport centre.
///
/// The local player is always drawn at the centre, so this is the angle from
/// the player to the cursor. Event handlers call [`PointerInput::pointer_moved`]
/// and [`PointerInput::resized`]; the tick only reads.
#[derive(Debug)]
pub struct PointerInput {
    state: Mutex<PointerState>,
}

impl PointerInput {
    pub fn new(viewport_width: f32, viewport_height: f32) -> Self {
        let viewport = Vec2::new(viewport_width, viewport_height);
        Self {
            state: Mutex::new(PointerState {
                pointer: viewport * 0.5,
                viewport,
            }),
        }
    }

    /// Pointer moved to `(x, y)` in screen pixels
    pub fn pointer_moved(&self, x: f32, y: f32) {
        let position = Vec2::new(x, y);
        if position.is_finite() {
            self.state.lock().pointer = position;
        }
    }

    pub fn resized(&self, width: f32, height: f32) {
        self.state.lock().viewport = Vec2::new(width.max(0.0), height.max(0.0));
    }
}

impl InputSampler for PointerInput {
    fn aim_degrees(&self) -> f32 {
        let state = *self.state.lock();
        let offset = state.pointer - state.viewport * 0.5;
        if offset == Vec2::ZERO {
            return 0.0;
        }
        offset.angle_degrees()
    }
}

impl<T: InputSampler + ?Sized> InputSampler for Arc<T> {
    fn aim_degrees(&self) -> f32 {
        (**self).aim_degrees()
    }
}

/// Fixed aim, for tests and scripted clients
impl InputSampler for f32 {
    fn aim_degrees(&self) -> f32 {
        *self
    }
}
