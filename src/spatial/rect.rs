//! Axis-aligned bounding box carrying an opaque payload

use crate::util::vec2::Vec2;

/// An AABB with a payload. `x`/`y` is the top-left corner, `w`/`h` the extents.
///
/// Immutable: when an entity moves, a new rectangle is built for it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rectangle<P> {
    x: f32,
    y: f32,
    w: f32,
    h: f32,
    payload: P,
}

/// A rectangle with no payload, used for node boundaries and query ranges
pub type Region = Rectangle<()>;

impl Region {
    #[inline]
    pub fn region(x: f32, y: f32, w: f32, h: f32) -> Self {
        Rectangle::new(x, y, w, h, ())
    }
}

impl<P> Rectangle<P> {
    /// Negative extents are clamped to zero.
    #[inline]
    pub fn new(x: f32, y: f32, w: f32, h: f32, payload: P) -> Self {
        Self {
            x,
            y,
            w: w.max(0.0),
            h: h.max(0.0),
            payload,
        }
    }

    #[inline]
    pub fn x(&self) -> f32 {
        self.x
    }

    #[inline]
    pub fn y(&self) -> f32 {
        self.y
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.w
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.h
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.w * 0.5, self.y + self.h * 0.5)
    }

    #[inline]
    pub fn payload(&self) -> &P {
        &self.payload
    }

    /// True if `other` lies entirely inside this rectangle, edges included
    #[inline]
    pub fn contains<Q>(&self, other: &Rectangle<Q>) -> bool {
        self.x <= other.x
            && self.y <= other.y
            && self.x + self.w >= other.x + other.w
            && self.y + self.h >= other.y + other.h
    }

    /// Half-extent separation test. Touching edges count as intersecting.
    #[inline]
    pub fn intersects<Q>(&self, other: &Rectangle<Q>) -> bool {
        let a = self.center();
        let b = other.center();
        (a.x - b.x).abs() <= (self.w + other.w) * 0.5
            && (a.y - b.y).abs() <= (self.h + other.h) * 0.5
    }
}
