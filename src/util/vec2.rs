use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Sub};

/// 2D vector used for world positions, screen positions and extents
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    #[inline]
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Angle of this vector in degrees, measured from +x towards +y (screen down)
    #[inline]
    pub fn angle_degrees(&self) -> f32 {
        self.y.atan2(self.x).to_degrees()
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Vec2 {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

impl Sub for Vec2 {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Self;

    #[inline]
    fn mul(self, scalar: f32) -> Self {
        Self::new(self.x * scalar, self.y * scalar)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arithmetic() {
        let a = Vec2::new(3.0, 4.0);
        let b = Vec2::new(1.0, 2.0);
        assert_eq!(a + b, Vec2::new(4.0, 6.0));
        assert_eq!(a - b, Vec2::new(2.0, 2.0));
        assert_eq!(a * 2.0, Vec2::new(6.0, 8.0));
    }

    #[test]
    fn test_angle_degrees() {
        assert!((Vec2::new(1.0, 0.0).angle_degrees() - 0.0).abs() < 1e-4);
        assert!((Vec2::new(0.0, 1.0).angle_degrees() - 90.0).abs() < 1e-4);
        assert!((Vec2::new(-1.0, 0.0).angle_degrees() - 180.0).abs() < 1e-4);
        assert!((Vec2::new(0.0, -1.0).angle_degrees() + 90.0).abs() < 1e-4);
    }

    #[test]
    fn test_is_finite() {
        assert!(Vec2::new(1.0, 2.0).is_finite());
        assert!(!Vec2::new(f32::NAN, 0.0).is_finite());
        assert!(!Vec2::new(0.0, f32::INFINITY).is_finite());
    }
}
