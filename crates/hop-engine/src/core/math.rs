//! 2D math primitives.
//!
//! `Vector2` is `glam::Vec2`. The extension trait adds the handful of
//! operations the simulation leans on that glam spells differently
//! (or not at all), each with a non-mutating form.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// 2D vector used throughout the engine (x right, y down).
pub type Vector2 = Vec2;

/// Extra vector operations used by physics and entity code.
pub trait VectorExt: Sized {
    /// Unit vector in the same direction, or zero for a zero vector.
    fn normalized(self) -> Self;
    /// Rotate counter-clockwise by `angle` radians.
    fn rotated(self, angle: f32) -> Self;
    /// Linear interpolation. `t` is NOT clamped: values outside [0, 1]
    /// extrapolate past the endpoints, so callers must clamp if needed.
    fn lerp_unclamped(self, to: Self, t: f32) -> Self;
    /// Reflect across a surface with unit normal `normal`.
    fn reflected(self, normal: Self) -> Self;
    /// Perpendicular vector (rotated +90 degrees).
    fn perpendicular(self) -> Self;
    /// Normalize in place; zero stays zero.
    fn normalize_mut(&mut self);
    /// Rotate in place.
    fn rotate_mut(&mut self, angle: f32);
}

impl VectorExt for Vec2 {
    #[inline]
    fn normalized(self) -> Self {
        self.normalize_or_zero()
    }

    #[inline]
    fn rotated(self, angle: f32) -> Self {
        Vec2::from_angle(angle).rotate(self)
    }

    #[inline]
    fn lerp_unclamped(self, to: Self, t: f32) -> Self {
        self + (to - self) * t
    }

    #[inline]
    fn reflected(self, normal: Self) -> Self {
        self - normal * (2.0 * self.dot(normal))
    }

    #[inline]
    fn perpendicular(self) -> Self {
        self.perp()
    }

    fn normalize_mut(&mut self) {
        *self = self.normalized();
    }

    fn rotate_mut(&mut self, angle: f32) {
        *self = self.rotated(angle);
    }
}

/// Axis-aligned bounding box in world space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Box with its top-left corner at `pos`.
    pub fn from_pos_size(pos: Vec2, size: Vec2) -> Self {
        Self {
            min: pos,
            max: pos + size,
        }
    }

    pub fn from_center_half(center: Vec2, half: Vec2) -> Self {
        Self {
            min: center - half,
            max: center + half,
        }
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    pub fn half_extents(&self) -> Vec2 {
        self.size() * 0.5
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    /// Strict overlap test (touching edges do not count).
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
    }

    pub fn contains_point(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Per-axis overlap amounts. Negative components mean a gap on that axis.
    pub fn overlap_extent(&self, other: &Aabb) -> Vec2 {
        Vec2::new(
            self.max.x.min(other.max.x) - self.min.x.max(other.min.x),
            self.max.y.min(other.max.y) - self.min.y.max(other.min.y),
        )
    }

    pub fn translated(&self, offset: Vec2) -> Self {
        Self {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    pub fn expanded(&self, amount: f32) -> Self {
        Self {
            min: self.min - Vec2::splat(amount),
            max: self.max + Vec2::splat(amount),
        }
    }

    pub fn union(&self, other: &Aabb) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }
}
