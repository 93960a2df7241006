//! Shared motion and geometry primitives.
//!
//! All motion is frame-coupled: one call to [`Body::step`] is one tick, and
//! velocities are expressed in pixels per tick.

use glam::Vec2;
use std::ops::Range;

/// Screen height the reference magnitudes were tuned for.
pub const REFERENCE_HEIGHT: f32 = 900.0;

/// A moving point under gravity and air drag.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Body {
    pub pos: Vec2,
    pub vel: Vec2,
    pub gravity: f32,
    /// Velocity multiplier applied every tick, in (0, 1].
    pub drag: f32,
}

impl Body {
    pub fn new(pos: Vec2, vel: Vec2, gravity: f32, drag: f32) -> Self {
        debug_assert!(drag > 0.0 && drag <= 1.0, "drag must be in (0, 1]");
        Self { pos, vel, gravity, drag }
    }

    pub fn step(&mut self) {
        self.vel.y += self.gravity;
        self.pos += self.vel;
        self.vel *= self.drag;
    }
}

/// Pixel dimensions of the drawing surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width: width.max(0.0),
            height: height.max(0.0),
        }
    }

    /// Multiplier that maps reference magnitudes onto this surface.
    pub fn scale(&self) -> f32 {
        self.height / REFERENCE_HEIGHT
    }

    pub fn is_empty(&self) -> bool {
        self.width < 1.0 || self.height < 1.0
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }
}

/// Axis-aligned rectangle in screen space (y grows downward).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

impl Rect {
    pub fn from_center(center: Vec2, size: Vec2) -> Self {
        let half = size / 2.0;
        Self {
            left: center.x - half.x,
            right: center.x + half.x,
            top: center.y - half.y,
            bottom: center.y + half.y,
        }
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(
            (self.left + self.right) / 2.0,
            (self.top + self.bottom) / 2.0,
        )
    }

    /// Strict containment; a point on the border is outside.
    pub fn contains(&self, point: Vec2) -> bool {
        point.x > self.left && point.x < self.right && point.y > self.top && point.y < self.bottom
    }
}

/// Uniform sample from `range`.
pub fn random_in(range: Range<f32>) -> f32 {
    range.start + fastrand::f32() * (range.end - range.start)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_applies_gravity_before_drag() {
        let mut body = Body::new(Vec2::ZERO, Vec2::new(2.0, 0.0), 1.0, 0.5);
        body.step();
        assert_eq!(body.pos, Vec2::new(2.0, 1.0));
        assert_eq!(body.vel, Vec2::new(1.0, 0.5));
    }

    #[test]
    fn test_step_without_drag_is_ballistic() {
        let mut body = Body::new(Vec2::new(0.0, 10.0), Vec2::new(0.0, -3.0), 1.0, 1.0);
        body.step();
        body.step();
        body.step();
        // -2, -1, 0
        assert_eq!(body.pos.y, 7.0);
        assert_eq!(body.vel.y, 0.0);
    }

    #[test]
    fn test_rect_contains_is_strict() {
        let rect = Rect { left: 10.0, right: 50.0, top: 100.0, bottom: 140.0 };
        assert!(rect.contains(Vec2::new(30.0, 120.0)));
        assert!(!rect.contains(Vec2::new(10.0, 120.0)));
        assert!(!rect.contains(Vec2::new(30.0, 140.0)));
        assert!(!rect.contains(Vec2::new(60.0, 120.0)));
        assert_eq!(rect.center(), Vec2::new(30.0, 120.0));
    }

    #[test]
    fn test_viewport_scale() {
        let viewport = Viewport::new(160.0, 450.0);
        assert_eq!(viewport.scale(), 0.5);
        assert!(!viewport.is_empty());
        assert!(Viewport::new(0.0, 100.0).is_empty());
    }

    #[test]
    fn test_random_in_stays_in_range() {
        for _ in 0..1000 {
            let v = random_in(2.0..8.0);
            assert!((2.0..8.0).contains(&v));
        }
    }
}
