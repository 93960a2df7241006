use crate::canvas::Canvas;
use crate::physics::{Rect, Viewport};
use glam::Vec2;
use tracing::info;

/// Gap between the resting match and the bottom-right corner.
const REST_INSET: f32 = 35.0;
/// How close to the match a press must land to pick it up.
const GRAB_RADIUS: f32 = 40.0;

/// Something with a fuse the match can light.
pub trait FuseTarget {
    /// Current hit-zone, or `None` when there is nothing to hit.
    fn fuse_rect(&self) -> Option<Rect>;
    /// Lights the fuse. Returns false when it was already burning.
    fn ignite(&mut self) -> bool;
}

/// Pointer input, in surface pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PointerEvent {
    Press(Vec2),
    Move(Vec2),
    Release,
}

/// The draggable match.
#[derive(Clone, Debug)]
pub struct IgnitionTrigger {
    position: Option<Vec2>,
    dragging: bool,
    anchor: Vec2,
    grab_radius: f32,
}

impl IgnitionTrigger {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            position: None,
            dragging: false,
            anchor: Self::rest_anchor(viewport),
            grab_radius: Self::grab_radius(viewport),
        }
    }

    fn grab_radius(viewport: Viewport) -> f32 {
        (GRAB_RADIUS * viewport.scale()).max(3.0)
    }

    fn rest_anchor(viewport: Viewport) -> Vec2 {
        let inset = (REST_INSET * viewport.scale()).max(2.0);
        Vec2::new(viewport.width - inset, viewport.height - inset)
    }

    pub fn resize(&mut self, viewport: Viewport) {
        self.anchor = Self::rest_anchor(viewport);
        self.grab_radius = Self::grab_radius(viewport);
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Where the match is drawn: the drag point, or the resting anchor.
    pub fn position(&self) -> Vec2 {
        self.position.unwrap_or(self.anchor)
    }

    /// Feeds one pointer event. Returns how many targets were lit by it.
    pub fn handle<T: FuseTarget>(&mut self, event: PointerEvent, targets: &mut [T]) -> usize {
        match event {
            PointerEvent::Press(point) => {
                if point.distance(self.position()) <= self.grab_radius {
                    self.dragging = true;
                    self.position = Some(point);
                }
                Self::strike(point, targets)
            }
            PointerEvent::Move(point) => {
                if !self.dragging {
                    return 0;
                }
                self.position = Some(point);
                Self::strike(point, targets)
            }
            PointerEvent::Release => {
                self.dragging = false;
                self.position = None;
                0
            }
        }
    }

    fn strike<T: FuseTarget>(point: Vec2, targets: &mut [T]) -> usize {
        let mut lit = 0;
        for (i, target) in targets.iter_mut().enumerate() {
            let Some(rect) = target.fuse_rect() else {
                continue;
            };
            if rect.contains(point) && target.ignite() {
                info!(chain = i, x = point.x, y = point.y, "fuse lit");
                lit += 1;
            }
        }
        lit
    }

    /// A match stick with a flickering head.
    pub fn render(&self, canvas: &mut Canvas) {
        let head = self.position();
        let x = head.x.floor() as i32;
        let y = head.y.floor() as i32;

        for i in 1..=3 {
            canvas.blend(x, y + i, (160, 110, 60), 1.0);
        }
        canvas.blend(x, y, (200, 40, 20), 1.0);

        let flicker = 0.6 + fastrand::f32() * 0.4;
        canvas.add(x, y - 1, (255, 200, 80), flicker);
        canvas.add(x, y - 2, (255, 120, 30), flicker * 0.5);
        for dx in [-1, 1] {
            canvas.add(x + dx, y - 1, (230, 126, 34), flicker * 0.35);
            canvas.add(x + dx, y, (230, 126, 34), flicker * 0.25);
        }
    }
}
