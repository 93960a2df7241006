//! Spent firecracker casings.
//!
//! Each detonated segment becomes a [`Debris`] record that tumbles under
//! gravity until it reaches its own ground line, then lies there as flat torn
//! paper for the rest of the session.

use crate::canvas::{scale_rgb, Canvas, Rgb};
use crate::physics::{Body, Rect, Viewport};
use glam::Vec2;
use noise::{NoiseFn, Perlin};
use tracing::trace;

const GRAVITY: f32 = 0.6;
const SIDE_SPEED: f32 = 15.0;
const SPIN: f32 = 20.0;
const GROUND_MARGIN: f32 = 20.0;
const GROUND_SPREAD: f32 = 40.0;
const FLATTEN: Vec2 = Vec2::new(1.1, 0.6);

const CASING_DARK: Rgb = (139, 0, 0);
const CASING_LIGHT: Rgb = (255, 77, 77);
const BAND_GOLD: Rgb = (241, 196, 15);
const PAPER_RED: Rgb = (198, 40, 40);

/// Index of a piece inside its [`DebrisField`].
pub type DebrisId = usize;

/// Outline of a landed piece in local coordinates, `u` and `v` in [0, 1].
#[derive(Clone, Debug, PartialEq)]
pub struct Silhouette {
    /// Cut along the quad (0,0) (1,0.1) (0.95,1) (0.05,0.9).
    pub clipped: bool,
    /// Depth of the torn top edge for each eighth of the width.
    pub tear: [f32; 8],
}

impl Silhouette {
    pub fn contains(&self, u: f32, v: f32) -> bool {
        if !(0.0..=1.0).contains(&u) || !(0.0..=1.0).contains(&v) {
            return false;
        }
        let slot = ((u * self.tear.len() as f32) as usize).min(self.tear.len() - 1);
        if v < self.tear[slot] {
            return false;
        }
        if self.clipped {
            let top = 0.1 * u;
            let bottom = 0.9 + 0.1 * u;
            let left = 0.05 * v;
            let right = 1.0 - 0.05 * v;
            return v >= top && v <= bottom && u >= left && u <= right;
        }
        true
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum DebrisState {
    Falling,
    Landed(Silhouette),
}

#[derive(Clone, Debug)]
pub struct Debris {
    pub body: Body,
    /// Degrees.
    pub rotation: f32,
    /// Degrees per tick.
    pub spin: f32,
    pub ground: f32,
    pub size: Vec2,
    pub state: DebrisState,
}

impl Debris {
    pub fn is_landed(&self) -> bool {
        matches!(self.state, DebrisState::Landed(_))
    }

    /// Drawn extent, flattened once landed.
    pub fn extent(&self) -> Vec2 {
        if self.is_landed() {
            self.size * FLATTEN
        } else {
            self.size
        }
    }
}

/// Arena of every casing ever dropped. Pieces are never removed.
pub struct DebrisField {
    pieces: Vec<Debris>,
    viewport: Viewport,
    perlin: Perlin,
}

impl DebrisField {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            pieces: Vec::new(),
            viewport,
            perlin: Perlin::new(fastrand::u32(0..1000)),
        }
    }

    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn pieces(&self) -> &[Debris] {
        &self.pieces
    }

    pub fn get(&self, id: DebrisId) -> Option<&Debris> {
        self.pieces.get(id)
    }

    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    /// Throws a casing out of `rect`, starting at the given lean.
    pub fn spawn(&mut self, rect: Rect, rotation: f32) -> DebrisId {
        let scale = self.viewport.scale();
        let ground =
            self.viewport.height - GROUND_MARGIN * scale - fastrand::f32() * GROUND_SPREAD * scale;
        let vel = Vec2::new(
            (fastrand::f32() - 0.5) * SIDE_SPEED * scale,
            -(5.0 + fastrand::f32() * 5.0) * scale,
        );
        self.pieces.push(Debris {
            body: Body::new(rect.center(), vel, GRAVITY * scale, 1.0),
            rotation,
            spin: (fastrand::f32() - 0.5) * SPIN,
            ground,
            size: Vec2::new(rect.width(), rect.height()),
            state: DebrisState::Falling,
        });
        self.pieces.len() - 1
    }

    pub fn tick(&mut self) {
        let perlin = &self.perlin;
        for (id, piece) in self.pieces.iter_mut().enumerate() {
            if piece.is_landed() {
                continue;
            }
            piece.body.step();
            piece.rotation += piece.spin;
            if piece.body.pos.y >= piece.ground {
                piece.body.pos.y = piece.ground;
                piece.body.vel = Vec2::ZERO;
                piece.state = DebrisState::Landed(tear(perlin, id));
                trace!(id, x = piece.body.pos.x, y = piece.ground, "debris landed");
            }
        }
    }

    /// Landed pieces sit behind everything else.
    pub fn render_landed(&self, canvas: &mut Canvas) {
        for piece in self.pieces.iter().filter(|p| p.is_landed()) {
            draw_piece(canvas, piece);
        }
    }

    pub fn render_falling(&self, canvas: &mut Canvas) {
        for piece in self.pieces.iter().filter(|p| !p.is_landed()) {
            draw_piece(canvas, piece);
        }
    }
}

/// Ragged top edge sampled along a Perlin profile, plus a coin flip for the
/// clipped cut.
fn tear(perlin: &Perlin, id: DebrisId) -> Silhouette {
    let mut tear = [0.0; 8];
    let seed = id as f64 * 3.7;
    for (i, depth) in tear.iter_mut().enumerate() {
        let n = perlin.get([seed + i as f64 * 0.45, 0.5]) as f32;
        *depth = (n * 0.5).max(0.0);
    }
    Silhouette {
        clipped: fastrand::bool(),
        tear,
    }
}

/// Rasterizes the rotated rectangle of a piece by testing every pixel of its
/// bounding circle in the piece's local frame.
fn draw_piece(canvas: &mut Canvas, piece: &Debris) {
    let extent = piece.extent();
    if extent.x <= 0.0 || extent.y <= 0.0 {
        return;
    }
    let center = piece.body.pos;
    let (sin, cos) = (-piece.rotation.to_radians()).sin_cos();
    let reach = (extent.length() / 2.0).ceil() as i32 + 1;
    let cx = center.x.floor() as i32;
    let cy = center.y.floor() as i32;

    let mut drew = false;
    for dy in -reach..=reach {
        for dx in -reach..=reach {
            let d = Vec2::new(
                (cx + dx) as f32 + 0.5 - center.x,
                (cy + dy) as f32 + 0.5 - center.y,
            );
            let local = Vec2::new(d.x * cos - d.y * sin, d.x * sin + d.y * cos);
            let u = local.x / extent.x + 0.5;
            let v = local.y / extent.y + 0.5;
            if let Some(color) = piece_color(piece, u, v) {
                canvas.blend(cx + dx, cy + dy, color, 1.0);
                drew = true;
            }
        }
    }
    // Very small pieces can miss every pixel center.
    if !drew {
        if let Some(color) = piece_color(piece, 0.5, 0.5) {
            canvas.blend(cx, cy, color, 1.0);
        }
    }
}

fn piece_color(piece: &Debris, u: f32, v: f32) -> Option<Rgb> {
    match &piece.state {
        DebrisState::Landed(silhouette) => silhouette
            .contains(u, v)
            .then(|| scale_rgb(PAPER_RED, 0.9)),
        DebrisState::Falling => {
            if !(0.0..=1.0).contains(&u) || !(0.0..=1.0).contains(&v) {
                return None;
            }
            if v < 0.2 || v > 0.8 {
                return Some(BAND_GOLD);
            }
            // Horizontal gradient dark-light-dark, burnt bright while airborne.
            let t = 1.0 - (u - 0.5).abs() * 2.0;
            let base = (
                (CASING_DARK.0 as f32 + (CASING_LIGHT.0 as f32 - CASING_DARK.0 as f32) * t) as u8,
                (CASING_DARK.1 as f32 + (CASING_LIGHT.1 as f32 - CASING_DARK.1 as f32) * t) as u8,
                (CASING_DARK.2 as f32 + (CASING_LIGHT.2 as f32 - CASING_DARK.2 as f32) * t) as u8,
            );
            Some(scale_rgb(base, 1.5))
        }
    }
}
