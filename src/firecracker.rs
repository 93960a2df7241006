//! A string of firecrackers hanging under a label plaque.
//!
//! Once lit, the chain pops its segments one after another from the fuse end
//! upward. Each pop calls [`Pyrotechnics::bang`] at the segment's center and
//! throws the casing into the [`DebrisField`]. Afterwards the connecting fuse
//! burns back, the empty string fades out, and the chain reappears whole,
//! ready to be lit again.

use crate::canvas::Canvas;
use crate::debris::DebrisField;
use crate::explosion::Pyrotechnics;
use crate::physics::{Rect, Viewport};
use crate::trigger::FuseTarget;
use glam::Vec2;
use tracing::debug;

/// Seconds the tail fuse glows before the first pop.
pub const FUSE_DELAY: f32 = 0.2;
/// Seconds between pops.
pub const POP_INTERVAL: f32 = 0.12;
pub const RETRACT_SECS: f32 = 1.0;
pub const FADE_SECS: f32 = 1.0;
/// Tilt of each segment, alternating sides.
pub const LEAN_DEGREES: f32 = 12.0;

// Reference geometry, scaled to the viewport at query time.
const PLAQUE: f32 = 48.0;
const TOP: f32 = 15.0;
const EDGE_INSET: f32 = 0.03;
const SEGMENT_W: f32 = 18.0;
const SEGMENT_H: f32 = 36.0;
const SEGMENT_GAP: f32 = 4.0;
const LEAN_SHIFT: f32 = 10.0;
const TAIL: f32 = 40.0;
const HIT_ZONE: f32 = 40.0;

const GOLD: (u8, u8, u8) = (241, 196, 15);
const PAPER: (u8, u8, u8) = (200, 30, 30);
const INK: (u8, u8, u8) = (90, 0, 0);
const FUSE_BROWN: (u8, u8, u8) = (109, 76, 65);
const FUSE_GRAY: (u8, u8, u8) = (136, 136, 136);
const FUSE_LIT: (u8, u8, u8) = (255, 69, 0);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChainPhase {
    Idle,
    Igniting,
    Retracting,
    Fading,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    pub visible: bool,
    /// Degrees; negative leans left.
    pub lean: f32,
}

pub struct FirecrackerChain {
    side: Side,
    label: String,
    segments: Vec<Segment>,
    phase: ChainPhase,
    /// Seconds until the next phase step.
    countdown: f32,
    detonated: usize,
    fuse_lit: f32,
    /// Visible fraction of the connecting fuse.
    fuse_length: f32,
    fuse_from: f32,
    opacity: f32,
    viewport: Viewport,
}

fn px(reference: f32, scale: f32, min: f32) -> f32 {
    (reference * scale).max(min)
}

impl FirecrackerChain {
    pub fn new(side: Side, label: &str, count: usize, viewport: Viewport) -> Self {
        let segments = (0..count)
            .map(|i| Segment {
                visible: true,
                lean: if i % 2 == 0 { -LEAN_DEGREES } else { LEAN_DEGREES },
            })
            .collect();
        Self {
            side,
            label: label.to_string(),
            segments,
            phase: ChainPhase::Idle,
            countdown: 0.0,
            detonated: 0,
            fuse_lit: 0.0,
            fuse_length: 1.0,
            fuse_from: 1.0,
            opacity: 1.0,
            viewport,
        }
    }

    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn phase(&self) -> ChainPhase {
        self.phase
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn fuse_length(&self) -> f32 {
        self.fuse_length
    }

    pub fn is_fuse_lit(&self) -> bool {
        self.fuse_lit > 0.0
    }

    fn scale(&self) -> f32 {
        self.viewport.scale()
    }

    fn plaque_size(&self) -> f32 {
        px(PLAQUE, self.scale(), 4.0)
    }

    fn anchor_x(&self) -> f32 {
        let half = self.plaque_size() / 2.0;
        match self.side {
            Side::Left => self.viewport.width * EDGE_INSET + half,
            Side::Right => self.viewport.width * (1.0 - EDGE_INSET) - half,
        }
    }

    fn plaque_top(&self) -> f32 {
        px(TOP, self.scale(), 1.0)
    }

    fn column_top(&self) -> f32 {
        self.plaque_top() + self.plaque_size()
    }

    fn pitch(&self) -> f32 {
        px(SEGMENT_H, self.scale(), 3.0) + SEGMENT_GAP * self.scale()
    }

    fn column_bottom(&self) -> f32 {
        self.column_top() + self.segments.len() as f32 * self.pitch()
    }

    fn tail_bottom(&self) -> f32 {
        self.column_bottom() + px(TAIL, self.scale(), 3.0)
    }

    /// Screen rectangle of segment `index`, including its sideways lean.
    pub fn segment_rect(&self, index: usize) -> Option<Rect> {
        if self.viewport.is_empty() || index >= self.segments.len() {
            return None;
        }
        let s = self.scale();
        let shift = px(LEAN_SHIFT, s, 1.0) * self.segments[index].lean.signum();
        let h = px(SEGMENT_H, s, 3.0);
        let center = Vec2::new(
            self.anchor_x() + shift,
            self.column_top() + index as f32 * self.pitch() + self.pitch() / 2.0,
        );
        Some(Rect::from_center(center, Vec2::new(px(SEGMENT_W, s, 2.0), h)))
    }

    /// Starts the pop sequence. Does nothing unless the chain is idle.
    pub fn ignite(&mut self) -> bool {
        if self.phase != ChainPhase::Idle {
            return false;
        }
        self.phase = ChainPhase::Igniting;
        self.fuse_lit = FUSE_DELAY;
        self.countdown = FUSE_DELAY;
        self.detonated = 0;
        debug!(side = ?self.side, "chain igniting");
        true
    }

    pub fn update<P: Pyrotechnics>(&mut self, dt: f32, fx: &mut P, debris: &mut DebrisField) {
        self.fuse_lit = (self.fuse_lit - dt).max(0.0);
        if self.phase == ChainPhase::Idle {
            return;
        }

        self.countdown -= dt;
        while self.countdown <= 0.0 && self.phase != ChainPhase::Idle {
            self.step(fx, debris);
        }

        match self.phase {
            ChainPhase::Retracting => {
                self.fuse_length = self.fuse_from * (self.countdown / RETRACT_SECS).clamp(0.0, 1.0);
            }
            ChainPhase::Fading => {
                self.opacity = (self.countdown / FADE_SECS).clamp(0.0, 1.0);
            }
            _ => {}
        }
    }

    fn step<P: Pyrotechnics>(&mut self, fx: &mut P, debris: &mut DebrisField) {
        match self.phase {
            ChainPhase::Igniting if self.detonated < self.segments.len() => {
                self.detonate(fx, debris);
                self.countdown += POP_INTERVAL;
            }
            ChainPhase::Igniting => {
                self.phase = ChainPhase::Retracting;
                self.fuse_from = self.fuse_length;
                self.countdown += RETRACT_SECS;
                debug!(side = ?self.side, "chain retracting");
            }
            ChainPhase::Retracting => {
                self.fuse_length = 0.0;
                self.phase = ChainPhase::Fading;
                self.countdown += FADE_SECS;
                debug!(side = ?self.side, "chain fading");
            }
            ChainPhase::Fading => self.reset(),
            ChainPhase::Idle => {}
        }
    }

    fn detonate<P: Pyrotechnics>(&mut self, fx: &mut P, debris: &mut DebrisField) {
        let total = self.segments.len();
        let index = total - 1 - self.detonated;
        self.segments[index].visible = false;

        if let Some(rect) = self.segment_rect(index) {
            fx.bang(rect.center());
            debris.spawn(rect, self.segments[index].lean);
        }

        self.fuse_length = 1.0 - self.detonated as f32 / total as f32;
        self.detonated += 1;
        debug!(side = ?self.side, index, "segment popped");
    }

    fn reset(&mut self) {
        for segment in &mut self.segments {
            segment.visible = true;
        }
        self.phase = ChainPhase::Idle;
        self.countdown = 0.0;
        self.detonated = 0;
        self.fuse_length = 1.0;
        self.fuse_from = 1.0;
        self.opacity = 1.0;
        debug!(side = ?self.side, "chain reset");
    }

    pub fn render(&self, canvas: &mut Canvas) {
        if self.viewport.is_empty() || self.opacity <= 0.0 {
            return;
        }
        let alpha = self.opacity;
        let ax = self.anchor_x();
        let plaque = self.plaque_size();
        let top = self.plaque_top();

        // Hanger and plaque
        canvas.fill_rect(ax - 0.5, top - 2.0, ax + 0.5, top, (34, 34, 34), alpha);
        canvas.fill_rect(ax - plaque / 2.0, top, ax + plaque / 2.0, top + plaque, GOLD, alpha);
        canvas.put_text(Vec2::new(ax, top + plaque / 2.0), &self.label, INK, alpha);

        let column_top = self.column_top();
        let fuse_end = column_top + (self.column_bottom() - column_top) * self.fuse_length;
        if self.fuse_length > 0.0 {
            canvas.fill_rect(ax - 0.5, column_top, ax + 0.5, fuse_end, FUSE_BROWN, alpha);
        }

        for (i, segment) in self.segments.iter().enumerate() {
            if !segment.visible {
                continue;
            }
            let Some(rect) = self.segment_rect(i) else {
                continue;
            };
            canvas.fill_rect(rect.left, rect.top, rect.right, rect.bottom, PAPER, alpha);
            canvas.fill_rect(rect.left, rect.top, rect.right, rect.top + 1.0, GOLD, alpha * 0.9);
            canvas.fill_rect(rect.left, rect.bottom - 1.0, rect.right, rect.bottom, GOLD, alpha * 0.9);
        }

        let tail_top = self.column_bottom();
        let tail_bottom = self.tail_bottom();
        if self.fuse_lit > 0.0 {
            let glow = self.fuse_lit / FUSE_DELAY;
            canvas.fill_rect(ax - 0.5, tail_top, ax + 0.5, tail_bottom, FUSE_LIT, glow);
            let (x, y) = (ax.floor() as i32, tail_bottom.floor() as i32);
            for dy in -2..=0 {
                for dx in -1..=1 {
                    canvas.add(x + dx, y + dy, FUSE_LIT, glow * 0.5);
                }
            }
        } else if self.phase == ChainPhase::Idle {
            canvas.fill_rect(ax - 0.5, tail_top, ax + 0.5, tail_bottom, FUSE_GRAY, alpha);
        }
    }
}

impl FuseTarget for FirecrackerChain {
    /// The square at the bottom of the tail fuse, present only while idle.
    fn fuse_rect(&self) -> Option<Rect> {
        if self.phase != ChainPhase::Idle || self.viewport.is_empty() {
            return None;
        }
        let size = px(HIT_ZONE, self.scale(), 4.0);
        let bottom = self.tail_bottom();
        Some(Rect::from_center(
            Vec2::new(self.anchor_x(), bottom - size / 2.0),
            Vec2::splat(size),
        ))
    }

    fn ignite(&mut self) -> bool {
        FirecrackerChain::ignite(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::explosion::testing::Recorder;
    use crate::trigger::{IgnitionTrigger, PointerEvent};

    const DT: f32 = 1.0 / 60.0;

    fn viewport() -> Viewport {
        Viewport::new(800.0, 900.0)
    }

    fn chain() -> FirecrackerChain {
        FirecrackerChain::new(Side::Left, "福", 8, viewport())
    }

    /// Steps until the chain is idle again, recording when each bang fired.
    fn run_cycle(
        chain: &mut FirecrackerChain,
        fx: &mut Recorder,
        debris: &mut DebrisField,
    ) -> Vec<f32> {
        let mut times = Vec::new();
        let mut clock = 0.0;
        let mut phases = vec![chain.phase()];
        while clock < 10.0 {
            let before = fx.bangs.len();
            chain.update(DT, fx, debris);
            clock += DT;
            for _ in before..fx.bangs.len() {
                times.push(clock);
            }
            if phases.last() != Some(&chain.phase()) {
                phases.push(chain.phase());
            }
            if chain.phase() == ChainPhase::Idle {
                break;
            }
        }
        assert_eq!(
            phases,
            vec![
                ChainPhase::Igniting,
                ChainPhase::Retracting,
                ChainPhase::Fading,
                ChainPhase::Idle
            ]
        );
        times
    }

    #[test]
    fn test_segments_alternate_lean() {
        let chain = chain();
        let leans: Vec<f32> = chain.segments().iter().map(|s| s.lean).collect();
        assert_eq!(leans[0], -LEAN_DEGREES);
        assert_eq!(leans[1], LEAN_DEGREES);
        assert_eq!(leans[6], -LEAN_DEGREES);
        assert_eq!(leans[7], LEAN_DEGREES);
        assert!(chain.segment_rect(0).unwrap().center().x < chain.segment_rect(1).unwrap().center().x);
    }

    #[test]
    fn test_full_cycle_pops_every_segment_bottom_up() {
        let mut chain = chain();
        let mut fx = Recorder::default();
        let mut debris = DebrisField::new(viewport());

        assert!(chain.ignite());
        let times = run_cycle(&mut chain, &mut fx, &mut debris);

        assert_eq!(fx.bangs.len(), 8);
        assert_eq!(debris.len(), 8);
        assert!(fx.explosions.is_empty());

        // Index 7 hangs lowest, so the bangs climb the screen.
        let expected: Vec<Vec2> = (0..8)
            .rev()
            .map(|i| chain.segment_rect(i).unwrap().center())
            .collect();
        assert_eq!(fx.bangs, expected);

        assert!((times[0] - FUSE_DELAY).abs() < 2.0 * DT);
        for pair in times.windows(2) {
            assert!((pair[1] - pair[0] - POP_INTERVAL).abs() < 2.0 * DT);
        }

        // Debris inherit the lean of their slot: 7 is odd, 0 is even.
        assert_eq!(debris.get(0).unwrap().rotation, LEAN_DEGREES);
        assert_eq!(debris.get(7).unwrap().rotation, -LEAN_DEGREES);
    }

    #[test]
    fn test_double_ignite_runs_one_sequence() {
        let mut chain = chain();
        let mut fx = Recorder::default();
        let mut debris = DebrisField::new(viewport());

        assert!(chain.ignite());
        assert!(!chain.ignite());
        chain.update(0.5, &mut fx, &mut debris);
        assert!(!chain.ignite());
        run_cycle_remaining(&mut chain, &mut fx, &mut debris);

        assert_eq!(fx.bangs.len(), 8);
        assert_eq!(debris.len(), 8);
    }

    fn run_cycle_remaining(chain: &mut FirecrackerChain, fx: &mut Recorder, debris: &mut DebrisField) {
        for _ in 0..1000 {
            chain.update(DT, fx, debris);
            if chain.phase() == ChainPhase::Idle {
                return;
            }
        }
        panic!("chain never returned to idle");
    }

    #[test]
    fn test_chain_restores_after_cycle() {
        let mut chain = chain();
        let mut fx = Recorder::default();
        let mut debris = DebrisField::new(viewport());

        chain.ignite();
        chain.update(FUSE_DELAY + POP_INTERVAL * 3.5, &mut fx, &mut debris);
        assert_eq!(fx.bangs.len(), 4);
        let visible: Vec<bool> = chain.segments().iter().map(|s| s.visible).collect();
        assert_eq!(visible, vec![true, true, true, true, false, false, false, false]);
        assert!(chain.fuse_length() < 1.0);

        run_cycle_remaining(&mut chain, &mut fx, &mut debris);
        assert!(chain.segments().iter().all(|s| s.visible));
        assert_eq!(chain.opacity(), 1.0);
        assert_eq!(chain.fuse_length(), 1.0);

        // Ready for another round.
        assert!(chain.ignite());
        run_cycle_remaining(&mut chain, &mut fx, &mut debris);
        assert_eq!(fx.bangs.len(), 16);
        assert_eq!(debris.len(), 16);
    }

    #[test]
    fn test_retract_then_fade() {
        let mut chain = chain();
        let mut fx = Recorder::default();
        let mut debris = DebrisField::new(viewport());

        chain.ignite();
        let popping = FUSE_DELAY + POP_INTERVAL * 8.0;
        chain.update(popping + RETRACT_SECS / 2.0, &mut fx, &mut debris);
        assert_eq!(chain.phase(), ChainPhase::Retracting);
        assert!(chain.fuse_length() > 0.0 && chain.fuse_length() < 1.0 / 8.0);
        assert_eq!(chain.opacity(), 1.0);

        chain.update(RETRACT_SECS / 2.0 + FADE_SECS / 2.0, &mut fx, &mut debris);
        assert_eq!(chain.phase(), ChainPhase::Fading);
        assert_eq!(chain.fuse_length(), 0.0);
        assert!(chain.opacity() > 0.0 && chain.opacity() < 1.0);
    }

    #[test]
    fn test_fuse_lights_briefly() {
        let mut chain = chain();
        let mut fx = Recorder::default();
        let mut debris = DebrisField::new(viewport());

        assert!(!chain.is_fuse_lit());
        chain.ignite();
        assert!(chain.is_fuse_lit());
        chain.update(FUSE_DELAY + DT, &mut fx, &mut debris);
        assert!(!chain.is_fuse_lit());
    }

    #[test]
    fn test_fuse_rect_only_while_idle() {
        let mut chain = chain();
        let rect = chain.fuse_rect().unwrap();
        assert!(rect.bottom > chain.segment_rect(7).unwrap().bottom);

        chain.ignite();
        assert!(chain.fuse_rect().is_none());

        let unmeasured = FirecrackerChain::new(Side::Right, "春", 8, Viewport::new(0.0, 0.0));
        assert!(unmeasured.fuse_rect().is_none());
    }

    #[test]
    fn test_right_chain_hangs_on_right() {
        let left = chain();
        let right = FirecrackerChain::new(Side::Right, "春", 8, viewport());
        assert!(left.fuse_rect().unwrap().center().x < 400.0);
        assert!(right.fuse_rect().unwrap().center().x > 400.0);
    }

    #[test]
    fn test_dragging_match_over_fuse_lights_chain_once() {
        let mut chains = vec![chain()];
        let mut trigger = IgnitionTrigger::new(viewport());
        let fuse = chains[0].fuse_rect().unwrap().center();

        trigger.handle(PointerEvent::Press(trigger.position()), &mut chains);
        let mut lit = 0;
        for _ in 0..5 {
            lit += trigger.handle(PointerEvent::Move(fuse), &mut chains);
        }
        assert_eq!(lit, 1);
        assert_eq!(chains[0].phase(), ChainPhase::Igniting);
    }

    #[test]
    fn test_render_hides_popped_segments() {
        let mut chain = chain();
        let mut fx = Recorder::default();
        let mut debris = DebrisField::new(viewport());
        let bottom = chain.segment_rect(7).unwrap().center();
        let (x, y) = (bottom.x as usize, bottom.y as usize);

        let mut canvas = Canvas::new(800, 900, (0, 0, 0));
        chain.render(&mut canvas);
        assert_ne!(canvas.pixel(x, y), (0, 0, 0));

        chain.ignite();
        chain.update(FUSE_DELAY + DT, &mut fx, &mut debris);
        canvas.clear();
        chain.render(&mut canvas);
        assert_eq!(canvas.pixel(x, y), (0, 0, 0));
    }
}
