use crate::canvas::{hsl, Canvas, Rgb};
use crate::physics::{random_in, Body};
use glam::Vec2;
use std::ops::Range;

/// Opacity lost by every particle each tick.
pub const OPACITY_DECAY: f32 = 0.015;
const TEXT_DECAY: f32 = 0.008;
const TEXT_GROWTH: f32 = 0.05;
const TEXT_START_SCALE: f32 = 0.1;
const TEXT_RISE: f32 = 0.5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParticleKind {
    Spark,
    Smoke,
}

#[derive(Clone, Debug)]
pub struct Particle {
    pub body: Body,
    pub hue: f32,
    pub opacity: f32,
    /// Nominal lifetime in ticks. Eviction follows opacity alone.
    pub life: f32,
    pub size: f32,
    pub kind: ParticleKind,
}

impl Particle {
    /// Advances one tick. Returns false once the particle should be evicted.
    fn tick(&mut self) -> bool {
        self.body.step();
        self.opacity -= OPACITY_DECAY;
        self.opacity > 0.0
    }

    fn color(&self) -> Rgb {
        let lightness = if self.size > 4.0 { 0.8 } else { 0.6 };
        hsl(self.hue, 1.0, lightness)
    }
}

/// Floating congratulation text.
#[derive(Clone, Debug)]
pub struct TextOverlay {
    pub pos: Vec2,
    pub text: String,
    pub color: Rgb,
    pub opacity: f32,
    pub vy: f32,
    pub scale: f32,
}

impl TextOverlay {
    fn tick(&mut self) -> bool {
        self.pos.y += self.vy;
        self.opacity -= TEXT_DECAY;
        if self.scale < 1.0 {
            self.scale = (self.scale + TEXT_GROWTH).min(1.0);
        }
        self.opacity > 0.0
    }

    /// The part of the text shown at the current scale, grown from the middle.
    pub fn visible_text(&self) -> String {
        let chars: Vec<char> = self.text.chars().collect();
        let shown = ((chars.len() as f32 * self.scale).ceil() as usize).clamp(1, chars.len().max(1));
        let start = (chars.len() - shown.min(chars.len())) / 2;
        chars.iter().skip(start).take(shown).collect()
    }
}

/// How a batch of sparks picks its hue.
#[derive(Clone, Copy, Debug)]
pub enum HuePick {
    /// `base` plus or minus `band`.
    Jitter { base: f32, band: f32 },
    /// `first` with probability `chance`, otherwise `second`.
    Either { first: f32, second: f32, chance: f32 },
}

impl HuePick {
    fn sample(self) -> f32 {
        match self {
            HuePick::Jitter { base, band } => base + random_in(-band..band),
            HuePick::Either { first, second, chance } => {
                if fastrand::f32() < chance {
                    first
                } else {
                    second
                }
            }
        }
    }
}

/// Parameters of a spark batch, in reference units.
#[derive(Clone, Debug)]
pub struct SparkBurst {
    pub hue: HuePick,
    pub count: usize,
    pub speed: Range<f32>,
    /// Lifetime in ticks.
    pub life: Range<f32>,
    pub gravity: f32,
    pub drag: f32,
    pub size: Range<f32>,
}

/// Owns every live spark, smoke puff and text overlay.
///
/// Magnitudes passed to the spawn functions are in reference units and are
/// multiplied by the current viewport scale when the entity is created.
pub struct ParticleSystem {
    particles: Vec<Particle>,
    texts: Vec<TextOverlay>,
    scale: f32,
}

impl ParticleSystem {
    pub fn new(scale: f32) -> Self {
        Self {
            particles: Vec::with_capacity(1024),
            texts: Vec::new(),
            scale,
        }
    }

    pub fn set_scale(&mut self, scale: f32) {
        self.scale = scale;
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn texts(&self) -> &[TextOverlay] {
        &self.texts
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty() && self.texts.is_empty()
    }

    pub fn spawn_spark(&mut self, origin: Vec2, burst: &SparkBurst) {
        let s = self.scale;
        self.particles.reserve(burst.count);
        for _ in 0..burst.count {
            let angle = fastrand::f32() * std::f32::consts::TAU;
            let speed = random_in(burst.speed.clone()) * s;
            self.particles.push(Particle {
                body: Body::new(
                    origin,
                    Vec2::new(angle.cos(), angle.sin()) * speed,
                    burst.gravity * s,
                    burst.drag,
                ),
                hue: burst.hue.sample(),
                opacity: 1.0,
                life: random_in(burst.life.clone()),
                size: random_in(burst.size.clone()),
                kind: ParticleKind::Spark,
            });
        }
    }

    /// Slow, translucent puffs that float upward.
    pub fn spawn_cloud(&mut self, origin: Vec2, count: usize, size: Range<f32>) {
        let s = self.scale;
        for _ in 0..count {
            let angle = fastrand::f32() * std::f32::consts::TAU;
            let speed = random_in(0.0..2.0) * s;
            self.particles.push(Particle {
                body: Body::new(
                    origin,
                    Vec2::new(angle.cos(), angle.sin()) * speed,
                    -0.05 * s,
                    0.9,
                ),
                hue: 0.0,
                opacity: 0.6,
                life: random_in(20.0..30.0),
                size: random_in(size.clone()),
                kind: ParticleKind::Smoke,
            });
        }
    }

    pub fn spawn_text(&mut self, origin: Vec2, text: &str, color: Rgb) {
        self.texts.push(TextOverlay {
            pos: origin,
            text: text.to_string(),
            color,
            opacity: 1.0,
            vy: -TEXT_RISE * self.scale,
            scale: TEXT_START_SCALE,
        });
    }

    pub fn tick(&mut self) {
        self.particles.retain_mut(Particle::tick);
        self.texts.retain_mut(TextOverlay::tick);
    }

    pub fn render(&self, canvas: &mut Canvas) {
        // Sizes are reference radii; shrink them with the surface.
        for p in &self.particles {
            canvas.fill_circle(p.body.pos, p.size * self.scale, p.color(), p.opacity);
        }

        for t in &self.texts {
            let text = t.visible_text();
            // Glow halo behind the glyphs, wider as the text grows.
            let half_w = t.text.chars().count() as f32 * t.scale + 1.0;
            let glow = t.opacity * 0.35;
            let y0 = (t.pos.y - 2.0).floor() as i32;
            let y1 = (t.pos.y + 2.0).ceil() as i32;
            let x0 = (t.pos.x - half_w * 2.0).floor() as i32;
            let x1 = (t.pos.x + half_w * 2.0).ceil() as i32;
            for y in y0..=y1 {
                for x in x0..=x1 {
                    let dx = (x as f32 + 0.5 - t.pos.x).abs() / (half_w * 2.0);
                    let dy = (y as f32 + 0.5 - t.pos.y).abs() / 2.5;
                    let falloff = 1.0 - (dx * dx + dy * dy).sqrt();
                    if falloff > 0.0 {
                        canvas.add(x, y, t.color, glow * falloff);
                    }
                }
            }
            canvas.put_text(t.pos, &text, t.color, t.opacity);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn burst(count: usize) -> SparkBurst {
        SparkBurst {
            hue: HuePick::Jitter { base: 200.0, band: 20.0 },
            count,
            speed: 2.0..8.0,
            life: 100.0..150.0,
            gravity: 0.1,
            drag: 0.96,
            size: 1.0..3.0,
        }
    }

    #[test]
    fn test_spawn_spark_counts_and_ranges() {
        let mut system = ParticleSystem::new(1.0);
        let origin = Vec2::new(50.0, 60.0);
        system.spawn_spark(origin, &burst(40));

        assert_eq!(system.particles().len(), 40);
        for p in system.particles() {
            assert_eq!(p.body.pos, origin);
            assert_eq!(p.kind, ParticleKind::Spark);
            assert_eq!(p.opacity, 1.0);
            assert!((180.0..=220.0).contains(&p.hue));
            let speed = p.body.vel.length();
            assert!(speed >= 1.99 && speed <= 8.01);
        }
    }

    #[test]
    fn test_spawn_applies_scale() {
        let mut system = ParticleSystem::new(0.5);
        system.spawn_spark(Vec2::ZERO, &burst(20));
        for p in system.particles() {
            assert!(p.body.vel.length() <= 4.01);
            assert_eq!(p.body.gravity, 0.05);
        }
    }

    #[test]
    fn test_cloud_floats() {
        let mut system = ParticleSystem::new(1.0);
        system.spawn_cloud(Vec2::ZERO, 5, 4.0..12.0);
        assert_eq!(system.particles().len(), 5);
        for p in system.particles() {
            assert_eq!(p.kind, ParticleKind::Smoke);
            assert!(p.body.gravity < 0.0);
            assert!(p.opacity < 1.0);
            assert!(p.size >= 4.0);
        }
    }

    #[test]
    fn test_opacity_never_increases_and_dead_particles_are_evicted() {
        let mut system = ParticleSystem::new(1.0);
        system.spawn_spark(Vec2::new(10.0, 10.0), &burst(50));
        system.spawn_cloud(Vec2::new(10.0, 10.0), 5, 4.0..12.0);

        // Tag every particle through its hue so ticks can be paired up.
        for (i, p) in system.particles.iter_mut().enumerate() {
            p.hue = i as f32;
        }

        let mut ticks = 0;
        while !system.particles().is_empty() {
            let before: Vec<(f32, f32)> =
                system.particles().iter().map(|p| (p.hue, p.opacity)).collect();
            system.tick();
            for p in system.particles() {
                assert!(p.opacity > 0.0);
                let (_, previous) = before
                    .iter()
                    .find(|(hue, _)| *hue == p.hue)
                    .copied()
                    .unwrap();
                assert!(p.opacity < previous);
            }
            for (hue, previous) in &before {
                let survived = system.particles().iter().any(|p| p.hue == *hue);
                assert_eq!(survived, previous - OPACITY_DECAY > 0.0);
            }
            ticks += 1;
            assert!(ticks < 200, "particles never expired");
        }
        // 1.0 / 0.015 rounds up to 67 ticks.
        assert!(ticks <= 67);
    }

    #[test]
    fn test_compaction_keeps_interleaved_survivors() {
        let mut system = ParticleSystem::new(1.0);
        system.spawn_spark(Vec2::ZERO, &burst(6));
        for (i, p) in system.particles.iter_mut().enumerate() {
            p.opacity = if i % 2 == 0 { 0.01 } else { 1.0 };
        }
        system.tick();
        assert_eq!(system.particles().len(), 3);
    }

    #[test]
    fn test_text_grows_then_fades() {
        let mut system = ParticleSystem::new(1.0);
        system.spawn_text(Vec2::new(40.0, 40.0), "马到成功", (255, 200, 200));
        assert_eq!(system.texts()[0].scale, 0.1);

        for _ in 0..20 {
            system.tick();
        }
        let text = &system.texts()[0];
        assert_eq!(text.scale, 1.0);
        assert!(text.pos.y < 40.0);
        assert_eq!(text.visible_text(), "马到成功");

        let mut ticks = 20;
        while !system.texts().is_empty() {
            system.tick();
            ticks += 1;
        }
        // 1.0 / 0.008 = 125, give or take float drift.
        assert!((124..=126).contains(&ticks));
    }

    #[test]
    fn test_visible_text_grows_from_middle() {
        let overlay = TextOverlay {
            pos: Vec2::ZERO,
            text: "一二三四".to_string(),
            color: (0, 0, 0),
            opacity: 1.0,
            vy: 0.0,
            scale: 0.5,
        };
        assert_eq!(overlay.visible_text(), "二三");
    }

    #[test]
    fn test_render_draws_particles() {
        let mut system = ParticleSystem::new(1.0);
        system.spawn_spark(Vec2::new(5.5, 5.5), &burst(3));
        let mut canvas = Canvas::new(12, 12, (0, 0, 0));
        system.render(&mut canvas);
        assert_ne!(canvas.pixel(5, 5), (0, 0, 0));
    }
}
