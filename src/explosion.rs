use crate::canvas::hsl;
use crate::particles::{HuePick, ParticleSystem, SparkBurst};
use glam::Vec2;
use tracing::trace;

/// Festive phrases shown over user-launched bursts.
pub const IDIOMS: [&str; 10] = [
    "马到成功", "一马当先", "龙马精神", "万马奔腾", "立马发财",
    "天马行空", "马上暴富", "马上脱单", "金马玉堂", "马年大吉",
];

pub const AERIAL_SPARKS: usize = 120;
pub const BANG_SPARKS: usize = 15;
pub const BANG_SMOKE: usize = 5;
pub const GOLD_HUE: f32 = 45.0;
pub const RED_HUE: f32 = 0.0;

/// Anything that can turn a point into a burst of light.
pub trait Pyrotechnics {
    /// Full aerial burst around `hue`, optionally crowned with an idiom.
    fn explode(&mut self, origin: Vec2, hue: f32, spawn_text: bool);
    /// Short ground-level firecracker pop. Never spawns text.
    fn bang(&mut self, origin: Vec2);
}

fn aerial_burst(hue: f32) -> SparkBurst {
    SparkBurst {
        hue: HuePick::Jitter { base: hue, band: 20.0 },
        count: AERIAL_SPARKS,
        speed: 2.0..8.0,
        life: 100.0..150.0,
        gravity: 0.1,
        drag: 0.96,
        size: 1.0..3.0,
    }
}

fn cracker_burst() -> SparkBurst {
    SparkBurst {
        hue: HuePick::Either { first: GOLD_HUE, second: RED_HUE, chance: 0.4 },
        count: BANG_SPARKS,
        speed: 3.0..8.0,
        life: 30.0..50.0,
        gravity: 0.2,
        drag: 0.9,
        size: 1.0..3.0,
    }
}

pub fn random_idiom() -> &'static str {
    IDIOMS[fastrand::usize(0..IDIOMS.len())]
}

impl Pyrotechnics for ParticleSystem {
    fn explode(&mut self, origin: Vec2, hue: f32, spawn_text: bool) {
        self.spawn_spark(origin, &aerial_burst(hue));
        if spawn_text {
            self.spawn_text(origin, random_idiom(), hsl(hue, 1.0, 0.85));
        }
        trace!(x = origin.x, y = origin.y, hue, spawn_text, "explode");
    }

    fn bang(&mut self, origin: Vec2) {
        self.spawn_spark(origin, &cracker_burst());
        self.spawn_cloud(origin, BANG_SMOKE, 4.0..12.0);
        trace!(x = origin.x, y = origin.y, "bang");
    }
}
