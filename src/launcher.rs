use crate::canvas::{hsl, Canvas};
use crate::explosion::Pyrotechnics;
use crate::physics::{random_in, Viewport};
use glam::Vec2;
use tracing::debug;

const LAUNCH_SPEED: f32 = 18.0;
const MIN_SPEED: f32 = 2.0;
const SPEED_DECAY: f32 = 0.98;
const APEX_JITTER: f32 = 150.0;
const SHELL_RADIUS: f32 = 3.0;

/// A rising shell waiting to burst.
#[derive(Clone, Debug)]
pub struct Projectile {
    pub pos: Vec2,
    /// Screen y at which the shell bursts.
    pub apex: f32,
    pub speed: f32,
    pub hue: f32,
    pub user_triggered: bool,
    min_speed: f32,
}

impl Projectile {
    fn rise(&mut self) {
        self.pos.y -= self.speed;
        self.speed *= SPEED_DECAY;
    }

    pub fn at_apex(&self) -> bool {
        self.pos.y <= self.apex || self.speed < self.min_speed
    }
}

pub struct LaunchScheduler {
    projectiles: Vec<Projectile>,
    viewport: Viewport,
}

impl LaunchScheduler {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            projectiles: Vec::new(),
            viewport,
        }
    }

    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    /// Sends a shell up from the bottom edge. Ignored while the surface has
    /// no size.
    pub fn launch(&mut self, user_triggered: bool) {
        if self.viewport.is_empty() {
            return;
        }
        let Viewport { width, height } = self.viewport;
        let scale = self.viewport.scale();

        let projectile = Projectile {
            pos: Vec2::new(random_in(width * 0.1..width * 0.9), height),
            apex: height * 0.15 + fastrand::f32() * APEX_JITTER * scale,
            speed: LAUNCH_SPEED * scale,
            hue: fastrand::f32() * 360.0,
            user_triggered,
            min_speed: MIN_SPEED * scale,
        };
        debug!(
            x = projectile.pos.x,
            apex = projectile.apex,
            user_triggered,
            "launch"
        );
        self.projectiles.push(projectile);
    }

    /// Moves every shell up one tick and bursts the ones that topped out.
    /// Returns how many burst.
    pub fn tick<P: Pyrotechnics>(&mut self, fx: &mut P) -> usize {
        let mut burst = 0;
        self.projectiles.retain_mut(|p| {
            p.rise();
            if p.at_apex() {
                fx.explode(p.pos, p.hue, p.user_triggered);
                burst += 1;
                false
            } else {
                true
            }
        });
        burst
    }

    pub fn render(&self, canvas: &mut Canvas) {
        let radius = SHELL_RADIUS * self.viewport.scale();
        for p in &self.projectiles {
            canvas.fill_circle(p.pos, radius, hsl(p.hue, 1.0, 0.7), 1.0);
            // Short fading tail below the shell.
            for i in 1..4 {
                let tail = p.pos + Vec2::new(0.0, i as f32);
                canvas.fill_circle(tail, 0.0, hsl(p.hue, 1.0, 0.6), 0.6 - i as f32 * 0.15);
            }
        }
    }
}

/// Ambient cadence: every `interval` seconds, launch with probability
/// `chance`.
#[derive(Clone, Debug)]
pub struct AutoLaunch {
    interval: f32,
    chance: f32,
    elapsed: f32,
}

impl AutoLaunch {
    pub fn new(interval: f32, chance: f32) -> Self {
        Self {
            interval,
            chance,
            elapsed: 0.0,
        }
    }

    /// Advances the timer; true when this roll should launch.
    pub fn due(&mut self, dt: f32) -> bool {
        self.elapsed += dt;
        let mut launch = false;
        while self.elapsed >= self.interval {
            self.elapsed -= self.interval;
            launch |= fastrand::f32() < self.chance;
        }
        launch
    }
}
