//! The whole festive scene: sky shells, sparks, two firecracker chains, their
//! debris and the match used to light them.

use crate::canvas::Canvas;
use crate::config::Config;
use crate::debris::DebrisField;
use crate::explosion::Pyrotechnics;
use crate::firecracker::{FirecrackerChain, Side};
use crate::launcher::{AutoLaunch, LaunchScheduler};
use crate::particles::ParticleSystem;
use crate::physics::Viewport;
use crate::trigger::{IgnitionTrigger, PointerEvent};
use crossterm::event::{Event, KeyCode, MouseButton, MouseEvent, MouseEventKind};
use glam::Vec2;
use std::io::{self, Write};
use tracing::{debug, info};

const LEFT_LABEL: &str = "福";
const RIGHT_LABEL: &str = "春";

pub struct Scene {
    viewport: Viewport,
    canvas: Canvas,
    particles: ParticleSystem,
    launcher: LaunchScheduler,
    auto: Option<AutoLaunch>,
    chains: Vec<FirecrackerChain>,
    debris: DebrisField,
    trigger: IgnitionTrigger,
}

fn viewport_for(cols: usize, rows: usize) -> Viewport {
    Viewport::new(cols as f32, (rows * 2) as f32)
}

impl Scene {
    /// `cols` x `rows` terminal cells, two pixels per row.
    pub fn new(cols: usize, rows: usize, config: &Config) -> Self {
        let viewport = viewport_for(cols, rows);
        info!(width = viewport.width, height = viewport.height, "scene created");
        Self {
            viewport,
            canvas: Canvas::new(cols, rows * 2, config.background),
            particles: ParticleSystem::new(viewport.scale()),
            launcher: LaunchScheduler::new(viewport),
            auto: config
                .auto_launch
                .then(|| AutoLaunch::new(config.auto_interval, config.auto_chance)),
            chains: vec![
                FirecrackerChain::new(Side::Left, LEFT_LABEL, config.crackers, viewport),
                FirecrackerChain::new(Side::Right, RIGHT_LABEL, config.crackers, viewport),
            ],
            debris: DebrisField::new(viewport),
            trigger: IgnitionTrigger::new(viewport),
        }
    }

    /// Follows the terminal to its new size. Nothing in flight is dropped.
    pub fn resize(&mut self, cols: usize, rows: usize) {
        let viewport = viewport_for(cols, rows);
        debug!(width = viewport.width, height = viewport.height, "resize");
        self.viewport = viewport;
        self.canvas.resize(cols, rows * 2);
        self.particles.set_scale(viewport.scale());
        self.launcher.resize(viewport);
        for chain in &mut self.chains {
            chain.resize(viewport);
        }
        self.debris.resize(viewport);
        self.trigger.resize(viewport);
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn particles(&self) -> &ParticleSystem {
        &self.particles
    }

    pub fn launcher(&self) -> &LaunchScheduler {
        &self.launcher
    }

    pub fn chains(&self) -> &[FirecrackerChain] {
        &self.chains
    }

    pub fn debris(&self) -> &DebrisField {
        &self.debris
    }

    pub fn trigger(&self) -> &IgnitionTrigger {
        &self.trigger
    }

    pub fn launch(&mut self, user_triggered: bool) {
        self.launcher.launch(user_triggered);
    }

    pub fn create_bang(&mut self, x: f32, y: f32) {
        debug!(x, y, "bang requested");
        self.particles.bang(Vec2::new(x, y));
    }

    /// Lights the chain hanging on `side`. False if it was already going.
    pub fn ignite(&mut self, side: Side) -> bool {
        self.chains
            .iter_mut()
            .find(|chain| chain.side() == side)
            .is_some_and(|chain| chain.ignite())
    }

    /// One fixed simulation step of `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        if let Some(auto) = &mut self.auto {
            if auto.due(dt) {
                self.launcher.launch(false);
            }
        }

        self.launcher.tick(&mut self.particles);
        self.particles.tick();
        for chain in &mut self.chains {
            chain.update(dt, &mut self.particles, &mut self.debris);
        }
        self.debris.tick();
    }

    pub fn render<W: Write>(&mut self, out: &mut W) -> io::Result<()> {
        self.canvas.clear();

        self.debris.render_landed(&mut self.canvas);
        for chain in &self.chains {
            chain.render(&mut self.canvas);
        }
        self.launcher.render(&mut self.canvas);
        self.particles.render(&mut self.canvas);
        self.debris.render_falling(&mut self.canvas);
        self.trigger.render(&mut self.canvas);

        self.canvas.present(out)
    }

    pub fn handle_event(&mut self, event: &Event) {
        match event {
            Event::Mouse(MouseEvent { kind, column, row, .. }) => {
                let point = Vec2::new(*column as f32 + 0.5, *row as f32 * 2.0 + 1.0);
                let pointer = match kind {
                    MouseEventKind::Down(MouseButton::Left) => PointerEvent::Press(point),
                    MouseEventKind::Drag(MouseButton::Left) => PointerEvent::Move(point),
                    MouseEventKind::Up(MouseButton::Left) => PointerEvent::Release,
                    _ => return,
                };
                self.trigger.handle(pointer, &mut self.chains);
            }
            Event::Key(key) => match key.code {
                KeyCode::Char('f') | KeyCode::Char(' ') => self.launch(true),
                KeyCode::Char('d') => {
                    self.launch(true);
                    self.launch(true);
                }
                KeyCode::Char('b') => {
                    let center = self.viewport.center();
                    self.create_bang(center.x, center.y);
                }
                KeyCode::Char('l') => {
                    self.ignite(Side::Left);
                }
                KeyCode::Char('r') => {
                    self.ignite(Side::Right);
                }
                _ => {}
            },
            _ => {}
        }
    }
}
