use macroquad::prelude::*;

use crate::collision::ResolveOptions;
use crate::config::BossConfig;
use crate::entity::{Body, Entity, EntityContext, EntityKind, TEAM_HOSTILE};
use crate::helpers::{angle_dir, angle_to, tick_down};
use crate::weapon::Volley;

// Slack on the phase clock so float accumulation over whole phases still
// lands on the boundary tick.
const PHASE_TOLERANCE_SECS: f32 = 1e-3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BossPhase {
    Burst,
    Rapid,
    Volley,
}

impl BossPhase {
    pub fn index(self) -> u8 {
        match self {
            Self::Burst => 0,
            Self::Rapid => 1,
            Self::Volley => 2,
        }
    }

    pub fn next(self) -> Self {
        match self {
            Self::Burst => Self::Rapid,
            Self::Rapid => Self::Volley,
            Self::Volley => Self::Burst,
        }
    }
}

pub struct Boss {
    body: Body,
    config: BossConfig,
    phase: BossPhase,
    phase_timer: f32,
    burst_timer_ms: f32,
    shots_remaining: u32,
    fire_timer_ms: f32,
    volley_armed: bool,
    dash_ms: f32,
}

impl Boss {
    pub fn new(pos: Vec2, config: BossConfig) -> Self {
        Self {
            body: Body::new(pos, config.radius, config.max_health, TEAM_HOSTILE),
            config,
            phase: BossPhase::Burst,
            phase_timer: 0.0,
            burst_timer_ms: 0.0,
            shots_remaining: 0,
            fire_timer_ms: 0.0,
            volley_armed: false,
            dash_ms: 0.0,
        }
    }

    pub fn phase(&self) -> BossPhase {
        self.phase
    }

    pub fn phase_timer(&self) -> f32 {
        self.phase_timer
    }

    pub fn shots_remaining(&self) -> u32 {
        self.shots_remaining
    }

    fn enter_phase(&mut self, phase: BossPhase) {
        log::info!("boss phase {} -> {}", self.phase.index(), phase.index());
        self.phase = phase;
        self.burst_timer_ms = 0.0;
        self.shots_remaining = 0;
        self.fire_timer_ms = 0.0;
        self.volley_armed = false;
    }

    fn advance_clock(&mut self, dt: f32) {
        self.phase_timer += dt;
        let length = self.config.phase_secs;
        if self.phase_timer >= length - PHASE_TOLERANCE_SECS {
            self.phase_timer = (self.phase_timer - length).max(0.0);
            self.enter_phase(self.phase.next());
        }
    }

    fn track(&mut self, target_x: f32) {
        if self.dash_ms > 0.0 {
            return;
        }
        let dx = target_x - self.body.pos.x;
        self.body.vel.x = if dx.abs() > self.config.track_dead_zone {
            dx.signum() * self.config.speed
        } else {
            0.0
        };
    }

    fn volley(&self, aim: f32, pellets: u32, spread: f32, speed_mult: f32, damage: i32) -> Volley {
        Volley {
            origin: self.body.pos,
            aim,
            pellets,
            spread,
            speed: self.config.bullet_speed * speed_mult,
            life_ms: self.config.bullet_life_ms,
            damage,
            from_player: false,
        }
    }

    fn attack(&mut self, target: Vec2, ctx: &mut EntityContext<'_>) {
        let aim = angle_to(self.body.pos, target);
        let cfg = &self.config;
        match self.phase {
            BossPhase::Burst => {
                if self.burst_timer_ms > 0.0 {
                    return;
                }
                if self.shots_remaining == 0 {
                    self.shots_remaining = cfg.burst_shots;
                } else {
                    self.volley(aim, cfg.burst_pellets, cfg.burst_spread, cfg.burst_speed_mult, cfg.bullet_damage)
                        .spawn(ctx.bullets);
                    self.shots_remaining -= 1;
                }
                self.burst_timer_ms = self.config.burst_interval_ms;
            }
            BossPhase::Rapid => {
                if self.fire_timer_ms > 0.0 {
                    return;
                }
                self.volley(aim, 1, 0.0, cfg.rapid_speed_mult, cfg.bullet_damage)
                    .spawn(ctx.bullets);
                self.fire_timer_ms = self.config.rapid_interval_ms;
            }
            BossPhase::Volley => {
                if self.burst_timer_ms > 0.0 {
                    return;
                }
                if self.volley_armed {
                    self.volley(aim, cfg.volley_pellets, cfg.volley_spread, cfg.volley_speed_mult, cfg.volley_damage)
                        .spawn(ctx.bullets);
                    self.volley_armed = false;
                    self.burst_timer_ms = self.config.volley_cooldown_ms;
                } else {
                    let dash = angle_dir(aim) * cfg.dash_strength;
                    self.body.vel.x += dash.x;
                    self.body.vel.y += dash.y * cfg.dash_vertical_mult;
                    self.dash_ms = cfg.dash_ms;
                    self.volley_armed = true;
                    self.burst_timer_ms = self.config.volley_delay_ms;
                }
            }
        }
    }
}

impl Entity for Boss {
    fn kind(&self) -> EntityKind {
        EntityKind::Boss
    }

    fn body(&self) -> &Body {
        &self.body
    }

    fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    fn knockback(&self) -> Vec2 {
        vec2(self.config.knockback_x, self.config.knockback_y)
    }

    fn update(&mut self, dt: f32, ctx: &mut EntityContext<'_>) {
        let opts = ResolveOptions::square(self.config.radius);
        if !self.body.alive {
            self.body.vel.y += self.config.dead_gravity * dt;
            self.body.integrate(dt);
            self.body.resolve(ctx.map, &opts);
            return;
        }

        self.advance_clock(dt);
        let dt_ms = dt * 1000.0;
        tick_down(&mut self.fire_timer_ms, dt_ms);
        tick_down(&mut self.burst_timer_ms, dt_ms);
        tick_down(&mut self.dash_ms, dt_ms);

        let target = ctx.player;
        self.track(target.pos.x);
        if target.alive {
            self.attack(target.pos, ctx);
        }

        let bob = (self.phase_timer * self.config.bob_frequency).sin() * self.config.bob_amplitude;
        self.body.pos.y += bob * dt;
        self.body.vel.y += self.config.gravity * dt;
        self.body.integrate(dt);
        self.body.resolve(ctx.map, &opts);
    }

    fn on_death(&mut self) {
        self.body.vel.y -= self.config.death_hop;
        log::info!("boss defeated");
    }
}
