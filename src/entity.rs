use macroquad::prelude::*;

use crate::bullet::Bullet;
use crate::collision::{ResolveOptions, Resolved, resolve_tiles};
use crate::helpers::safe_direction;
use crate::map::TileMap;

pub const TEAM_PLAYER: u8 = 0;
pub const TEAM_HOSTILE: u8 = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Player,
    Enemy,
    Boss,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DamageOutcome {
    // Already dead or a non-positive amount.
    Ignored,
    Hurt,
    Killed,
}

impl DamageOutcome {
    pub fn killed(self) -> bool {
        self == Self::Killed
    }

    pub fn landed(self) -> bool {
        self != Self::Ignored
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Body {
    pub pos: Vec2,
    pub vel: Vec2,
    pub health: i32,
    pub max_health: i32,
    pub radius: f32,
    pub alive: bool,
    pub team: u8,
    pub stun_ms: f32,
    pub on_ground: bool,
}

impl Body {
    pub fn new(pos: Vec2, radius: f32, max_health: i32, team: u8) -> Self {
        let max_health = max_health.max(1);
        Self {
            pos,
            vel: Vec2::ZERO,
            health: max_health,
            max_health,
            radius,
            alive: true,
            team,
            stun_ms: 0.0,
            on_ground: false,
        }
    }

    pub fn health_fraction(&self) -> f32 {
        self.health as f32 / self.max_health as f32
    }

    pub fn is_stunned(&self) -> bool {
        self.stun_ms > 0.0
    }

    pub fn facing(&self) -> f32 {
        if self.vel.x > 1e-3 {
            1.0
        } else if self.vel.x < -1e-3 {
            -1.0
        } else {
            0.0
        }
    }

    pub fn take_damage(&mut self, amount: i32) -> DamageOutcome {
        if !self.alive || amount <= 0 {
            return DamageOutcome::Ignored;
        }
        self.health = (self.health - amount).clamp(0, self.max_health);
        if self.health == 0 {
            self.alive = false;
            DamageOutcome::Killed
        } else {
            DamageOutcome::Hurt
        }
    }

    pub fn push_away_from(&mut self, source: Vec2, horizontal: f32, vertical: f32) {
        if let Some(dir) = safe_direction(source, self.pos) {
            self.vel.x += dir.x * horizontal;
            self.vel.y += dir.y * vertical;
        }
    }

    pub fn integrate(&mut self, dt: f32) {
        self.pos += self.vel * dt;
    }

    pub fn resolve(&mut self, map: &TileMap, opts: &ResolveOptions) -> Resolved {
        let resolved = resolve_tiles(map, self.pos, self.vel, opts);
        self.pos = resolved.pos;
        self.vel = resolved.vel;
        self.on_ground = resolved.on_ground;
        resolved
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayerTarget {
    pub pos: Vec2,
    pub alive: bool,
}

pub struct EntityContext<'a> {
    pub map: &'a TileMap,
    pub player: PlayerTarget,
    pub bullets: &'a mut Vec<Bullet>,
}

pub trait Entity {
    fn kind(&self) -> EntityKind;
    fn body(&self) -> &Body;
    fn body_mut(&mut self) -> &mut Body;

    fn update(&mut self, dt: f32, ctx: &mut EntityContext<'_>);

    fn on_death(&mut self) {}

    fn knockback(&self) -> Vec2 {
        vec2(4.0, 2.0)
    }

    fn apply_damage(&mut self, amount: i32, source: Option<Vec2>) -> DamageOutcome {
        let outcome = self.body_mut().take_damage(amount);
        match outcome {
            DamageOutcome::Hurt => {
                if let Some(source) = source {
                    let k = self.knockback() * amount as f32;
                    self.body_mut().push_away_from(source, k.x, k.y);
                }
            }
            DamageOutcome::Killed => self.on_death(),
            DamageOutcome::Ignored => {}
        }
        outcome
    }

    fn is_alive(&self) -> bool {
        self.body().alive
    }
}
