use macroquad::prelude::*;
use serde::Deserialize;

use crate::bullet::Bullet;
use crate::entity::Body;
use crate::helpers::{angle_dir, fan_angles, tick_down};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeaponKind {
    Pistol,
    Shotgun,
}

impl WeaponKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Pistol => "Pistol",
            Self::Shotgun => "Shotgun",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct WeaponConfig {
    pub cooldown_ms: f32,
    pub ammo_per_shot: i32,
    pub bullet_speed_mult: f32,
    pub pellets: u32,
    // Total arc in radians, first pellet to last.
    pub spread: f32,
    pub recoil: f32,
    pub pushback: f32,
    pub stun_ms: f32,
    pub damage: i32,
    pub magazine_size: i32,
    pub reload_ms: f32,
    pub bullet_life_ms: f32,
}

impl WeaponConfig {
    pub fn pistol() -> Self {
        Self {
            cooldown_ms: 150.0,
            ammo_per_shot: 1,
            bullet_speed_mult: 1.0,
            pellets: 1,
            spread: 0.0,
            recoil: 80.0,
            pushback: 20.0,
            stun_ms: 0.0,
            damage: 10,
            magazine_size: 12,
            reload_ms: 800.0,
            bullet_life_ms: 2000.0,
        }
    }

    pub fn shotgun() -> Self {
        Self {
            cooldown_ms: 700.0,
            ammo_per_shot: 1,
            bullet_speed_mult: 0.85,
            pellets: 6,
            spread: 0.45,
            recoil: 220.0,
            pushback: 140.0,
            stun_ms: 50.0,
            damage: 6,
            magazine_size: 8,
            reload_ms: 1100.0,
            bullet_life_ms: 1200.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Volley {
    pub origin: Vec2,
    pub aim: f32,
    pub pellets: u32,
    pub spread: f32,
    pub speed: f32,
    pub life_ms: f32,
    pub damage: i32,
    pub from_player: bool,
}

impl Volley {
    pub fn spawn(&self, bullets: &mut Vec<Bullet>) -> usize {
        let angles = fan_angles(self.aim, self.pellets, self.spread);
        bullets.reserve(angles.len());
        for angle in &angles {
            bullets.push(Bullet::new(
                self.origin,
                angle_dir(*angle) * self.speed,
                self.life_ms,
                self.damage,
                self.from_player,
            ));
        }
        angles.len()
    }
}

#[derive(Clone, Debug)]
pub struct Weapon {
    kind: WeaponKind,
    config: WeaponConfig,
    cooldown_ms: f32,
}

impl Weapon {
    pub fn new(kind: WeaponKind, config: WeaponConfig) -> Self {
        Self {
            kind,
            config,
            cooldown_ms: 0.0,
        }
    }

    pub fn kind(&self) -> WeaponKind {
        self.kind
    }

    pub fn config(&self) -> &WeaponConfig {
        &self.config
    }

    pub fn cooldown_ms(&self) -> f32 {
        self.cooldown_ms
    }

    pub fn ready(&self) -> bool {
        self.cooldown_ms <= 0.0
    }

    pub fn update(&mut self, dt_ms: f32) {
        tick_down(&mut self.cooldown_ms, dt_ms);
    }

    pub fn try_fire(
        &mut self,
        origin: Vec2,
        aim: f32,
        base_speed: f32,
        shooter: &mut Body,
        bullets: &mut Vec<Bullet>,
        magazine: &mut i32,
    ) -> bool {
        if !self.ready() || *magazine <= 0 {
            return false;
        }
        let cfg = &self.config;
        let spawned = Volley {
            origin,
            aim,
            pellets: cfg.pellets,
            spread: cfg.spread,
            speed: base_speed * cfg.bullet_speed_mult,
            life_ms: cfg.bullet_life_ms,
            damage: cfg.damage,
            from_player: true,
        }
        .spawn(bullets);
        if spawned == 0 {
            return false;
        }

        let back = -angle_dir(aim);
        shooter.vel += vec2(back.x * cfg.recoil, back.y * cfg.recoil * 0.5);
        shooter.vel += vec2(back.x * cfg.pushback, back.y * cfg.pushback * 0.6);
        if cfg.stun_ms > 0.0 {
            shooter.stun_ms = shooter.stun_ms.max(cfg.stun_ms);
        }

        *magazine = (*magazine - cfg.ammo_per_shot).max(0);
        self.cooldown_ms = cfg.cooldown_ms;
        log::trace!("{} fired {spawned} pellets", self.kind.name());
        true
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Ammo {
    pub magazine: i32,
    pub reserve: i32,
}

impl Ammo {
    pub fn new(magazine: i32, reserve: i32) -> Self {
        Self {
            magazine: magazine.max(0),
            reserve: reserve.max(0),
        }
    }

    pub fn total(&self) -> i32 {
        self.magazine + self.reserve
    }

    pub fn refill(&mut self, magazine_size: i32) -> i32 {
        let need = (magazine_size - self.magazine).max(0);
        let take = need.min(self.reserve);
        self.magazine += take;
        self.reserve -= take;
        take
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Reload {
    #[default]
    Idle,
    Reloading {
        weapon: WeaponKind,
        remaining_ms: f32,
        total_ms: f32,
    },
}

impl Reload {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Reloading { .. })
    }

    pub fn start(&mut self, weapon: WeaponKind, ammo: &Ammo, config: &WeaponConfig) -> bool {
        if self.is_active() || ammo.magazine >= config.magazine_size || ammo.reserve <= 0 {
            return false;
        }
        *self = Self::Reloading {
            weapon,
            remaining_ms: config.reload_ms.max(0.0),
            total_ms: config.reload_ms.max(0.0),
        };
        true
    }

    pub fn update(&mut self, dt_ms: f32) -> Option<WeaponKind> {
        let Self::Reloading {
            weapon,
            remaining_ms,
            ..
        } = self
        else {
            return None;
        };
        tick_down(remaining_ms, dt_ms);
        if *remaining_ms > 0.0 {
            return None;
        }
        let done = *weapon;
        *self = Self::Idle;
        Some(done)
    }

    pub fn progress(&self) -> f32 {
        match self {
            Self::Idle => 1.0,
            Self::Reloading {
                remaining_ms,
                total_ms,
                ..
            } => {
                if *total_ms <= 0.0 {
                    1.0
                } else {
                    1.0 - remaining_ms / total_ms
                }
            }
        }
    }
}
