use macroquad::prelude::*;

use crate::collision::ResolveOptions;
use crate::config::EnemyConfig;
use crate::entity::{Body, Entity, EntityContext, EntityKind, TEAM_HOSTILE};
use crate::helpers::{angle_dir, angle_to, decay_per_tick, dist_sq, tick_down};
use crate::weapon::Volley;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnemyState {
    Patrol,
    Aggro,
    Stunned,
}

pub struct Enemy {
    body: Body,
    config: EnemyConfig,
    state: EnemyState,
    patrol_left: f32,
    patrol_right: f32,
    patrol_dir: f32,
    fire_timer_ms: f32,
}

impl Enemy {
    pub fn new(pos: Vec2, config: EnemyConfig) -> Self {
        let half_span = config.patrol_half_span;
        Self {
            body: Body::new(pos, config.radius, config.max_health, TEAM_HOSTILE),
            patrol_left: pos.x - half_span,
            patrol_right: pos.x + half_span,
            patrol_dir: 1.0,
            fire_timer_ms: 0.0,
            state: EnemyState::Patrol,
            config,
        }
    }

    pub fn with_patrol(mut self, left: f32, right: f32) -> Self {
        self.patrol_left = left;
        self.patrol_right = right;
        self
    }

    pub fn state(&self) -> EnemyState {
        self.state
    }

    pub fn patrol_bounds(&self) -> (f32, f32) {
        (self.patrol_left, self.patrol_right)
    }

    pub fn fire_timer_ms(&self) -> f32 {
        self.fire_timer_ms
    }

    fn resolve_options(&self) -> ResolveOptions {
        ResolveOptions::square(self.config.radius)
    }

    fn patrol(&mut self) {
        if self.patrol_right <= self.patrol_left {
            self.body.vel.x = 0.0;
            return;
        }
        if self.body.pos.x <= self.patrol_left {
            self.patrol_dir = 1.0;
        } else if self.body.pos.x >= self.patrol_right {
            self.patrol_dir = -1.0;
        }
        self.body.vel.x = self.patrol_dir * self.config.speed;
    }

    fn fire_at(&mut self, target: Vec2, ctx: &mut EntityContext<'_>) {
        let aim = angle_to(self.body.pos, target);
        Volley {
            origin: self.body.pos,
            aim,
            pellets: self.config.bullets_per_shot,
            spread: self.config.bullet_spread,
            speed: self.config.bullet_speed,
            life_ms: self.config.bullet_life_ms,
            damage: self.config.bullet_damage,
            from_player: false,
        }
        .spawn(ctx.bullets);

        let kick = angle_dir(aim);
        self.body.vel.x -= kick.x * self.config.recoil_x;
        self.body.vel.y -= kick.y * self.config.recoil_y;
        self.fire_timer_ms = self.config.fire_cooldown_ms;
    }
}

impl Entity for Enemy {
    fn kind(&self) -> EntityKind {
        EntityKind::Enemy
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
        let opts = self.resolve_options();
        if !self.body.alive {
            self.body.vel.y += self.config.gravity * dt;
            self.body.integrate(dt);
            self.body.resolve(ctx.map, &opts);
            return;
        }

        let dt_ms = dt * 1000.0;
        tick_down(&mut self.fire_timer_ms, dt_ms);
        tick_down(&mut self.body.stun_ms, dt_ms);

        let target = ctx.player;
        let d2 = dist_sq(self.body.pos, target.pos);
        let in_aggro = target.alive && d2 <= self.config.aggro_range * self.config.aggro_range;
        let in_fire = target.alive && d2 <= self.config.fire_range * self.config.fire_range;

        self.state = if self.body.is_stunned() {
            EnemyState::Stunned
        } else if in_aggro {
            EnemyState::Aggro
        } else {
            EnemyState::Patrol
        };

        match self.state {
            EnemyState::Aggro => {
                let dir = if target.pos.x > self.body.pos.x { 1.0 } else { -1.0 };
                self.body.vel.x = dir * self.config.speed;
            }
            EnemyState::Patrol => self.patrol(),
            EnemyState::Stunned => {
                self.body.vel.x *= decay_per_tick(self.config.stun_decay, dt);
            }
        }

        self.body.vel.y += self.config.gravity * dt;
        self.body.integrate(dt);
        self.body.resolve(ctx.map, &opts);

        if self.state != EnemyState::Stunned && in_fire && self.fire_timer_ms <= 0.0 {
            self.fire_at(target.pos, ctx);
        }
    }

    fn on_death(&mut self) {
        self.body.vel.y -= self.config.death_hop;
        log::debug!("enemy died at ({:.0}, {:.0})", self.body.pos.x, self.body.pos.y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::PlayerTarget;
    use crate::map::TileMap;
    use approx::assert_abs_diff_eq;

    const DT: f32 = 1.0 / 60.0;

    fn open_map() -> TileMap {
        TileMap::from_rows(&["...."])
    }

    fn tick(enemy: &mut Enemy, map: &TileMap, player: Vec2, bullets: &mut Vec<crate::bullet::Bullet>) {
        let mut ctx = EntityContext {
            map,
            player: PlayerTarget {
                pos: player,
                alive: true,
            },
            bullets,
        };
        enemy.update(DT, &mut ctx);
    }

    #[test]
    fn fires_inside_range_with_cooldown() {
        let map = open_map();
        let mut enemy = Enemy::new(vec2(1000.0, 100.0), EnemyConfig::default());
        let mut bullets = Vec::new();
        tick(&mut enemy, &map, vec2(800.0, 100.0), &mut bullets);
        assert_eq!(bullets.len(), 1);
        assert!(!bullets[0].from_player);
        assert_eq!(bullets[0].damage, 8);
        assert_abs_diff_eq!(bullets[0].vel.x, -700.0, epsilon = 0.05);
        // Recoil kicks away from the target, cancelling this tick's chase speed.
        assert_abs_diff_eq!(enemy.body().vel.x, 0.0, epsilon = 0.01);

        tick(&mut enemy, &map, vec2(800.0, 100.0), &mut bullets);
        assert_eq!(bullets.len(), 1);
    }

    #[test]
    fn stunned_enemy_holds_fire_and_slows() {
        let map = open_map();
        let mut enemy = Enemy::new(vec2(1000.0, 100.0), EnemyConfig::default());
        enemy.body_mut().stun_ms = 500.0;
        enemy.body_mut().vel.x = 100.0;
        let mut bullets = Vec::new();
        tick(&mut enemy, &map, vec2(900.0, 100.0), &mut bullets);
        assert_eq!(enemy.state(), EnemyState::Stunned);
        assert!(bullets.is_empty());
        assert_abs_diff_eq!(enemy.body().vel.x, 90.0, epsilon = 1e-3);
    }

    #[test]
    fn patrol_turns_at_bounds() {
        let map = open_map();
        let mut enemy = Enemy::new(vec2(500.0, 100.0), EnemyConfig::default()).with_patrol(400.0, 499.0);
        let mut bullets = Vec::new();
        tick(&mut enemy, &map, vec2(5000.0, 100.0), &mut bullets);
        assert_eq!(enemy.state(), EnemyState::Patrol);
        assert_eq!(enemy.body().vel.x, -60.0);
    }

    #[test]
    fn corpse_keeps_falling() {
        let map = open_map();
        let mut enemy = Enemy::new(vec2(500.0, 100.0), EnemyConfig::default());
        assert!(enemy.apply_damage(1000, None).killed());
        assert_eq!(enemy.body().vel.y, -120.0);
        let mut bullets = Vec::new();
        for _ in 0..30 {
            tick(&mut enemy, &map, vec2(520.0, 100.0), &mut bullets);
        }
        assert!(bullets.is_empty());
        assert!(enemy.body().pos.y > 100.0);
    }
}
