use macroquad::prelude::*;

use crate::boss::Boss;
use crate::bullet::{Bullet, BulletHit, BulletRules, update_bullets};
use crate::config::GameConfig;
use crate::enemy::Enemy;
use crate::entity::{Entity, EntityContext, EntityKind, PlayerTarget};
use crate::input::{EdgeTracker, InputState};
use crate::level::Level;
use crate::map::TileMap;
use crate::pickup::{Pickup, collect_pickups};
use crate::player::Player;
use crate::weapon::WeaponKind;

const AMMO_PICKUP_ROUNDS: i32 = 12;
const SHOTGUN_PICKUP_ROUNDS: i32 = 6;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HudState {
    pub health_fraction: f32,
    pub weapon: WeaponKind,
    pub magazine: i32,
    pub reserve: i32,
    pub reload_progress: f32,
    pub shotgun_unlocked: bool,
    pub alive: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EntityView {
    pub kind: EntityKind,
    pub pos: Vec2,
    pub radius: f32,
    pub facing: f32,
    pub health: i32,
    pub max_health: i32,
    pub alive: bool,
}

impl EntityView {
    fn of(entity: &dyn Entity) -> Self {
        let body = entity.body();
        Self {
            kind: entity.kind(),
            pos: body.pos,
            radius: body.radius,
            facing: body.facing(),
            health: body.health,
            max_health: body.max_health,
            alive: body.alive,
        }
    }
}

pub struct GameSession {
    config: GameConfig,
    level: Level,
    player: Player,
    entities: Vec<Box<dyn Entity>>,
    bullets: Vec<Bullet>,
    pickups: Vec<Pickup>,
    edges: EdgeTracker,
    paused: bool,
    time: f32,
}

impl GameSession {
    pub fn new(level: Level, config: GameConfig) -> Self {
        let player = Player::new(level.spawn, &config);
        let mut session = Self {
            config,
            level,
            player,
            entities: Vec::new(),
            bullets: Vec::new(),
            pickups: Vec::new(),
            edges: EdgeTracker::default(),
            paused: false,
            time: 0.0,
        };
        session.populate();
        session
    }

    pub fn load_level(&mut self, level: Level) {
        self.level = level;
        self.reset();
    }

    pub fn restart(&mut self) {
        log::info!("restarting level {}", self.level.id);
        self.reset();
    }

    fn reset(&mut self) {
        self.entities.clear();
        self.bullets.clear();
        self.pickups.clear();
        self.player = Player::new(self.level.spawn, &self.config);
        self.paused = false;
        self.time = 0.0;
        self.populate();
    }

    fn populate(&mut self) {
        let size = self.level.map.tile_size();
        for object in self.level.objects() {
            let center = object.world_center(size);
            match object.tag {
                'E' => self
                    .entities
                    .push(Box::new(Enemy::new(center, self.config.enemy.clone()))),
                'B' => {
                    let pos = center - vec2(0.0, self.config.boss.spawn_lift);
                    self.entities
                        .push(Box::new(Boss::new(pos, self.config.boss.clone())));
                }
                'A' => self
                    .pickups
                    .push(Pickup::pistol_ammo(center, AMMO_PICKUP_ROUNDS)),
                'H' => self
                    .pickups
                    .push(Pickup::shotgun(center, SHOTGUN_PICKUP_ROUNDS)),
                _ => {}
            }
        }
        log::info!(
            "level {} ready: {} entities, {} pickups, spawn ({:.0}, {:.0})",
            self.level.id,
            self.entities.len(),
            self.pickups.len(),
            self.level.spawn.x,
            self.level.spawn.y
        );
    }

    pub fn tick(&mut self, dt: f32, input: &InputState) -> Vec<BulletHit> {
        let pressed = self.edges.step(input);
        if pressed.restart {
            self.restart();
            return Vec::new();
        }
        if pressed.pause {
            self.paused = !self.paused;
            log::debug!("paused: {}", self.paused);
        }
        let dt = dt.clamp(0.0, self.config.world.max_dt);
        if self.paused || dt <= 0.0 {
            return Vec::new();
        }
        self.time += dt;

        let map = &self.level.map;
        self.player.set_input(*input);
        let mut ctx = EntityContext {
            map,
            player: self.player_target(),
            bullets: &mut self.bullets,
        };
        self.player.update(dt, &mut ctx);

        if self.player.is_alive() {
            collect_pickups(&mut self.pickups, &mut self.player, self.config.world.pickup_radius);
        }

        let target = self.player_target();
        for entity in self.entities.iter_mut() {
            let mut ctx = EntityContext {
                map,
                player: target,
                bullets: &mut self.bullets,
            };
            entity.update(dt, &mut ctx);
        }
        separate(&mut self.entities, self.config.world.separation_damping);

        let mut rules = BulletRules::new(&self.config.world, map);
        if self.player.crouching() {
            rules.player_hit_radius = self.config.world.crouch_hit_radius;
        }
        let hits = update_bullets(
            &mut self.bullets,
            dt,
            map,
            &mut self.player,
            &mut self.entities,
            &rules,
        );

        let kill_y = map.world_height() + self.config.world.player_kill_depth;
        if self.player.is_alive() && self.player.position().y > kill_y {
            log::info!("player fell out of the world");
            let health = self.player.body().health;
            self.player.apply_damage(health, None);
        }

        log::trace!(
            "t={:.3} bullets={} player=({:.1}, {:.1})",
            self.time,
            self.bullets.len(),
            self.player.position().x,
            self.player.position().y
        );
        hits
    }

    fn player_target(&self) -> PlayerTarget {
        PlayerTarget {
            pos: self.player.position(),
            alive: self.player.is_alive(),
        }
    }

    pub fn hud(&self) -> HudState {
        let weapon = self.player.weapon().kind();
        let ammo = self.player.ammo(weapon);
        HudState {
            health_fraction: self.player.body().health_fraction(),
            weapon,
            magazine: ammo.magazine,
            reserve: ammo.reserve,
            reload_progress: self.player.reload_progress(),
            shotgun_unlocked: self.player.has_shotgun(),
            alive: self.player.is_alive(),
        }
    }

    pub fn entity_views(&self) -> Vec<EntityView> {
        std::iter::once(EntityView::of(&self.player))
            .chain(self.entities.iter().map(|e| EntityView::of(e.as_ref())))
            .collect()
    }

    pub fn bullets(&self) -> &[Bullet] {
        &self.bullets
    }

    pub fn pickups(&self) -> &[Pickup] {
        &self.pickups
    }

    pub fn map(&self) -> &TileMap {
        &self.level.map
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut Player {
        &mut self.player
    }

    pub fn entities(&self) -> &[Box<dyn Entity>] {
        &self.entities
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn time(&self) -> f32 {
        self.time
    }
}

fn separate(entities: &mut [Box<dyn Entity>], damping: f32) {
    for i in 0..entities.len() {
        let (head, tail) = entities.split_at_mut(i + 1);
        let a = head[i].body_mut();
        if !a.alive {
            continue;
        }
        for other in tail.iter_mut() {
            let b = other.body_mut();
            if !b.alive {
                continue;
            }
            let delta = b.pos - a.pos;
            let min_dist = a.radius + b.radius;
            let dist_sq = delta.length_squared();
            if dist_sq >= min_dist * min_dist {
                continue;
            }
            let dist = dist_sq.sqrt();
            let dir = if dist > f32::EPSILON { delta / dist } else { Vec2::X };
            let push = (min_dist - dist) * 0.5;
            a.pos -= dir * push;
            b.pos += dir * push;
            a.vel *= damping;
            b.vel *= damping;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::TILE_SIZE;
    use approx::assert_abs_diff_eq;

    const DT: f32 = 1.0 / 60.0;

    fn yard(rows: &[&str]) -> GameSession {
        GameSession::new(Level::from_rows("yard", rows).unwrap(), GameConfig::default())
    }

    #[test]
    fn markers_become_entities_and_pickups() {
        let session = yard(&[
            "..........",
            "..E..B....",
            ".A......H.",
            "##########",
        ]);
        let kinds: Vec<_> = session.entities().iter().map(|e| e.kind()).collect();
        assert_eq!(kinds, vec![EntityKind::Enemy, EntityKind::Boss]);
        assert_eq!(session.pickups().len(), 2);
        let boss = session.entities()[1].body().pos;
        assert_abs_diff_eq!(boss.y, 1.5 * TILE_SIZE - 10.0);
        assert_eq!(session.entity_views().len(), 3);
        assert_eq!(session.entity_views()[0].kind, EntityKind::Player);
    }

    #[test]
    fn overlapping_entities_are_pushed_apart() {
        let config = GameConfig::default();
        let mut entities: Vec<Box<dyn Entity>> = vec![
            Box::new(Enemy::new(vec2(100.0, 100.0), config.enemy.clone())),
            Box::new(Enemy::new(vec2(100.0, 100.0), config.enemy.clone())),
        ];
        entities[0].body_mut().vel = vec2(10.0, 0.0);
        separate(&mut entities, 0.8);
        assert_abs_diff_eq!(entities[0].body().pos.x, 86.0);
        assert_abs_diff_eq!(entities[1].body().pos.x, 114.0);
        assert_abs_diff_eq!(entities[0].body().vel.x, 8.0);
    }

    #[test]
    fn dead_entities_are_not_separated() {
        let config = GameConfig::default();
        let mut entities: Vec<Box<dyn Entity>> = vec![
            Box::new(Enemy::new(vec2(100.0, 100.0), config.enemy.clone())),
            Box::new(Enemy::new(vec2(110.0, 100.0), config.enemy.clone())),
        ];
        entities[1].body_mut().alive = false;
        separate(&mut entities, 0.8);
        assert_eq!(entities[0].body().pos, vec2(100.0, 100.0));
    }

    #[test]
    fn falling_out_of_the_world_kills() {
        let mut session = yard(&["....", "....", "...."]);
        let below = session.map().world_height() + 250.0;
        session.player_mut().place(vec2(40.0, below));
        session.tick(DT, &InputState::default());
        assert!(!session.hud().alive);
    }

    #[test]
    fn pause_freezes_and_restart_resets() {
        let mut session = yard(&["......", "......", "......", "######"]);
        let pause = InputState {
            pause: true,
            ..Default::default()
        };
        session.tick(DT, &pause);
        assert!(session.is_paused());
        session.tick(DT, &InputState::default());
        assert_eq!(session.time(), 0.0);

        session.tick(DT, &pause);
        assert!(!session.is_paused());
        session.tick(DT, &InputState::default());
        assert!(session.time() > 0.0);

        session.tick(
            DT,
            &InputState {
                restart: true,
                ..Default::default()
            },
        );
        assert_eq!(session.time(), 0.0);
        assert_eq!(session.player().position(), session.level().spawn);
    }

    #[test]
    fn large_frame_delta_is_clamped() {
        let mut session = yard(&["......", "......", "......", "######"]);
        session.tick(5.0, &InputState::default());
        assert_abs_diff_eq!(session.time(), 0.1);
    }
}
