use macroquad::prelude::*;

use crate::config::WorldConfig;
use crate::entity::{DamageOutcome, Entity};
use crate::helpers::dist_sq;
use crate::map::TileMap;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bullet {
    pub pos: Vec2,
    pub vel: Vec2,
    pub life_ms: f32,
    pub damage: i32,
    pub from_player: bool,
}

impl Bullet {
    pub fn new(pos: Vec2, vel: Vec2, life_ms: f32, damage: i32, from_player: bool) -> Self {
        Self {
            pos,
            vel,
            life_ms,
            damage,
            from_player,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BulletHit {
    Tile { pos: Vec2 },
    Player { damage: i32, outcome: DamageOutcome },
    Entity { index: usize, damage: i32, outcome: DamageOutcome },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BulletRules {
    pub player_hit_radius: f32,
    pub entity_hit_padding: f32,
    pub default_player_damage: i32,
    pub default_enemy_damage: i32,
    pub cull_y: f32,
}

impl BulletRules {
    pub fn new(world: &WorldConfig, map: &TileMap) -> Self {
        Self {
            player_hit_radius: world.player_hit_radius,
            entity_hit_padding: world.entity_hit_padding,
            default_player_damage: world.default_player_damage,
            default_enemy_damage: world.default_enemy_damage,
            cull_y: map.world_height() + world.bullet_cull_depth,
        }
    }
}

pub fn update_bullets(
    bullets: &mut Vec<Bullet>,
    dt: f32,
    map: &TileMap,
    player: &mut dyn Entity,
    entities: &mut [Box<dyn Entity>],
    rules: &BulletRules,
) -> Vec<BulletHit> {
    let dt_ms = dt * 1000.0;
    let mut hits = Vec::new();

    bullets.retain_mut(|b| {
        b.life_ms -= dt_ms;
        if b.life_ms <= 0.0 {
            return false;
        }
        b.pos += b.vel * dt;

        if map.is_solid_at_world(b.pos) {
            hits.push(BulletHit::Tile { pos: b.pos });
            return false;
        }

        if !b.from_player {
            if player.is_alive()
                && dist_sq(b.pos, player.body().pos)
                    <= rules.player_hit_radius * rules.player_hit_radius
            {
                let damage = if b.damage > 0 {
                    b.damage
                } else {
                    rules.default_enemy_damage
                };
                let outcome = player.apply_damage(damage, Some(b.pos));
                hits.push(BulletHit::Player { damage, outcome });
                return false;
            }
        } else {
            for (index, entity) in entities.iter_mut().enumerate() {
                if !entity.is_alive() {
                    continue;
                }
                let reach = entity.body().radius + rules.entity_hit_padding;
                if dist_sq(b.pos, entity.body().pos) > reach * reach {
                    continue;
                }
                let damage = if b.damage > 0 {
                    b.damage
                } else {
                    rules.default_player_damage
                };
                let outcome = entity.apply_damage(damage, Some(b.pos));
                if outcome.killed() {
                    log::debug!("{:?} #{index} killed by bullet", entity.kind());
                }
                hits.push(BulletHit::Entity {
                    index,
                    damage,
                    outcome,
                });
                return false;
            }
        }

        b.pos.y <= rules.cull_y
    });

    hits
}
