use macroquad::prelude::*;

use crate::bullet::Bullet;
use crate::collision::ResolveOptions;
use crate::config::{GameConfig, PlayerConfig};
use crate::entity::{Body, DamageOutcome, Entity, EntityContext, EntityKind, TEAM_PLAYER};
use crate::helpers::{angle_dir, angle_to, tick_down};
use crate::input::{EdgeTracker, InputState};
use crate::map::Material;
use crate::weapon::{Ammo, Reload, Weapon, WeaponConfig, WeaponKind};

const RAGDOLL_TORQUE_PER_PX: f32 = 0.0008;
const RAGDOLL_MAX_SPIN: f32 = 0.08;
const RAGDOLL_DAMPING_PER_MS: f32 = 0.995;
const RAGDOLL_SPIN_EPSILON: f32 = 1e-4;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Ragdoll {
    pub active: bool,
    pub body_angle: f32,
    pub angular_velocity: f32,
    dragging: bool,
    last_x: f32,
}

impl Ragdoll {
    fn update(&mut self, dt_ms: f32) {
        if !self.active {
            return;
        }
        self.body_angle += self.angular_velocity * dt_ms;
        self.angular_velocity *= RAGDOLL_DAMPING_PER_MS.powf(dt_ms);
        if self.angular_velocity.abs() < RAGDOLL_SPIN_EPSILON {
            self.angular_velocity = 0.0;
        }
    }
}

pub struct Player {
    body: Body,
    config: PlayerConfig,
    pistol_config: WeaponConfig,
    shotgun_config: WeaponConfig,
    bullet_speed: f32,
    weapon: Weapon,
    pistol_ammo: Ammo,
    shotgun_ammo: Ammo,
    has_shotgun: bool,
    reload: Reload,
    aim: f32,
    input: InputState,
    edges: EdgeTracker,
    crouching: bool,
    damage_flash_ms: f32,
    touch_cooldown_ms: f32,
    ground: Option<Material>,
    last_impact_speed: f32,
    ragdoll: Ragdoll,
}

impl Player {
    pub fn new(pos: Vec2, config: &GameConfig) -> Self {
        let p = config.player.clone();
        Self {
            body: Body::new(pos, p.half_width, p.max_health, TEAM_PLAYER),
            pistol_ammo: Ammo::new(p.pistol_magazine, p.pistol_reserve),
            shotgun_ammo: Ammo::default(),
            config: p,
            weapon: Weapon::new(WeaponKind::Pistol, config.pistol.clone()),
            pistol_config: config.pistol.clone(),
            shotgun_config: config.shotgun.clone(),
            bullet_speed: config.world.bullet_speed,
            has_shotgun: false,
            reload: Reload::Idle,
            aim: 0.0,
            input: InputState::default(),
            edges: EdgeTracker::default(),
            crouching: false,
            damage_flash_ms: 0.0,
            touch_cooldown_ms: 0.0,
            ground: None,
            last_impact_speed: 0.0,
            ragdoll: Ragdoll::default(),
        }
    }

    pub fn set_input(&mut self, input: InputState) {
        self.input = input;
    }

    pub fn position(&self) -> Vec2 {
        self.body.pos
    }

    pub fn velocity(&self) -> Vec2 {
        self.body.vel
    }

    pub fn on_ground(&self) -> bool {
        self.body.on_ground
    }

    pub fn half_extents(&self) -> Vec2 {
        vec2(self.config.half_width, self.config.half_height)
    }

    pub fn world_hitbox(&self) -> Rect {
        let half = self.half_extents();
        Rect::new(
            self.body.pos.x - half.x,
            self.body.pos.y - half.y,
            half.x * 2.0,
            half.y * 2.0,
        )
    }

    pub fn aim(&self) -> f32 {
        self.aim
    }

    pub fn crouching(&self) -> bool {
        self.crouching
    }

    pub fn weapon(&self) -> &Weapon {
        &self.weapon
    }

    pub fn has_shotgun(&self) -> bool {
        self.has_shotgun
    }

    pub fn ammo(&self, kind: WeaponKind) -> Ammo {
        match kind {
            WeaponKind::Pistol => self.pistol_ammo,
            WeaponKind::Shotgun => self.shotgun_ammo,
        }
    }

    pub fn reload(&self) -> &Reload {
        &self.reload
    }

    pub fn reload_progress(&self) -> f32 {
        self.reload.progress()
    }

    pub fn damage_flash_ms(&self) -> f32 {
        self.damage_flash_ms
    }

    pub fn ground(&self) -> Option<Material> {
        self.ground
    }

    // Downward speed at the most recent landing.
    pub fn last_impact_speed(&self) -> f32 {
        self.last_impact_speed
    }

    pub fn ragdoll(&self) -> &Ragdoll {
        &self.ragdoll
    }

    pub fn place(&mut self, pos: Vec2) {
        self.body.pos = pos;
        self.body.vel = Vec2::ZERO;
        self.body.on_ground = false;
    }

    pub fn set_velocity(&mut self, vel: Vec2) {
        self.body.vel = vel;
    }

    pub fn aim_at(&mut self, target: Vec2) {
        let origin = self.body.pos + vec2(0.0, self.config.muzzle_offset_y);
        if origin != target {
            self.aim = angle_to(origin, target);
        }
    }

    pub fn muzzle_pos(&self) -> Vec2 {
        self.body.pos
            + vec2(0.0, self.config.muzzle_offset_y)
            + angle_dir(self.aim) * self.config.muzzle_forward
    }

    fn weapon_config(&self, kind: WeaponKind) -> &WeaponConfig {
        match kind {
            WeaponKind::Pistol => &self.pistol_config,
            WeaponKind::Shotgun => &self.shotgun_config,
        }
    }

    fn ammo_mut(&mut self, kind: WeaponKind) -> &mut Ammo {
        match kind {
            WeaponKind::Pistol => &mut self.pistol_ammo,
            WeaponKind::Shotgun => &mut self.shotgun_ammo,
        }
    }

    pub fn equip(&mut self, kind: WeaponKind) -> WeaponKind {
        let kind = if kind == WeaponKind::Shotgun && !self.has_shotgun {
            WeaponKind::Pistol
        } else {
            kind
        };
        if self.weapon.kind() != kind {
            self.weapon = Weapon::new(kind, self.weapon_config(kind).clone());
            log::debug!("equipped {}", kind.name());
        }
        kind
    }

    pub fn start_reload(&mut self) -> bool {
        let kind = self.weapon.kind();
        let ammo = self.ammo(kind);
        let config = self.weapon_config(kind).clone();
        self.reload.start(kind, &ammo, &config)
    }

    pub fn give_shotgun(&mut self, rounds: i32) {
        self.has_shotgun = true;
        let magazine_size = self.shotgun_config.magazine_size;
        let ammo = &mut self.shotgun_ammo;
        ammo.reserve += rounds.max(0);
        if ammo.magazine == 0 {
            ammo.refill(magazine_size);
        }
    }

    pub fn give_pistol_ammo(&mut self, rounds: i32) {
        self.pistol_ammo.reserve += rounds.max(0);
    }

    pub fn fire(&mut self, bullets: &mut Vec<Bullet>) -> bool {
        if self.reload.is_active() {
            return false;
        }
        let origin = self.muzzle_pos();
        let magazine = match self.weapon.kind() {
            WeaponKind::Pistol => &mut self.pistol_ammo.magazine,
            WeaponKind::Shotgun => &mut self.shotgun_ammo.magazine,
        };
        self.weapon.try_fire(
            origin,
            self.aim,
            self.bullet_speed,
            &mut self.body,
            bullets,
            magazine,
        )
    }

    pub fn ragdoll_drag_begin(&mut self, x: f32) {
        if !self.ragdoll.active {
            return;
        }
        self.ragdoll.dragging = true;
        self.ragdoll.last_x = x;
    }

    pub fn ragdoll_drag_move(&mut self, x: f32) {
        let r = &mut self.ragdoll;
        if !r.active || !r.dragging {
            return;
        }
        let dx = x - r.last_x;
        r.last_x = x;
        r.angular_velocity = (r.angular_velocity + dx * RAGDOLL_TORQUE_PER_PX)
            .clamp(-RAGDOLL_MAX_SPIN, RAGDOLL_MAX_SPIN);
    }

    pub fn ragdoll_drag_end(&mut self) {
        self.ragdoll.dragging = false;
    }

    fn resolve_options(&self, allow_step: bool) -> ResolveOptions {
        let opts = ResolveOptions::new(self.half_extents());
        if allow_step {
            opts.with_step(self.config.step_height)
        } else {
            opts
        }
    }

    fn steer(&mut self, dt: f32) {
        let cfg = &self.config;
        let input = &self.input;
        let on_ground = self.body.on_ground;

        let mut target_speed = cfg.walk_speed;
        if input.sprint {
            target_speed *= cfg.sprint_mult;
        }
        if on_ground {
            if let Some(material) = self.ground {
                target_speed *= material.info().friction;
            }
        }

        let move_dir = input.move_dir();
        let desired = move_dir * target_speed;
        let vx = self.body.vel.x;

        let base_accel = if on_ground { cfg.ground_accel } else { cfg.air_accel };
        let mut accel = base_accel;
        if on_ground && move_dir != 0.0 && vx.abs() < cfg.start_boost_below {
            let t = (1.0 - vx.abs() / cfg.start_boost_below).max(0.0);
            accel = base_accel + (cfg.start_boost_accel - base_accel) * t;
        }

        let max_change = accel * dt;
        let mut vx = vx + (desired - vx).clamp(-max_change, max_change);

        if move_dir == 0.0 {
            let friction = if on_ground { cfg.ground_friction } else { cfg.air_friction };
            let dec = friction * dt;
            vx = if vx.abs() <= dec { 0.0 } else { vx - dec * vx.signum() };
        }

        let hard_max = target_speed * cfg.hard_max_factor;
        self.body.vel.x = vx.clamp(-hard_max, hard_max);
    }

    fn land(&mut self, impact: f32) {
        self.last_impact_speed = impact;
        let cfg = &self.config;
        if impact <= cfg.fall_damage_min_speed {
            return;
        }
        let raw = (impact - cfg.fall_damage_min_speed) * cfg.fall_damage_scale;
        let damage = (raw.round() as i32).clamp(1, cfg.fall_damage_max.max(1));
        let below = self.body.pos + vec2(0.0, cfg.half_height);
        log::debug!("fall impact {impact:.0} deals {damage}");
        self.apply_damage(damage, Some(below));
    }

    fn update_dead(&mut self, dt: f32, ctx: &mut EntityContext<'_>) {
        self.body.vel.y += self.config.gravity * dt;
        self.body.integrate(dt);
        let opts = self.resolve_options(false);
        let resolved = self.body.resolve(ctx.map, &opts);
        self.ground = resolved.ground;
        self.ragdoll.update(dt * 1000.0);
    }
}

impl Entity for Player {
    fn kind(&self) -> EntityKind {
        EntityKind::Player
    }

    fn body(&self) -> &Body {
        &self.body
    }

    fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    fn update(&mut self, dt: f32, ctx: &mut EntityContext<'_>) {
        let dt_ms = dt * 1000.0;
        tick_down(&mut self.damage_flash_ms, dt_ms);
        tick_down(&mut self.touch_cooldown_ms, dt_ms);
        self.weapon.update(dt_ms);

        if !self.body.alive {
            self.update_dead(dt, ctx);
            return;
        }

        let pressed = self.edges.step(&self.input);
        self.aim_at(self.input.cursor);
        self.crouching = self.input.crouch;

        if self.body.is_stunned() {
            self.body.vel.x *= (-self.config.stun_damping * dt).exp();
        } else {
            self.steer(dt);
            if pressed.jump && self.body.on_ground {
                self.body.vel.y = self.config.jump_velocity;
                self.body.on_ground = false;
            }
            if pressed.fire {
                self.fire(ctx.bullets);
            }
            if pressed.reload {
                self.start_reload();
            }
            if pressed.weapon1 {
                self.equip(WeaponKind::Pistol);
            }
            if pressed.weapon2 {
                self.equip(WeaponKind::Shotgun);
            }
        }

        let was_grounded = self.body.on_ground;
        self.body.vel.y += self.config.gravity * dt;
        let impact = self.body.vel.y;
        self.body.integrate(dt);
        let opts = self.resolve_options(true);
        let resolved = self.body.resolve(ctx.map, &opts);
        self.ground = resolved.ground;

        if !was_grounded && self.body.on_ground {
            self.land(impact);
        }
        if let Some(hazard) = resolved.hazard {
            if self.touch_cooldown_ms <= 0.0 {
                self.touch_cooldown_ms = self.config.touch_damage_interval_ms;
                self.apply_damage(hazard.damage, Some(hazard.center));
            }
        }

        tick_down(&mut self.body.stun_ms, dt_ms);
        if let Some(kind) = self.reload.update(dt_ms) {
            let magazine_size = self.weapon_config(kind).magazine_size;
            let moved = self.ammo_mut(kind).refill(magazine_size);
            log::debug!("reloaded {} with {moved} rounds", kind.name());
        }
    }

    fn apply_damage(&mut self, amount: i32, source: Option<Vec2>) -> DamageOutcome {
        let outcome = self.body.take_damage(amount);
        if outcome == DamageOutcome::Ignored {
            return outcome;
        }
        let cfg = &self.config;
        self.damage_flash_ms = cfg.damage_flash_ms;
        let stun = (amount as f32 * cfg.stun_per_damage_ms).clamp(cfg.stun_min_ms, cfg.stun_max_ms);
        self.body.stun_ms = self.body.stun_ms.max(stun);
        if let Some(source) = source {
            let push = cfg.knockback_base + cfg.knockback_per_damage * amount as f32;
            self.body.push_away_from(source, push, push * 0.5);
        }
        if outcome.killed() {
            self.on_death();
        }
        outcome
    }

    fn on_death(&mut self) {
        self.ragdoll.active = true;
        self.ragdoll.body_angle = self.aim;
        self.ragdoll.angular_velocity = 0.0;
        self.body.vel.y -= self.config.death_hop;
        self.reload = Reload::Idle;
        log::info!("player died at ({:.0}, {:.0})", self.body.pos.x, self.body.pos.y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::PlayerTarget;
    use crate::map::TileMap;
    use approx::assert_abs_diff_eq;

    const DT: f32 = 1.0 / 60.0;

    fn flat_map() -> TileMap {
        let mut rows = vec![".".repeat(30); 8];
        rows.push("#".repeat(30));
        TileMap::from_rows(&rows)
    }

    fn step(player: &mut Player, map: &TileMap, input: InputState, bullets: &mut Vec<Bullet>) {
        player.set_input(input);
        let target = PlayerTarget {
            pos: player.position(),
            alive: player.is_alive(),
        };
        let mut ctx = EntityContext {
            map,
            player: target,
            bullets,
        };
        player.update(DT, &mut ctx);
    }

    fn standing_player(map: &TileMap) -> Player {
        // Floor top is y = 256; settle a few ticks.
        let mut player = Player::new(vec2(300.0, 214.0), &GameConfig::default());
        let mut bullets = Vec::new();
        for _ in 0..5 {
            step(&mut player, map, InputState::default(), &mut bullets);
        }
        player
    }

    #[test]
    fn spikes_hurt_at_most_every_half_second() {
        let mut rows = vec![".".repeat(30); 8];
        rows.push("X".repeat(30));
        let map = TileMap::from_rows(&rows);
        let mut player = Player::new(vec2(300.0, 214.0), &GameConfig::default());
        let mut bullets = Vec::new();
        let mut hits = Vec::new();
        let mut health = player.body().health;
        for tick in 1..=70 {
            step(&mut player, &map, InputState::default(), &mut bullets);
            if player.body().health < health {
                health = player.body().health;
                hits.push(tick);
            }
        }
        assert!(hits.len() >= 2, "hits {hits:?}");
        for pair in hits.windows(2) {
            assert!(pair[1] - pair[0] >= 30, "hits {hits:?}");
        }
        assert_eq!(player.body().health, 100 - 25 * hits.len() as i32);
    }

    #[test]
    fn stunned_player_only_aims() {
        let map = flat_map();
        let mut player = standing_player(&map);
        let ammo = player.ammo(WeaponKind::Pistol);
        player.body.stun_ms = 500.0;
        let origin = player.position() + vec2(0.0, player.config.muzzle_offset_y);
        let cursor = player.position() + vec2(-200.0, -150.0);
        let mut bullets = Vec::new();
        step(
            &mut player,
            &map,
            InputState {
                right: true,
                jump: true,
                fire: true,
                cursor,
                ..Default::default()
            },
            &mut bullets,
        );
        assert_eq!(player.velocity(), Vec2::ZERO);
        assert!(player.on_ground());
        assert!(bullets.is_empty());
        assert_eq!(player.ammo(WeaponKind::Pistol), ammo);
        assert_abs_diff_eq!(player.aim(), angle_to(origin, cursor), epsilon = 1e-4);
    }

    #[test]
    fn settles_on_floor() {
        let map = flat_map();
        let player = standing_player(&map);
        assert!(player.on_ground());
        assert_eq!(player.velocity().y, 0.0);
        assert_eq!(player.ground(), Some(Material::Dirt));
        assert!(player.position().y + 40.0 <= 256.0);
    }

    #[test]
    fn jump_needs_a_fresh_press() {
        let map = flat_map();
        let mut player = standing_player(&map);
        let mut bullets = Vec::new();
        let jump = InputState {
            jump: true,
            ..Default::default()
        };
        step(&mut player, &map, jump, &mut bullets);
        assert!(player.velocity().y < 0.0);
        assert!(!player.on_ground());

        for _ in 0..120 {
            step(&mut player, &map, jump, &mut bullets);
        }
        assert!(player.on_ground());
        step(&mut player, &map, jump, &mut bullets);
        assert!(player.on_ground(), "held jump must not re-trigger");
    }

    #[test]
    fn walking_reaches_material_scaled_speed() {
        let map = flat_map();
        let mut player = standing_player(&map);
        let mut bullets = Vec::new();
        let right = InputState {
            right: true,
            ..Default::default()
        };
        for _ in 0..30 {
            step(&mut player, &map, right, &mut bullets);
        }
        assert_abs_diff_eq!(player.velocity().x, 220.0 * 0.85, epsilon = 1e-2);

        for _ in 0..30 {
            step(&mut player, &map, InputState::default(), &mut bullets);
        }
        assert_eq!(player.velocity().x, 0.0);
    }

    #[test]
    fn fire_is_edge_triggered_and_spends_ammo() {
        let map = flat_map();
        let mut player = standing_player(&map);
        let mut bullets = Vec::new();
        // Level with the muzzle origin.
        let fire = InputState {
            fire: true,
            cursor: vec2(600.0, player.position().y - 20.0),
            ..Default::default()
        };
        for _ in 0..20 {
            step(&mut player, &map, fire, &mut bullets);
        }
        assert_eq!(bullets.len(), 1);
        assert_eq!(player.ammo(WeaponKind::Pistol).magazine, 11);
        assert_abs_diff_eq!(player.aim(), 0.0, epsilon = 1e-3);
        assert_abs_diff_eq!(bullets[0].vel.x, 900.0, epsilon = 0.5);
    }

    #[test]
    fn reload_tops_up_magazine() {
        let map = flat_map();
        let mut player = standing_player(&map);
        let mut bullets = Vec::new();
        for i in 0..6 {
            let input = InputState {
                fire: i % 2 == 0,
                cursor: vec2(600.0, 194.0),
                ..Default::default()
            };
            for _ in 0..10 {
                step(&mut player, &map, input, &mut bullets);
            }
        }
        assert_eq!(player.ammo(WeaponKind::Pistol).magazine, 9);

        let reload = InputState {
            reload: true,
            ..Default::default()
        };
        step(&mut player, &map, reload, &mut bullets);
        assert!(player.reload().is_active());
        for _ in 0..60 {
            step(&mut player, &map, InputState::default(), &mut bullets);
        }
        assert_eq!(player.ammo(WeaponKind::Pistol), Ammo::new(12, 45));
    }

    #[test]
    fn locked_shotgun_falls_back_to_pistol() {
        let mut player = Player::new(Vec2::ZERO, &GameConfig::default());
        assert_eq!(player.equip(WeaponKind::Shotgun), WeaponKind::Pistol);
        player.give_shotgun(6);
        assert_eq!(player.ammo(WeaponKind::Shotgun), Ammo::new(6, 0));
        assert_eq!(player.equip(WeaponKind::Shotgun), WeaponKind::Shotgun);
    }

    #[test]
    fn damage_stuns_and_knocks_back() {
        let mut player = Player::new(vec2(100.0, 100.0), &GameConfig::default());
        assert_eq!(player.apply_damage(10, Some(vec2(90.0, 100.0))), DamageOutcome::Hurt);
        assert_eq!(player.body().health, 90);
        assert_eq!(player.body().stun_ms, 600.0);
        assert_eq!(player.velocity(), vec2(100.0, 0.0));
        assert_eq!(player.damage_flash_ms(), 400.0);

        player.apply_damage(1, None);
        assert_eq!(player.body().stun_ms, 600.0);
    }

    #[test]
    fn death_enters_ragdoll_and_ignores_input() {
        let map = flat_map();
        let mut player = standing_player(&map);
        player.aim_at(player.position() + vec2(0.0, -100.0));
        assert!(player.apply_damage(500, None).killed());
        assert!(player.ragdoll().active);
        assert_abs_diff_eq!(player.ragdoll().body_angle, -std::f32::consts::FRAC_PI_2, epsilon = 1e-4);

        let mut bullets = Vec::new();
        for _ in 0..60 {
            let input = InputState {
                right: true,
                fire: true,
                ..Default::default()
            };
            step(&mut player, &map, input, &mut bullets);
        }
        assert!(bullets.is_empty());
        assert_eq!(player.velocity().x, 0.0);
        assert!(player.on_ground());
    }

    #[test]
    fn ragdoll_drag_spins_then_settles() {
        let map = flat_map();
        let mut player = standing_player(&map);
        player.ragdoll_drag_begin(0.0);
        player.ragdoll_drag_move(50.0);
        assert_eq!(player.ragdoll().angular_velocity, 0.0);

        player.apply_damage(1000, None);
        player.ragdoll_drag_begin(0.0);
        player.ragdoll_drag_move(50.0);
        assert_abs_diff_eq!(player.ragdoll().angular_velocity, 0.04, epsilon = 1e-6);
        player.ragdoll_drag_move(500.0);
        assert_eq!(player.ragdoll().angular_velocity, 0.08);
        player.ragdoll_drag_end();

        let start = player.ragdoll().body_angle;
        let mut bullets = Vec::new();
        for _ in 0..600 {
            step(&mut player, &map, InputState::default(), &mut bullets);
        }
        assert!(player.ragdoll().body_angle > start);
        assert_eq!(player.ragdoll().angular_velocity, 0.0);
    }
}
