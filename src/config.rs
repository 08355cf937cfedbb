use serde::Deserialize;
use std::path::Path;

use crate::weapon::WeaponConfig;

#[derive(Debug)]
pub enum ConfigLoadError {
    Io(std::io::Error),
    Yaml(serde_yaml::Error),
    Invalid(String),
}

impl std::fmt::Display for ConfigLoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "io error: {err}"),
            Self::Yaml(err) => write!(f, "yaml error: {err}"),
            Self::Invalid(err) => write!(f, "invalid config: {err}"),
        }
    }
}

impl std::error::Error for ConfigLoadError {}

impl From<std::io::Error> for ConfigLoadError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_yaml::Error> for ConfigLoadError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Yaml(err)
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub world: WorldConfig,
    pub player: PlayerConfig,
    pub enemy: EnemyConfig,
    pub boss: BossConfig,
    pub pistol: WeaponConfig,
    pub shotgun: WeaponConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            world: WorldConfig::default(),
            player: PlayerConfig::default(),
            enemy: EnemyConfig::default(),
            boss: BossConfig::default(),
            pistol: WeaponConfig::pistol(),
            shotgun: WeaponConfig::shotgun(),
        }
    }
}

impl GameConfig {
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigLoadError> {
        let path = path.as_ref();
        if !path.exists() {
            log::warn!("config {} not found, using defaults", path.display());
            return Ok(Self::default());
        }
        let config = Self::from_yaml_str(&std::fs::read_to_string(path)?)?;
        log::info!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self, ConfigLoadError> {
        let config: Self = serde_yaml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.world.max_dt <= 0.0 {
            return Err(ConfigLoadError::Invalid("world.max_dt must be positive".into()));
        }
        if self.player.half_width <= 0.0 || self.player.half_height <= 0.0 {
            return Err(ConfigLoadError::Invalid("player extents must be positive".into()));
        }
        if self.player.max_health <= 0 || self.enemy.max_health <= 0 || self.boss.max_health <= 0 {
            return Err(ConfigLoadError::Invalid("max_health must be positive".into()));
        }
        if self.boss.phase_secs <= 0.0 {
            return Err(ConfigLoadError::Invalid("boss.phase_secs must be positive".into()));
        }
        for (name, weapon) in [("pistol", &self.pistol), ("shotgun", &self.shotgun)] {
            if weapon.magazine_size <= 0 || weapon.pellets == 0 {
                return Err(ConfigLoadError::Invalid(format!(
                    "{name} needs a magazine and at least one pellet"
                )));
            }
            if weapon.ammo_per_shot < 1 {
                return Err(ConfigLoadError::Invalid(format!(
                    "{name}.ammo_per_shot must be at least 1"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub max_dt: f32,
    pub bullet_speed: f32,
    pub player_hit_radius: f32,
    pub crouch_hit_radius: f32,
    pub entity_hit_padding: f32,
    pub default_player_damage: i32,
    pub default_enemy_damage: i32,
    pub bullet_cull_depth: f32,
    pub player_kill_depth: f32,
    pub pickup_radius: f32,
    pub separation_damping: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            max_dt: 0.1,
            bullet_speed: 900.0,
            player_hit_radius: 18.0,
            crouch_hit_radius: 12.0,
            entity_hit_padding: 3.0,
            default_player_damage: 10,
            default_enemy_damage: 8,
            bullet_cull_depth: 400.0,
            player_kill_depth: 200.0,
            pickup_radius: 28.0,
            separation_damping: 0.8,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub half_width: f32,
    pub half_height: f32,
    pub max_health: i32,
    pub gravity: f32,
    pub walk_speed: f32,
    pub sprint_mult: f32,
    pub jump_velocity: f32,
    pub ground_accel: f32,
    pub start_boost_accel: f32,
    pub start_boost_below: f32,
    pub air_accel: f32,
    pub ground_friction: f32,
    pub air_friction: f32,
    pub hard_max_factor: f32,
    pub fall_damage_min_speed: f32,
    pub fall_damage_scale: f32,
    pub fall_damage_max: i32,
    pub step_height: f32,
    pub pistol_magazine: i32,
    pub pistol_reserve: i32,
    pub muzzle_offset_y: f32,
    pub muzzle_forward: f32,
    pub stun_per_damage_ms: f32,
    pub stun_min_ms: f32,
    pub stun_max_ms: f32,
    pub knockback_base: f32,
    pub knockback_per_damage: f32,
    pub damage_flash_ms: f32,
    pub death_hop: f32,
    pub stun_damping: f32,
    pub touch_damage_interval_ms: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            half_width: 28.0,
            half_height: 40.0,
            max_health: 100,
            gravity: 1700.0,
            walk_speed: 220.0,
            sprint_mult: 1.8,
            jump_velocity: -700.0,
            ground_accel: 4500.0,
            start_boost_accel: 8500.0,
            start_boost_below: 60.0,
            air_accel: 1200.0,
            ground_friction: 4000.0,
            air_friction: 600.0,
            hard_max_factor: 1.1,
            fall_damage_min_speed: 900.0,
            fall_damage_scale: 0.03,
            fall_damage_max: 200,
            step_height: 12.0,
            pistol_magazine: 12,
            pistol_reserve: 48,
            muzzle_offset_y: -20.0,
            muzzle_forward: 28.0,
            stun_per_damage_ms: 60.0,
            stun_min_ms: 80.0,
            stun_max_ms: 1200.0,
            knockback_base: 40.0,
            knockback_per_damage: 6.0,
            damage_flash_ms: 400.0,
            death_hop: 220.0,
            stun_damping: 8.0,
            touch_damage_interval_ms: 500.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct EnemyConfig {
    pub max_health: i32,
    pub radius: f32,
    pub speed: f32,
    pub aggro_range: f32,
    pub fire_range: f32,
    pub fire_cooldown_ms: f32,
    pub bullets_per_shot: u32,
    pub bullet_spread: f32,
    pub bullet_speed: f32,
    pub bullet_life_ms: f32,
    pub bullet_damage: i32,
    pub gravity: f32,
    pub recoil_x: f32,
    pub recoil_y: f32,
    pub stun_decay: f32,
    pub death_hop: f32,
    pub knockback_x: f32,
    pub knockback_y: f32,
    pub patrol_half_span: f32,
}

impl Default for EnemyConfig {
    fn default() -> Self {
        Self {
            max_health: 40,
            radius: 14.0,
            speed: 60.0,
            aggro_range: 400.0,
            fire_range: 380.0,
            fire_cooldown_ms: 900.0,
            bullets_per_shot: 1,
            bullet_spread: 0.0,
            bullet_speed: 700.0,
            bullet_life_ms: 1800.0,
            bullet_damage: 8,
            gravity: 1500.0,
            recoil_x: 60.0,
            recoil_y: 20.0,
            stun_decay: 0.9,
            death_hop: 120.0,
            knockback_x: 4.0,
            knockback_y: 2.0,
            patrol_half_span: 80.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct BossConfig {
    pub max_health: i32,
    pub radius: f32,
    pub speed: f32,
    pub gravity: f32,
    pub dead_gravity: f32,
    pub track_dead_zone: f32,
    pub bob_amplitude: f32,
    pub bob_frequency: f32,
    pub phase_secs: f32,
    pub bullet_speed: f32,
    pub bullet_life_ms: f32,
    pub bullet_damage: i32,
    pub burst_shots: u32,
    pub burst_interval_ms: f32,
    pub burst_pellets: u32,
    pub burst_spread: f32,
    pub burst_speed_mult: f32,
    pub rapid_interval_ms: f32,
    pub rapid_speed_mult: f32,
    pub dash_strength: f32,
    pub dash_vertical_mult: f32,
    // X tracking is suspended this long after a dash.
    pub dash_ms: f32,
    pub volley_delay_ms: f32,
    pub volley_pellets: u32,
    pub volley_spread: f32,
    pub volley_speed_mult: f32,
    pub volley_damage: i32,
    pub volley_cooldown_ms: f32,
    pub death_hop: f32,
    pub knockback_x: f32,
    pub knockback_y: f32,
    pub spawn_lift: f32,
}

impl Default for BossConfig {
    fn default() -> Self {
        Self {
            max_health: 500,
            radius: 36.0,
            speed: 90.0,
            gravity: 800.0,
            dead_gravity: 2000.0,
            track_dead_zone: 8.0,
            bob_amplitude: 6.0,
            bob_frequency: 2.0,
            phase_secs: 8.0,
            bullet_speed: 640.0,
            bullet_life_ms: 2100.0,
            bullet_damage: 12,
            burst_shots: 3,
            burst_interval_ms: 300.0,
            burst_pellets: 8,
            burst_spread: 1.2,
            burst_speed_mult: 0.9,
            rapid_interval_ms: 420.0,
            rapid_speed_mult: 1.1,
            dash_strength: 550.0,
            dash_vertical_mult: 0.3,
            dash_ms: 250.0,
            volley_delay_ms: 1200.0,
            volley_pellets: 18,
            volley_spread: 2.2,
            volley_speed_mult: 0.75,
            volley_damage: 8,
            volley_cooldown_ms: 2200.0,
            death_hop: 300.0,
            knockback_x: 4.0,
            knockback_y: 2.0,
            spawn_lift: 10.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_yaml_keeps_other_defaults() {
        let config = GameConfig::from_yaml_str(
            "player:\n  gravity: 1200.0\nenemy:\n  aggro_range: 250.0\n",
        )
        .unwrap();
        assert_eq!(config.player.gravity, 1200.0);
        assert_eq!(config.player.walk_speed, 220.0);
        assert_eq!(config.enemy.aggro_range, 250.0);
        assert_eq!(config.boss, BossConfig::default());
        assert_eq!(config.shotgun.pellets, 6);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = GameConfig::load_from(dir.path().join("nope.yaml")).unwrap();
        assert_eq!(config, GameConfig::default());
    }

    #[test]
    fn reads_file_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "boss:\n  phase_secs: 4.0").unwrap();
        let config = GameConfig::load_from(file.path()).unwrap();
        assert_eq!(config.boss.phase_secs, 4.0);
    }

    #[test]
    fn rejects_nonsense_values() {
        let err = GameConfig::from_yaml_str("boss:\n  phase_secs: 0.0\n").unwrap_err();
        assert!(matches!(err, ConfigLoadError::Invalid(_)));

        let mut config = GameConfig::default();
        config.shotgun.ammo_per_shot = 0;
        assert!(matches!(config.validate(), Err(ConfigLoadError::Invalid(_))));

        let err = GameConfig::from_yaml_str("player: [1, 2]").unwrap_err();
        assert!(matches!(err, ConfigLoadError::Yaml(_)));
    }
}
