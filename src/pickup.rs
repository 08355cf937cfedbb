use macroquad::prelude::*;

use crate::helpers::dist_sq;
use crate::player::Player;
use crate::weapon::WeaponKind;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pickup {
    pub pos: Vec2,
    pub weapon: WeaponKind,
    pub rounds: i32,
}

impl Pickup {
    pub fn pistol_ammo(pos: Vec2, rounds: i32) -> Self {
        Self {
            pos,
            weapon: WeaponKind::Pistol,
            rounds,
        }
    }

    pub fn shotgun(pos: Vec2, rounds: i32) -> Self {
        Self {
            pos,
            weapon: WeaponKind::Shotgun,
            rounds,
        }
    }

    fn apply(&self, player: &mut Player) {
        match self.weapon {
            WeaponKind::Pistol => player.give_pistol_ammo(self.rounds),
            WeaponKind::Shotgun => player.give_shotgun(self.rounds),
        }
    }
}

pub fn collect_pickups(pickups: &mut Vec<Pickup>, player: &mut Player, radius: f32) -> usize {
    let before = pickups.len();
    let pos = player.position();
    pickups.retain(|pickup| {
        if dist_sq(pos, pickup.pos) > radius * radius {
            return true;
        }
        pickup.apply(player);
        log::info!("picked up {} x{}", pickup.weapon.name(), pickup.rounds);
        false
    });
    before - pickups.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::weapon::Ammo;

    #[test]
    fn only_nearby_pickups_are_taken() {
        let mut player = Player::new(vec2(100.0, 100.0), &GameConfig::default());
        let mut pickups = vec![
            Pickup::shotgun(vec2(120.0, 100.0), 6),
            Pickup::pistol_ammo(vec2(100.0, 128.0), 12),
            Pickup::pistol_ammo(vec2(100.0, 128.5), 12),
        ];
        assert_eq!(collect_pickups(&mut pickups, &mut player, 28.0), 2);
        assert_eq!(pickups.len(), 1);
        assert!(player.has_shotgun());
        assert_eq!(player.ammo(WeaponKind::Shotgun), Ammo::new(6, 0));
        assert_eq!(player.ammo(WeaponKind::Pistol), Ammo::new(12, 60));
    }

    #[test]
    fn shotgun_pickup_keeps_loaded_magazine() {
        let mut player = Player::new(Vec2::ZERO, &GameConfig::default());
        player.give_shotgun(10);
        assert_eq!(player.ammo(WeaponKind::Shotgun), Ammo::new(8, 2));
        let mut pickups = vec![Pickup::shotgun(Vec2::ZERO, 6)];
        collect_pickups(&mut pickups, &mut player, 28.0);
        assert_eq!(player.ammo(WeaponKind::Shotgun), Ammo::new(8, 8));
    }
}
