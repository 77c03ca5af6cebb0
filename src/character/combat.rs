//! Character domain: hit boxes for melee and body contact.

use bevy::prelude::*;

use super::Facing;
use crate::core::{CombatConfig, HitboxSize};
use crate::physics::Aabb;
use crate::registry::EnemyKind;

/// Sword box in front of a character at `position` facing `facing`.
pub fn sword_hitbox(position: Vec2, facing: Facing, config: &CombatConfig) -> Aabb {
    let reach = config.sword_offset_x + config.sword_width * 0.5;
    let center = Vec2::new(
        position.x + reach * facing.sign(),
        position.y + config.sword_offset_y,
    );
    Aabb::from_center(center, Vec2::new(config.sword_width, config.sword_height))
}

pub fn enemy_size(kind: EnemyKind, config: &CombatConfig) -> f32 {
    match kind {
        EnemyKind::Flyer => config.flyer_size,
        EnemyKind::Walker | EnemyKind::Spiker => config.enemy_size,
    }
}

pub fn enemy_bounds(position: Vec2, kind: EnemyKind, config: &CombatConfig) -> Aabb {
    Aabb::from_center(position, Vec2::splat(enemy_size(kind, config)))
}

pub fn character_bounds(position: Vec2, hitbox: HitboxSize) -> Aabb {
    Aabb::from_center(position, hitbox.size())
}
