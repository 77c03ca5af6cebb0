//! Sim domain: enemy spawning, movement and culling.

use bevy::prelude::*;
use rand::Rng;

use crate::character::enemy_size;
use crate::core::{CombatConfig, WorldConfig};
use crate::physics::Aabb;
use crate::registry::{Enemy, EnemyKind, EntityId, EntityRegistry, Platform, Position, Velocity};

/// Walkers patrol just above the ground surface.
const WALKER_LIFT: f32 = 18.0;
/// Spikers hover at head height.
const SPIKER_LIFT: f32 = 70.0;
/// Flyers stay within this band of the view height.
const FLYER_BAND: (f32, f32) = (0.25, 0.5);

/// Spawn a random enemy beyond the right edge of the view, ahead of `player_x`.
pub fn spawn_enemy(
    registry: &mut EntityRegistry,
    rng: &mut impl Rng,
    player_x: f32,
    config: &WorldConfig,
) -> EntityId {
    let kind = EnemyKind::ALL[rng.random_range(0..EnemyKind::ALL.len())];
    let y = match kind {
        EnemyKind::Walker => config.ground_y - WALKER_LIFT,
        EnemyKind::Flyer => {
            rng.random_range(config.height * FLYER_BAND.0..=config.height * FLYER_BAND.1)
        }
        EnemyKind::Spiker => config.ground_y - SPIKER_LIFT,
    };
    let speed = config.break_rate
        + rng.random_range(config.enemy_speed_bonus_min..=config.enemy_speed_bonus_max);
    let x = player_x + config.width + config.enemy_spawn_ahead;

    let id = registry.spawn_enemy(Vec2::new(x, y), Enemy { kind, speed });
    debug!("Spawned {:?} {} at ({:.0}, {:.0})", kind, id, x, y);
    id
}

/// Move every enemy along its velocity, push it out of floating platforms
/// and cull the ones left behind the break line. Returns the culled ids.
pub fn update_enemies(
    registry: &mut EntityRegistry,
    dt: f32,
    break_x: f32,
    world: &WorldConfig,
    combat: &CombatConfig,
) -> Vec<EntityId> {
    let surfaces: Vec<Aabb> = registry
        .placed::<Platform>()
        .filter(|(_, _, platform)| !platform.is_ground)
        .map(|(_, pos, platform)| Aabb::from_center(pos.0, platform.size()))
        .collect();

    let enemies: Vec<(EntityId, Vec2, Enemy)> = registry
        .placed::<Enemy>()
        .map(|(id, pos, enemy)| (id, pos.0, enemy))
        .collect();

    let mut culled = Vec::new();
    for (id, position, enemy) in enemies {
        let velocity = registry.get::<Velocity>(id).map_or(Vec2::ZERO, |v| v.0);
        let half = enemy_size(enemy.kind, combat) * 0.5;
        let mut next = position + velocity * dt;

        for surface in &surfaces {
            let body = Aabb::from_center(next, Vec2::splat(half * 2.0));
            if !body.overlaps(surface) {
                continue;
            }
            if velocity.x < 0.0 {
                next.x = surface.max.x + half + 1.0;
            } else if velocity.x > 0.0 {
                next.x = surface.min.x - half - 1.0;
            }
        }

        if next.x < break_x - world.enemy_cull_margin {
            registry.destroy(id);
            culled.push(id);
            continue;
        }
        registry.add(id, Position(next));
    }
    culled
}
