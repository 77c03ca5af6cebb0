//! Sim domain: the per-frame state handed to presentation.

use serde::Serialize;

use super::Simulation;
use crate::character::{CharacterFlags, Facing, Role, enemy_size};
use crate::core::RunState;
use crate::registry::{Enemy, EnemyKind, EntityId, Platform, Position};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CharacterSnapshot {
    pub id: EntityId,
    pub role: Role,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub facing: Facing,
    pub flags: u16,
    pub width: f32,
    pub height: f32,
    pub grappling: bool,
    pub anchor: Option<EntityId>,
}

impl CharacterSnapshot {
    pub fn has(&self, flag: CharacterFlags) -> bool {
        self.flags & flag.bits() == flag.bits()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TerrainSnapshot {
    pub id: EntityId,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnemySnapshot {
    pub id: EntityId,
    pub kind: EnemyKind,
    pub x: f32,
    pub y: f32,
    pub size: f32,
}

/// Resolved world state after all stages of one frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FrameSnapshot {
    pub frame: u64,
    pub time: f32,
    pub score: u32,
    pub break_x: f32,
    pub frontier: f32,
    pub run_state: RunState,
    pub characters: Vec<CharacterSnapshot>,
    pub platforms: Vec<TerrainSnapshot>,
    pub ground_tiles: Vec<TerrainSnapshot>,
    pub enemies: Vec<EnemySnapshot>,
}

impl FrameSnapshot {
    pub fn capture(sim: &Simulation) -> Self {
        let config = sim.config();
        let registry = sim.registry();

        let characters = sim
            .characters()
            .iter()
            .filter_map(|character| {
                let position = sim.position(character.id)?;
                let velocity = sim.velocity(character.id).unwrap_or_default();
                let hitbox = character.hitbox(&config.movement);
                Some(CharacterSnapshot {
                    id: character.id,
                    role: character.role,
                    x: position.x,
                    y: position.y,
                    vx: velocity.x,
                    vy: velocity.y,
                    facing: character.facing,
                    flags: character.flags.bits(),
                    width: hitbox.width,
                    height: hitbox.height,
                    grappling: character.is_swinging(),
                    anchor: character.grapple.anchor(),
                })
            })
            .collect();

        let (ground_tiles, platforms): (Vec<_>, Vec<_>) = registry
            .placed::<Platform>()
            .partition(|(_, _, platform)| platform.is_ground);
        let terrain = |rows: Vec<(EntityId, Position, Platform)>| {
            rows.into_iter()
                .map(|(id, pos, platform)| TerrainSnapshot {
                    id,
                    x: pos.0.x,
                    y: pos.0.y,
                    width: platform.width,
                    height: platform.height,
                })
                .collect::<Vec<_>>()
        };

        let enemies = registry
            .placed::<Enemy>()
            .map(|(id, pos, enemy)| EnemySnapshot {
                id,
                kind: enemy.kind,
                x: pos.0.x,
                y: pos.0.y,
                size: enemy_size(enemy.kind, &config.combat),
            })
            .collect();

        Self {
            frame: sim.frame(),
            time: sim.time(),
            score: sim.score(),
            break_x: sim.scroller().break_x(),
            frontier: sim.scroller().frontier(),
            run_state: sim.run_state(),
            characters,
            platforms: terrain(platforms),
            ground_tiles: terrain(ground_tiles),
            enemies,
        }
    }

    pub fn character(&self, id: EntityId) -> Option<&CharacterSnapshot> {
        self.characters.iter().find(|c| c.id == id)
    }
}
