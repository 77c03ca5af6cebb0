//! Steering domain: AI companions driven through the same `CommandSet` the
//! player's input produces.
//!
//! Ground state must be refreshed with [`SteeringModule::update_ground_state`]
//! every frame before any [`SteeringModule::get_commands`] call.

mod brain;
mod navigation;


use bevy::prelude::*;
use std::collections::BTreeMap;

pub use brain::{CompanionBrain, Mode, Side, Surroundings};
pub use navigation::{
    BREAK_SAFETY_MARGIN, GroundState, Obstacle, detect_obstacle, grapple_target, nearest_enemy,
    platform_ahead,
};

use crate::character::{Character, CharacterFlags, CommandSet, Facing};
use crate::core::{BehaviorConfig, SimConfig};
use crate::registry::{EntityId, EntityRegistry};

/// What steering needs to know about one character this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CharacterView {
    pub id: EntityId,
    pub position: Vec2,
    pub grounded: bool,
    pub attacking: bool,
    pub rolling: bool,
    /// A roll runs this way whatever the move axis says.
    pub facing: Facing,
    /// Rope pivot while swinging.
    pub grapple_pivot: Option<Vec2>,
}

impl CharacterView {
    pub fn of(character: &Character, position: Vec2) -> Self {
        Self {
            id: character.id,
            position,
            grounded: character.is_grounded(),
            attacking: character.has(CharacterFlags::ATTACKING),
            rolling: character.has(CharacterFlags::ROLLING),
            facing: character.facing,
            grapple_pivot: character.grapple.swing().map(|swing| swing.pivot),
        }
    }

    pub fn swinging(&self) -> bool {
        self.grapple_pivot.is_some()
    }
}

/// Registered companions and the terrain facts they steer by.
#[derive(Debug, Clone)]
pub struct SteeringModule {
    companions: BTreeMap<EntityId, CompanionBrain>,
    ground: GroundState,
    max_companions: usize,
    seed: u64,
    standing_height: f32,
    crouch_height: f32,
    grapple_max_distance: f32,
}

impl SteeringModule {
    pub fn new(config: &SimConfig) -> Self {
        Self {
            companions: BTreeMap::new(),
            ground: GroundState {
                ground_y: config.world.ground_y,
                break_x: 0.0,
            },
            max_companions: config.world.max_allies,
            seed: config.world.seed,
            standing_height: config.movement.standing_hitbox.height,
            crouch_height: config.movement.crouch_hitbox.height,
            grapple_max_distance: config.movement.grapple_max_distance,
        }
    }

    /// Start steering `character`. Returns false without effect when the
    /// companion cap is reached or it is already registered.
    pub fn register_companion(&mut self, character: EntityId, behavior: BehaviorConfig) -> bool {
        if self.companions.contains_key(&character) {
            return false;
        }
        if self.companions.len() >= self.max_companions {
            debug!("Companion cap reached, not steering {}", character);
            return false;
        }

        let side = Side::for_slot(self.companions.len());
        let seed = self.seed ^ (u64::from(character.0) << 16);
        self.companions
            .insert(character, CompanionBrain::new(behavior, side, seed));
        true
    }

    pub fn unregister_companion(&mut self, character: EntityId) -> bool {
        self.companions.remove(&character).is_some()
    }

    pub fn is_registered(&self, character: EntityId) -> bool {
        self.companions.contains_key(&character)
    }

    pub fn companion_count(&self) -> usize {
        self.companions.len()
    }

    pub fn brain(&self, character: EntityId) -> Option<&CompanionBrain> {
        self.companions.get(&character)
    }

    /// Stop all companion AI.
    pub fn clear(&mut self) {
        self.companions.clear();
        self.ground.break_x = 0.0;
    }

    pub fn update_ground_state(&mut self, ground_y: f32, break_x: f32) {
        self.ground = GroundState { ground_y, break_x };
    }

    pub fn ground_state(&self) -> GroundState {
        self.ground
    }

    /// Commands for companion `me` following `leader`. Unregistered
    /// characters get an idle command set.
    pub fn get_commands(
        &mut self,
        me: &CharacterView,
        leader: &CharacterView,
        registry: &EntityRegistry,
        time: f32,
    ) -> CommandSet {
        let world = Surroundings {
            registry,
            ground: self.ground,
            standing_height: self.standing_height,
            crouch_height: self.crouch_height,
            grapple_max_distance: self.grapple_max_distance,
        };

        match self.companions.get_mut(&me.id) {
            Some(brain) => brain.decide(me, leader, &world, time),
            None => CommandSet::default(),
        }
    }
}
