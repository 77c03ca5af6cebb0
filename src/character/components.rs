//! Character domain: per-character state owned by the simulation.

use bevy::prelude::*;
use serde::Serialize;

use super::{CharacterFlags, GrappleState};
use crate::core::{HitboxSize, MovementConfig};
use crate::registry::{EntityId, EntityRegistry, Position, Velocity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Role {
    Player,
    /// AI-driven ally. `slot` is its spawn order, used for follow spacing.
    Companion { slot: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Facing {
    #[default]
    Right,
    Left,
}

impl Facing {
    pub fn sign(self) -> f32 {
        match self {
            Facing::Right => 1.0,
            Facing::Left => -1.0,
        }
    }

    /// Facing for a horizontal direction; zero keeps `self`.
    pub fn toward(self, direction: f32) -> Facing {
        if direction > 0.0 {
            Facing::Right
        } else if direction < 0.0 {
            Facing::Left
        } else {
            self
        }
    }
}

/// Simulation-clock timestamps (seconds) that gate abilities.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AbilityTimers {
    pub climbed_at: Option<f32>,
    pub dropped_at: Option<f32>,
    pub wall_jumped_at: Option<f32>,
    pub roll_ready_at: f32,
}

/// A player or companion. Position and velocity live in the registry under
/// `id`; everything else the state machine needs lives here.
#[derive(Debug, Clone)]
pub struct Character {
    pub id: EntityId,
    pub role: Role,
    pub flags: CharacterFlags,
    pub facing: Facing,
    pub grapple: GrappleState,
    pub timers: AbilityTimers,
    /// Top edge of the ledge held while hanging.
    pub hang_ledge_y: Option<f32>,
    /// Jump requested by commands, consumed by the next movement request.
    pub pending_jump: bool,
}

impl Character {
    pub fn new(id: EntityId, role: Role) -> Self {
        Self {
            id,
            role,
            flags: CharacterFlags::GROUNDED,
            facing: Facing::Right,
            grapple: GrappleState::Idle,
            timers: AbilityTimers::default(),
            hang_ledge_y: None,
            pending_jump: false,
        }
    }

    pub fn is_player(&self) -> bool {
        self.role == Role::Player
    }

    pub fn has(&self, flag: CharacterFlags) -> bool {
        self.flags.contains(flag)
    }

    pub fn is_grounded(&self) -> bool {
        self.has(CharacterFlags::GROUNDED)
    }

    pub fn is_hanging(&self) -> bool {
        self.has(CharacterFlags::WALL_HANGING)
    }

    pub fn is_dead(&self) -> bool {
        self.has(CharacterFlags::DEAD)
    }

    pub fn is_swinging(&self) -> bool {
        self.grapple.is_active()
    }

    pub fn wall_on_left(&self) -> bool {
        self.has(CharacterFlags::WALL_LEFT)
    }

    /// Current collider for the character's pose.
    pub fn hitbox(&self, config: &MovementConfig) -> HitboxSize {
        if self.is_hanging() {
            config.hang_hitbox
        } else if self.has(CharacterFlags::CROUCHING) {
            config.crouch_hitbox
        } else {
            config.standing_hitbox
        }
    }

    /// True inside the window after leaving a wall by climbing, dropping or
    /// jumping off it.
    pub fn ledge_grab_blocked(&self, now: f32, config: &MovementConfig) -> bool {
        let recent = |at: Option<f32>, window: f32| at.is_some_and(|t| now - t < window);
        recent(self.timers.climbed_at, config.climb_debounce)
            || recent(self.timers.wall_jumped_at, config.climb_debounce)
            || recent(self.timers.dropped_at, config.drop_debounce)
    }
}

/// Working copy of a character's registry position and velocity.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Kinematics {
    pub position: Vec2,
    pub velocity: Vec2,
}

impl Kinematics {
    pub fn load(registry: &EntityRegistry, id: EntityId) -> Option<Self> {
        let position = registry.get::<Position>(id)?.0;
        let velocity = registry.get::<Velocity>(id).map_or(Vec2::ZERO, |v| v.0);
        Some(Self { position, velocity })
    }

    pub fn store(&self, registry: &mut EntityRegistry, id: EntityId) {
        registry.add(id, Position(self.position));
        registry.add(id, Velocity(self.velocity));
    }
}
