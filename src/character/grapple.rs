//! Character domain: grapple attachment and pendulum swing.
//!
//! A swinging character is moved here, not by the physics engine. The body
//! is left alone until release, when the caller re-seats it at the swing
//! position with the release velocity.

use bevy::prelude::*;

use super::{Character, CharacterFlags, Kinematics};
use crate::core::MovementConfig;
use crate::physics::Aabb;
use crate::registry::{EntityId, EntityRegistry, Platform, Position};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Swing {
    /// Platform the rope is attached to.
    pub anchor: EntityId,
    /// Rope attachment point.
    pub pivot: Vec2,
    pub rope_length: f32,
    /// Angle of the character around the pivot, in Y-down world space.
    pub angle: f32,
    pub angular_velocity: f32,
}

impl Swing {
    pub fn position(&self) -> Vec2 {
        self.pivot + Vec2::from_angle(self.angle) * self.rope_length
    }

    /// Tangential velocity along the arc.
    pub fn velocity(&self) -> Vec2 {
        let speed = self.angular_velocity * self.rope_length;
        Vec2::new(-speed * self.angle.sin(), speed * self.angle.cos())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum GrappleState {
    #[default]
    Idle,
    Swinging(Swing),
}

impl GrappleState {
    pub fn is_active(&self) -> bool {
        matches!(self, GrappleState::Swinging(_))
    }

    pub fn anchor(&self) -> Option<EntityId> {
        self.swing().map(|s| s.anchor)
    }

    pub fn swing(&self) -> Option<&Swing> {
        match self {
            GrappleState::Swinging(swing) => Some(swing),
            GrappleState::Idle => None,
        }
    }
}

fn platform_bounds(registry: &EntityRegistry, id: EntityId) -> Option<Aabb> {
    let pos = registry.get::<Position>(id)?;
    let platform = registry.get::<Platform>(id)?;
    Some(Aabb::from_center(pos.0, platform.size()))
}

/// Platform under `target` within `padding`. A hinted platform is the only
/// one considered; without a hint the first match in table order wins.
pub fn find_anchor(
    registry: &EntityRegistry,
    target: Vec2,
    hint: Option<EntityId>,
    padding: f32,
) -> Option<EntityId> {
    match hint {
        Some(id) => platform_bounds(registry, id)
            .filter(|bounds| bounds.contains_padded(target, padding))
            .map(|_| id),
        None => registry
            .placed::<Platform>()
            .find(|(_, pos, platform)| {
                Aabb::from_center(pos.0, platform.size()).contains_padded(target, padding)
            })
            .map(|(id, _, _)| id),
    }
}

impl Character {
    /// Attach to `target`. Fails without touching any state when the
    /// character cannot grapple right now, the target is out of reach, or
    /// no platform lies under it.
    pub fn start_grapple(
        &mut self,
        kin: &Kinematics,
        target: Vec2,
        platform: Option<EntityId>,
        registry: &EntityRegistry,
        config: &MovementConfig,
    ) -> bool {
        if self.is_dead() || self.is_swinging() || self.is_hanging() {
            return false;
        }

        let offset = kin.position - target;
        let distance = offset.length();
        if distance > config.grapple_max_distance || distance <= f32::EPSILON {
            return false;
        }

        let Some(anchor) = find_anchor(registry, target, platform, config.grapple_padding) else {
            return false;
        };

        let angle = offset.y.atan2(offset.x);
        let tangent = -kin.velocity.x * angle.sin() + kin.velocity.y * angle.cos();

        self.grapple = GrappleState::Swinging(Swing {
            anchor,
            pivot: target,
            rope_length: distance,
            angle,
            angular_velocity: tangent / distance,
        });
        self.flags
            .remove(CharacterFlags::GROUNDED | CharacterFlags::CROUCHING | CharacterFlags::WALL_STATES);
        self.pending_jump = false;

        info!(
            "{} grappled platform {} (rope {:.0})",
            self.id, anchor, distance
        );
        true
    }

    /// Let go of the rope, converting the swing into linear velocity.
    /// Returns the release velocity, or `None` when not swinging.
    pub fn release_grapple(&mut self, kin: &mut Kinematics, config: &MovementConfig) -> Option<Vec2> {
        let swing = *self.grapple.swing()?;
        self.grapple = GrappleState::Idle;

        let arc = swing.velocity();
        let mut velocity = Vec2::new(arc.x * config.release_boost, arc.y);
        if arc.y < 0.0 {
            velocity.y = arc.y * config.release_boost - config.release_lift;
        }
        kin.velocity = velocity;

        debug!("{} released grapple with {:?}", self.id, velocity);
        Some(velocity)
    }

    /// Advance the pendulum one step. Reaching ground level lands the
    /// character and releases the rope; returns true in that case.
    pub fn update_grapple(
        &mut self,
        kin: &mut Kinematics,
        dt: f32,
        ground_y: f32,
        gravity: f32,
        config: &MovementConfig,
    ) -> bool {
        let GrappleState::Swinging(swing) = &mut self.grapple else {
            return false;
        };

        swing.angular_velocity += gravity / swing.rope_length * swing.angle.cos() * dt;
        swing.angular_velocity *= config.swing_damping;
        swing.angle += swing.angular_velocity * dt;

        kin.position = swing.position();
        kin.velocity = swing.velocity();
        self.facing = self.facing.toward(kin.velocity.x);

        let ground_level = ground_y - config.standing_hitbox.half_height();
        if kin.position.y >= ground_level {
            kin.position.y = ground_level;
            self.release_grapple(kin, config);
            self.flags.insert(CharacterFlags::GROUNDED);
            return true;
        }
        false
    }
}
