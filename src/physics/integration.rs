//! Physics domain: per-character bodies, static terrain mirroring and
//! movement application on top of a [`PhysicsBackend`].

use bevy::prelude::*;
use std::collections::HashMap;

use super::{Aabb, CollisionResult, PhysicsBackend, StaticCollider, classify_contacts, probe_contacts};
use crate::core::PhysicsConfig;
use crate::registry::{EntityId, EntityRegistry, Platform};

#[derive(Debug, Clone, Copy)]
struct BodyRecord {
    size: Vec2,
    frozen: bool,
}

/// Intent handed to the engine for one character this frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MovementRequest {
    pub horizontal_velocity: f32,
    pub wants_jump: bool,
    pub jump_impulse: f32,
    /// Suppress ledge grabs (post-climb / post-drop debounce).
    pub ledge_grab_blocked: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovementOutcome {
    /// Engine-resolved body center.
    pub position: Vec2,
    pub collision: CollisionResult,
}

/// Bookkeeping for everything the core has put into the physics engine.
///
/// Holds no engine handle itself; [`PhysicsIntegration::bind`] pairs it with
/// a backend for the duration of a stage.
#[derive(Debug, Default)]
pub struct PhysicsIntegration {
    config: PhysicsConfig,
    ready: bool,
    bodies: HashMap<EntityId, BodyRecord>,
    statics: Vec<StaticCollider>,
    surfaces: HashMap<EntityId, Aabb>,
}

impl PhysicsIntegration {
    pub fn new(config: PhysicsConfig) -> Self {
        Self {
            config,
            ..default()
        }
    }

    /// Mark the engine as usable. Until then no body is created or moved.
    pub fn initialize(&mut self) {
        if !self.ready {
            info!("Physics engine ready");
        }
        self.ready = true;
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    pub fn has_body(&self, id: EntityId) -> bool {
        self.bodies.contains_key(&id)
    }

    pub fn is_frozen(&self, id: EntityId) -> bool {
        self.bodies.get(&id).is_some_and(|b| b.frozen)
    }

    pub fn body_size(&self, id: EntityId) -> Option<Vec2> {
        self.bodies.get(&id).map(|b| b.size)
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn static_colliders(&self) -> &[StaticCollider] {
        &self.statics
    }

    pub fn bind<'a, B: PhysicsBackend>(&'a mut self, backend: &'a mut B) -> BoundPhysics<'a, B> {
        BoundPhysics {
            state: self,
            backend,
        }
    }
}

/// [`PhysicsIntegration`] paired with the engine it drives.
pub struct BoundPhysics<'a, B: PhysicsBackend> {
    state: &'a mut PhysicsIntegration,
    backend: &'a mut B,
}

impl<B: PhysicsBackend> BoundPhysics<'_, B> {
    pub fn is_ready(&self) -> bool {
        self.state.ready
    }

    pub fn has_body(&self, id: EntityId) -> bool {
        self.state.has_body(id)
    }

    pub fn is_frozen(&self, id: EntityId) -> bool {
        self.state.is_frozen(id)
    }

    pub fn backend(&self) -> &B {
        &*self.backend
    }

    /// Create the body for a character. Calling it again replaces the shape.
    pub fn create_body(&mut self, id: EntityId, center: Vec2, size: Vec2) {
        if self.state.bodies.contains_key(&id) {
            self.backend.reshape_body(id, center, size);
        } else {
            self.backend.spawn_body(id, center, size);
            debug!("Created body for {} at {:?}", id, center);
        }
        self.state.bodies.insert(id, BodyRecord { size, frozen: false });
    }

    pub fn remove_body(&mut self, id: EntityId) {
        if self.state.bodies.remove(&id).is_some() {
            self.backend.despawn_body(id);
            debug!("Removed body for {}", id);
        }
    }

    /// Change the collider for a pose change, keeping the feet where they are.
    /// Returns the new body center.
    pub fn update_collider_size(&mut self, id: EntityId, size: Vec2) -> Option<Vec2> {
        let record = self.state.bodies.get_mut(&id)?;
        let center = self.backend.translation(id)?;
        if record.size == size {
            return Some(center);
        }

        let feet = center.y + record.size.y * 0.5;
        let new_center = Vec2::new(center.x, feet - size.y * 0.5);
        record.size = size;
        self.backend.reshape_body(id, new_center, size);
        Some(new_center)
    }

    /// Classify contacts at the current body position, then hand the
    /// requested velocity to the engine. Returns `None` for ids without a
    /// body (or whose body the engine has not materialized yet).
    pub fn apply_movement(&mut self, id: EntityId, request: MovementRequest) -> Option<MovementOutcome> {
        let record = *self.state.bodies.get(&id)?;
        let position = self.backend.translation(id)?;
        let config = &self.state.config;

        let body = Aabb::from_center(position, record.size);
        let contacts = probe_contacts(&*self.backend, &self.state.surfaces, body, config);
        let collision = classify_contacts(&contacts, body, config, request.ledge_grab_blocked);

        let current = self.backend.velocity(id).unwrap_or(Vec2::ZERO);
        let mut velocity = Vec2::new(request.horizontal_velocity, current.y.min(config.max_fall_speed));
        if request.wants_jump && collision.grounded {
            // Negative is up.
            velocity.y = -request.jump_impulse;
        }
        self.backend.set_velocity(id, velocity);

        Some(MovementOutcome {
            position,
            collision,
        })
    }

    pub fn get_velocity(&self, id: EntityId) -> Option<Vec2> {
        if !self.state.has_body(id) {
            return None;
        }
        self.backend.velocity(id)
    }

    pub fn get_position(&self, id: EntityId) -> Option<Vec2> {
        if !self.state.has_body(id) {
            return None;
        }
        self.backend.translation(id)
    }

    pub fn set_velocity(&mut self, id: EntityId, velocity: Vec2) {
        if self.state.has_body(id) {
            self.backend.set_velocity(id, velocity);
        }
    }

    pub fn set_position(&mut self, id: EntityId, center: Vec2) {
        if self.state.has_body(id) {
            self.backend.set_translation(id, center);
        }
    }

    /// Pin the body at `center` with zero velocity and no gravity. Repeated
    /// calls only re-pin.
    pub fn freeze(&mut self, id: EntityId, center: Vec2) {
        let Some(record) = self.state.bodies.get_mut(&id) else {
            return;
        };
        self.backend.set_translation(id, center);
        self.backend.set_velocity(id, Vec2::ZERO);
        if !record.frozen {
            record.frozen = true;
            self.backend.set_gravity_scale(id, 0.0);
            self.backend.set_kinematic(id, true);
        }
    }

    /// Release a frozen body, optionally seeding its velocity. No-op when the
    /// body is not frozen.
    pub fn unfreeze(&mut self, id: EntityId, vx: Option<f32>, vy: Option<f32>) {
        let Some(record) = self.state.bodies.get_mut(&id) else {
            return;
        };
        if !record.frozen {
            return;
        }
        record.frozen = false;
        self.backend.set_kinematic(id, false);
        self.backend.set_gravity_scale(id, 1.0);

        if vx.is_some() || vy.is_some() {
            let current = self.backend.velocity(id).unwrap_or(Vec2::ZERO);
            let seeded = Vec2::new(vx.unwrap_or(current.x), vy.unwrap_or(current.y));
            self.backend.set_velocity(id, seeded);
        }
    }

    /// Rebuild the static terrain colliders from the registry's platforms.
    pub fn sync_static_colliders(&mut self, registry: &EntityRegistry) {
        self.state.statics.clear();
        self.state.surfaces.clear();
        for (id, pos, platform) in registry.placed::<Platform>() {
            let bounds = Aabb::from_center(pos.0, platform.size());
            self.state.statics.push(StaticCollider { id, bounds });
            self.state.surfaces.insert(id, bounds);
        }
        self.backend.rebuild_statics(&self.state.statics);
    }

    pub fn step(&mut self, dt: f32) {
        if self.state.ready {
            self.backend.step(dt);
        }
    }

    /// Remove every body and static collider.
    pub fn release_all(&mut self) {
        let ids: Vec<EntityId> = self.state.bodies.keys().copied().collect();
        for id in ids {
            self.remove_body(id);
        }
        self.state.statics.clear();
        self.state.surfaces.clear();
        self.backend.rebuild_statics(&[]);
    }
}
