//! Physics domain: the narrow contract the core drives an engine through.

use bevy::prelude::*;

use crate::registry::EntityId;

/// Axis-aligned box in world space (Y-down: `min.y` is the top edge).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn from_center(center: Vec2, size: Vec2) -> Self {
        let half = size * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    pub fn top(&self) -> f32 {
        self.min.y
    }

    pub fn bottom(&self) -> f32 {
        self.max.y
    }

    /// Strict overlap; boxes that only share an edge do not overlap.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
    }

    pub fn contains_padded(&self, point: Vec2, padding: f32) -> bool {
        point.x >= self.min.x - padding
            && point.x <= self.max.x + padding
            && point.y >= self.min.y - padding
            && point.y <= self.max.y + padding
    }
}

/// Static terrain collider, keyed by the registry entity it mirrors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StaticCollider {
    pub id: EntityId,
    pub bounds: Aabb,
}

/// Nearest terrain hit along a ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Registry id of the static collider that was hit.
    pub surface: EntityId,
    pub distance: f32,
    /// Outward surface normal at the hit point.
    pub normal: Vec2,
}

/// Rigid-body engine as seen by the core.
///
/// Character bodies are keyed by their registry id. Reads return `None` for
/// bodies the engine does not (yet) know about. Ray casts only ever report
/// static terrain.
pub trait PhysicsBackend {
    fn spawn_body(&mut self, id: EntityId, center: Vec2, size: Vec2);
    fn despawn_body(&mut self, id: EntityId);
    /// Replace the collider shape and move the body to `center`.
    fn reshape_body(&mut self, id: EntityId, center: Vec2, size: Vec2);

    fn translation(&self, id: EntityId) -> Option<Vec2>;
    fn set_translation(&mut self, id: EntityId, center: Vec2);
    fn velocity(&self, id: EntityId) -> Option<Vec2>;
    fn set_velocity(&mut self, id: EntityId, velocity: Vec2);
    fn set_gravity_scale(&mut self, id: EntityId, scale: f32);
    /// Kinematically fixed bodies are not moved by the solver.
    fn set_kinematic(&mut self, id: EntityId, kinematic: bool);

    /// Make the static terrain set exactly `colliders`.
    fn rebuild_statics(&mut self, colliders: &[StaticCollider]);

    fn cast_ray(&self, origin: Vec2, direction: Dir2, max_distance: f32) -> Option<RayHit>;

    /// Advance the world by `dt`. Engines stepped by their own schedule may
    /// treat this as a no-op.
    fn step(&mut self, dt: f32);
}
