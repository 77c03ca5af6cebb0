//! Physics domain: deterministic box-versus-box engine for headless runs.
//!
//! Bodies are integrated with explicit Euler and resolved against static
//! terrain one axis at a time (vertical first, then horizontal).

use bevy::prelude::*;
use std::collections::BTreeMap;

use super::{Aabb, PhysicsBackend, RayHit, StaticCollider};
use crate::registry::EntityId;

/// Penetration below this depth is treated as resting contact.
const CONTACT_SLOP: f32 = 1e-3;

#[derive(Debug, Clone)]
struct KinematicBody {
    center: Vec2,
    size: Vec2,
    velocity: Vec2,
    gravity_scale: f32,
    kinematic: bool,
}

impl KinematicBody {
    fn bounds(&self) -> Aabb {
        Aabb::from_center(self.center, self.size)
    }
}

#[derive(Debug, Clone)]
pub struct KinematicBackend {
    gravity: Vec2,
    bodies: BTreeMap<EntityId, KinematicBody>,
    statics: Vec<StaticCollider>,
}

impl KinematicBackend {
    pub fn new(gravity: Vec2) -> Self {
        Self {
            gravity,
            bodies: BTreeMap::new(),
            statics: Vec::new(),
        }
    }

    pub fn gravity_scale(&self, id: EntityId) -> Option<f32> {
        self.bodies.get(&id).map(|b| b.gravity_scale)
    }

    pub fn is_kinematic(&self, id: EntityId) -> Option<bool> {
        self.bodies.get(&id).map(|b| b.kinematic)
    }

    pub fn body_size(&self, id: EntityId) -> Option<Vec2> {
        self.bodies.get(&id).map(|b| b.size)
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn static_count(&self) -> usize {
        self.statics.len()
    }
}

fn penetrates(a: &Aabb, b: &Aabb) -> bool {
    a.min.x < b.max.x - CONTACT_SLOP
        && a.max.x > b.min.x + CONTACT_SLOP
        && a.min.y < b.max.y - CONTACT_SLOP
        && a.max.y > b.min.y + CONTACT_SLOP
}

/// Slab test. Returns the entry distance and the face normal that was crossed.
fn ray_aabb(origin: Vec2, direction: Vec2, max_distance: f32, bounds: &Aabb) -> Option<(f32, Vec2)> {
    let mut t_enter = f32::NEG_INFINITY;
    let mut t_exit = f32::INFINITY;
    let mut normal = Vec2::ZERO;

    for axis in 0..2 {
        let o = origin[axis];
        let d = direction[axis];
        let (lo, hi) = (bounds.min[axis], bounds.max[axis]);

        if d.abs() < f32::EPSILON {
            if o < lo || o > hi {
                return None;
            }
            continue;
        }

        let inv = 1.0 / d;
        let (mut t1, mut t2) = ((lo - o) * inv, (hi - o) * inv);
        if t1 > t2 {
            std::mem::swap(&mut t1, &mut t2);
        }

        if t1 > t_enter {
            t_enter = t1;
            normal = Vec2::ZERO;
            normal[axis] = -d.signum();
        }
        t_exit = t_exit.min(t2);
        if t_enter > t_exit {
            return None;
        }
    }

    if t_exit < 0.0 || t_enter > max_distance {
        return None;
    }
    if t_enter < 0.0 {
        // Origin inside the box.
        return Some((0.0, -direction));
    }
    Some((t_enter, normal))
}

impl PhysicsBackend for KinematicBackend {
    fn spawn_body(&mut self, id: EntityId, center: Vec2, size: Vec2) {
        self.bodies.insert(
            id,
            KinematicBody {
                center,
                size,
                velocity: Vec2::ZERO,
                gravity_scale: 1.0,
                kinematic: false,
            },
        );
    }

    fn despawn_body(&mut self, id: EntityId) {
        self.bodies.remove(&id);
    }

    fn reshape_body(&mut self, id: EntityId, center: Vec2, size: Vec2) {
        if let Some(body) = self.bodies.get_mut(&id) {
            body.center = center;
            body.size = size;
        }
    }

    fn translation(&self, id: EntityId) -> Option<Vec2> {
        self.bodies.get(&id).map(|b| b.center)
    }

    fn set_translation(&mut self, id: EntityId, center: Vec2) {
        if let Some(body) = self.bodies.get_mut(&id) {
            body.center = center;
        }
    }

    fn velocity(&self, id: EntityId) -> Option<Vec2> {
        self.bodies.get(&id).map(|b| b.velocity)
    }

    fn set_velocity(&mut self, id: EntityId, velocity: Vec2) {
        if let Some(body) = self.bodies.get_mut(&id) {
            body.velocity = velocity;
        }
    }

    fn set_gravity_scale(&mut self, id: EntityId, scale: f32) {
        if let Some(body) = self.bodies.get_mut(&id) {
            body.gravity_scale = scale;
        }
    }

    fn set_kinematic(&mut self, id: EntityId, kinematic: bool) {
        if let Some(body) = self.bodies.get_mut(&id) {
            body.kinematic = kinematic;
        }
    }

    fn rebuild_statics(&mut self, colliders: &[StaticCollider]) {
        self.statics.clear();
        self.statics.extend_from_slice(colliders);
    }

    fn cast_ray(&self, origin: Vec2, direction: Dir2, max_distance: f32) -> Option<RayHit> {
        let dir = direction.as_vec2();
        self.statics
            .iter()
            .filter_map(|s| {
                ray_aabb(origin, dir, max_distance, &s.bounds).map(|(distance, normal)| RayHit {
                    surface: s.id,
                    distance,
                    normal,
                })
            })
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }

    fn step(&mut self, dt: f32) {
        for body in self.bodies.values_mut() {
            if body.kinematic {
                continue;
            }

            body.velocity += self.gravity * body.gravity_scale * dt;
            let half = body.size * 0.5;

            body.center.y += body.velocity.y * dt;
            for s in &self.statics {
                if !penetrates(&body.bounds(), &s.bounds) {
                    continue;
                }
                if body.velocity.y > 0.0 {
                    body.center.y = s.bounds.min.y - half.y;
                } else if body.velocity.y < 0.0 {
                    body.center.y = s.bounds.max.y + half.y;
                }
                body.velocity.y = 0.0;
            }

            body.center.x += body.velocity.x * dt;
            for s in &self.statics {
                if !penetrates(&body.bounds(), &s.bounds) {
                    continue;
                }
                if body.velocity.x > 0.0 {
                    body.center.x = s.bounds.min.x - half.x;
                } else if body.velocity.x < 0.0 {
                    body.center.x = s.bounds.max.x + half.x;
                }
                body.velocity.x = 0.0;
            }
        }
    }
}
