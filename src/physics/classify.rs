//! Physics domain: turning probe hits into a per-frame collision result.

use bevy::prelude::*;
use std::collections::HashMap;

use super::{Aabb, PhysicsBackend};
use crate::core::PhysicsConfig;
use crate::registry::EntityId;

/// Where on the character a probe ray starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    Feet,
    Head,
    Left,
    Right,
}

/// One probe ray that reached static terrain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub probe: Probe,
    pub surface: EntityId,
    pub surface_bounds: Aabb,
    pub normal: Vec2,
    pub distance: f32,
}

/// Contact classification for one character this frame. Not kept between frames.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CollisionResult {
    pub grounded: bool,
    pub hit_wall_left: bool,
    pub hit_wall_right: bool,
    pub hit_ceiling: bool,
    pub can_ledge_grab: bool,
    /// Top edge of the first surface that qualified for a ledge grab.
    pub ledge_y: Option<f32>,
}

impl CollisionResult {
    pub fn hit_wall(&self) -> bool {
        self.hit_wall_left || self.hit_wall_right
    }
}

/// Relative heights (fractions of the half height) of the side probes, top to bottom.
const SIDE_PROBE_HEIGHTS: [f32; 3] = [-0.5, 0.0, 0.5];

/// Cast the feet, head and side probes for a body and collect what they touch.
pub fn probe_contacts<B: PhysicsBackend + ?Sized>(
    backend: &B,
    surfaces: &HashMap<EntityId, Aabb>,
    body: Aabb,
    config: &PhysicsConfig,
) -> Vec<Contact> {
    let center = body.center();
    let half = body.size() * 0.5;
    let mut contacts = Vec::new();

    let mut cast = |probe: Probe, origin: Vec2, direction: Dir2, length: f32| {
        let Some(hit) = backend.cast_ray(origin, direction, length) else {
            return;
        };
        let Some(bounds) = surfaces.get(&hit.surface) else {
            return;
        };
        contacts.push(Contact {
            probe,
            surface: hit.surface,
            surface_bounds: *bounds,
            normal: hit.normal,
            distance: hit.distance,
        });
    };

    // Y grows downward, so "down" is +Y.
    for x in [body.min.x + 1.0, center.x, body.max.x - 1.0] {
        cast(Probe::Feet, Vec2::new(x, body.max.y), Dir2::Y, config.ground_probe);
    }

    cast(
        Probe::Head,
        Vec2::new(center.x, body.min.y),
        Dir2::NEG_Y,
        config.ceiling_probe,
    );

    for factor in SIDE_PROBE_HEIGHTS {
        let y = center.y + half.y * factor;
        cast(Probe::Left, Vec2::new(body.min.x, y), Dir2::NEG_X, config.wall_probe);
    }
    for factor in SIDE_PROBE_HEIGHTS {
        let y = center.y + half.y * factor;
        cast(Probe::Right, Vec2::new(body.max.x, y), Dir2::X, config.wall_probe);
    }

    contacts
}

/// Classify contacts for `body`.
///
/// Grounded: a feet contact whose normal points up within the cone.
/// Walls: side contacts with a near-horizontal normal, only while airborne.
/// Ledge: a wall surface whose top edge sits between half and full body
/// height (plus `ledge_reach`) above the feet, unless grabbing is blocked.
pub fn classify_contacts(
    contacts: &[Contact],
    body: Aabb,
    config: &PhysicsConfig,
    ledge_grab_blocked: bool,
) -> CollisionResult {
    let mut result = CollisionResult::default();
    let cone = config.normal_cone;

    for contact in contacts {
        match contact.probe {
            Probe::Feet if contact.normal.y <= -cone => result.grounded = true,
            Probe::Head if contact.normal.y >= cone => result.hit_ceiling = true,
            _ => {}
        }
    }

    // Standing on something rules out wall states entirely.
    if result.grounded {
        return result;
    }

    let height = body.size().y;
    let feet = body.bottom();

    for contact in contacts {
        let is_wall = match contact.probe {
            Probe::Left if contact.normal.x >= cone => {
                result.hit_wall_left = true;
                true
            }
            Probe::Right if contact.normal.x <= -cone => {
                result.hit_wall_right = true;
                true
            }
            _ => false,
        };

        if !is_wall || ledge_grab_blocked || result.ledge_y.is_some() {
            continue;
        }

        let rise = feet - contact.surface_bounds.top();
        if rise >= height * 0.5 && rise <= height + config.ledge_reach {
            result.can_ledge_grab = true;
            result.ledge_y = Some(contact.surface_bounds.top());
        }
    }

    result
}
