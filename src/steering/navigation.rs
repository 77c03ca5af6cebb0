//! Steering domain: world queries used by companion decisions.

use bevy::prelude::*;

use crate::physics::Aabb;
use crate::registry::{Enemy, EntityId, EntityRegistry, Platform};

/// Companions keep at least this far ahead of the break line.
pub const BREAK_SAFETY_MARGIN: f32 = 50.0;
/// Ground this far behind the break line is already gone.
const BREAK_ZONE_DEPTH: f32 = 100.0;
/// How far ahead a companion looks for a platform to hop onto.
const PLATFORM_SEARCH_DISTANCE: f32 = 200.0;
/// A platform must rise at least this much above the companion to be a hop target.
const PLATFORM_MIN_RISE: f32 = 30.0;
/// Grapple targets closer than this are not worth a rope.
const GRAPPLE_MIN_DISTANCE: f32 = 50.0;
/// Platforms lower than this below the companion are not grapple targets.
const GRAPPLE_MAX_DROP: f32 = 50.0;
/// Search radius around the leader's rope when following a swing.
const FOLLOW_SWING_RADIUS: f32 = 150.0;

/// Terrain facts refreshed once per frame before any command is generated.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GroundState {
    pub ground_y: f32,
    pub break_x: f32,
}

impl GroundState {
    /// Ground at `x` is about to disappear or already has.
    pub fn in_break_zone(&self, x: f32) -> bool {
        x <= self.break_x + BREAK_SAFETY_MARGIN && x > self.break_x - BREAK_ZONE_DEPTH
    }

    /// `x` is too close to the break line to walk toward.
    pub fn is_unsafe(&self, x: f32) -> bool {
        x <= self.break_x + BREAK_SAFETY_MARGIN
    }
}

/// A non-ground platform in the way of horizontal movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Obstacle {
    #[default]
    None,
    /// Enough room underneath to pass crouched.
    Low,
    /// Top edge above the head; jump for it.
    High,
    Blocking,
}

fn floating_platforms(registry: &EntityRegistry) -> impl Iterator<Item = (EntityId, Aabb)> + '_ {
    registry
        .placed::<Platform>()
        .filter(|(_, _, platform)| !platform.is_ground)
        .map(|(id, pos, platform)| (id, Aabb::from_center(pos.0, platform.size())))
}

/// First floating platform overlapping the path `lookahead` units ahead.
pub fn detect_obstacle(
    registry: &EntityRegistry,
    position: Vec2,
    direction: f32,
    lookahead: f32,
    standing_height: f32,
    crouch_height: f32,
) -> Obstacle {
    if direction == 0.0 {
        return Obstacle::None;
    }

    let future_x = position.x + direction.signum() * lookahead;
    let top = position.y - standing_height * 0.5;
    let bottom = position.y + standing_height * 0.5;

    for (_, surface) in floating_platforms(registry) {
        let in_path = if direction > 0.0 {
            future_x > surface.min.x && position.x < surface.max.x
        } else {
            future_x < surface.max.x && position.x > surface.min.x
        };
        if !in_path || bottom <= surface.top() || top >= surface.bottom() {
            continue;
        }

        let gap_below = bottom - surface.bottom();
        if gap_below >= crouch_height {
            return Obstacle::Low;
        }
        if surface.top() < top {
            return Obstacle::High;
        }
        return Obstacle::Blocking;
    }

    Obstacle::None
}

/// A platform ahead in `direction` whose top is high enough to hop onto.
pub fn platform_ahead(registry: &EntityRegistry, ground: &GroundState, position: Vec2, direction: f32) -> bool {
    registry.placed::<Platform>().any(|(_, pos, platform)| {
        let dx = (pos.0.x - position.x) * direction.signum();
        let top = pos.0.y - platform.height * 0.5;
        dx > 0.0
            && dx < PLATFORM_SEARCH_DISTANCE
            && top < ground.ground_y
            && top < position.y - PLATFORM_MIN_RISE
    })
}

/// Nearest enemy within `range` of `position`.
pub fn nearest_enemy(registry: &EntityRegistry, position: Vec2, range: f32) -> Option<(EntityId, Vec2)> {
    registry
        .placed::<Enemy>()
        .map(|(id, pos, _)| (id, pos.0, pos.0.distance(position)))
        .filter(|(_, _, distance)| *distance <= range)
        .min_by(|a, b| a.2.total_cmp(&b.2))
        .map(|(id, pos, _)| (id, pos))
}

/// Platform center to grapple toward.
///
/// While the leader swings, prefer a platform near the leader's rope.
/// Otherwise score reachable platforms that are ahead and above.
pub fn grapple_target(
    registry: &EntityRegistry,
    ground: &GroundState,
    position: Vec2,
    leader_pivot: Option<Vec2>,
    max_distance: f32,
) -> Option<(EntityId, Vec2)> {
    let reachable = |center: Vec2| {
        let distance = center.distance(position);
        distance > GRAPPLE_MIN_DISTANCE
            && distance < max_distance
            && !ground.is_unsafe(center.x)
    };

    if let Some(pivot) = leader_pivot {
        let near_leader = floating_platforms(registry)
            .map(|(id, bounds)| (id, bounds.center()))
            .find(|(_, center)| center.distance(pivot) < FOLLOW_SWING_RADIUS && reachable(*center));
        if near_leader.is_some() {
            return near_leader;
        }
    }

    floating_platforms(registry)
        .map(|(id, bounds)| (id, bounds.center()))
        .filter(|(_, center)| reachable(*center) && center.y - position.y <= GRAPPLE_MAX_DROP)
        .map(|(id, center)| {
            let offset = center - position;
            (id, center, offset.x * 0.5 - offset.y * 2.0)
        })
        .max_by(|a, b| a.2.total_cmp(&b.2))
        .map(|(id, center, _)| (id, center))
}
