//! Registry domain: component rows stored per entity.

use bevy::prelude::*;
use serde::Serialize;

/// World-space center of an entity (Y-down).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position(pub Vec2);

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Velocity(pub Vec2);

/// Axis-aligned terrain slab. Ground tiles carry `is_ground`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Platform {
    pub width: f32,
    pub height: f32,
    pub is_ground: bool,
}

impl Platform {
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EnemyKind {
    Walker,
    Flyer,
    Spiker,
}

impl EnemyKind {
    pub const ALL: [EnemyKind; 3] = [EnemyKind::Walker, EnemyKind::Flyer, EnemyKind::Spiker];
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Enemy {
    pub kind: EnemyKind,
    pub speed: f32,
}

/// Names of the registry tables, used for id queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Position,
    Velocity,
    Platform,
    Enemy,
}
