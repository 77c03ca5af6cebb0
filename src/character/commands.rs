//! Character domain: the per-frame command contract shared by player input
//! and companion steering.

use bevy::prelude::*;

use crate::registry::EntityId;

/// Axis magnitude below which a direction counts as released.
const AXIS_DEAD_ZONE: f32 = 0.1;
/// Vertical axis magnitude that counts as holding up or down.
const VERTICAL_THRESHOLD: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GrappleCommand {
    /// Attach to `target`. `platform` names the platform the caller believes
    /// is under the point; `None` lets the grapple search for one.
    Attach {
        target: Vec2,
        platform: Option<EntityId>,
    },
    Release,
}

/// One frame of intent for a character.
///
/// `move_axis` uses input conventions: x > 0 is right, y > 0 is up. It is
/// clamped to [-1, 1] per axis on construction and non-finite values read
/// as zero.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CommandSet {
    move_axis: Vec2,
    pub jump: bool,
    pub attack: bool,
    pub roll: bool,
    pub grapple: Option<GrappleCommand>,
}

fn sanitize(value: f32) -> f32 {
    if value.is_finite() {
        value.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

impl CommandSet {
    pub fn new(move_axis: Vec2) -> Self {
        Self {
            move_axis: Vec2::new(sanitize(move_axis.x), sanitize(move_axis.y)),
            ..default()
        }
    }

    pub fn with_jump(mut self) -> Self {
        self.jump = true;
        self
    }

    pub fn with_attack(mut self) -> Self {
        self.attack = true;
        self
    }

    pub fn with_roll(mut self) -> Self {
        self.roll = true;
        self
    }

    pub fn with_grapple(mut self, grapple: GrappleCommand) -> Self {
        self.grapple = Some(grapple);
        self
    }

    pub fn move_axis(&self) -> Vec2 {
        self.move_axis
    }

    /// Horizontal input with the dead zone applied.
    pub fn horizontal(&self) -> f32 {
        if self.move_axis.x.abs() > AXIS_DEAD_ZONE {
            self.move_axis.x
        } else {
            0.0
        }
    }

    pub fn holding_up(&self) -> bool {
        self.move_axis.y > VERTICAL_THRESHOLD
    }

    pub fn holding_down(&self) -> bool {
        self.move_axis.y < -VERTICAL_THRESHOLD
    }
}
