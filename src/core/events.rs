//! Core domain: messages exchanged between the simulation and its host.

use bevy::ecs::message::Message;
use serde::{Deserialize, Serialize};

use crate::registry::EntityId;

/// Abilities whose duration is owned by the presentation layer's animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ability {
    Attack,
    Roll,
    Turn,
}

/// Inbound: presentation finished playing the clip for `ability`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AbilityAnimationComplete {
    pub character: EntityId,
    pub ability: Ability,
}

impl Message for AbilityAnimationComplete {}

/// Why a character left the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LossReason {
    /// Body contact with an enemy that was not cut down first.
    Enemy,
    /// Fell below the world.
    FellOut,
    /// Left behind the break line.
    BehindBreak,
}

/// An enemy was cut down by a melee swing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnemyKilled {
    pub enemy: EntityId,
    pub by: EntityId,
    pub points: u32,
}

impl Message for EnemyKilled {}

/// A companion was removed from the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompanionLost {
    pub character: EntityId,
    pub reason: LossReason,
}

impl Message for CompanionLost {}

/// The player died; the run is over until restarted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameOver {
    pub score: u32,
    pub reason: LossReason,
}

impl Message for GameOver {}

/// Inbound: tear the world down and build a fresh run.
#[derive(Debug, Clone, Copy, Default)]
pub struct RestartRequested;

impl Message for RestartRequested {}

/// Outbound notifications recorded during a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimEvent {
    EnemyKilled(EnemyKilled),
    CompanionLost(CompanionLost),
    GameOver(GameOver),
}
