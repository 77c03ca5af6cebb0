//! Core domain: run state for the simulation.

use bevy::prelude::*;
use serde::Serialize;

#[derive(States, Debug, Hash, Eq, PartialEq, Clone, Copy, Default, Serialize)]
pub enum RunState {
    #[default]
    Running,
    GameOver,
}
