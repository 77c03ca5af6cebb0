//! Physics domain: the seam between the simulation core and the rigid-body
//! engine, plus contact classification for characters.

mod avian;
mod backend;
mod classify;
mod integration;
mod kinematic;


pub use avian::{AvianBackend, AvianLinks, CharacterBody, RunnerLayer, TerrainCollider};
pub use backend::*;
pub use classify::*;
pub use integration::*;
pub use kinematic::KinematicBackend;
