//! Character domain: the per-character state machine shared by the player
//! and companions, plus grapple swinging and melee geometry.
//!
//! A body is frozen in the physics engine exactly while its character is
//! `WALL_HANGING`; every transition into or out of the hang goes through
//! [`BoundPhysics::freeze`](crate::physics::BoundPhysics::freeze) and
//! [`BoundPhysics::unfreeze`](crate::physics::BoundPhysics::unfreeze).

mod combat;
mod commands;
mod components;
mod controller;
mod flags;
mod grapple;


pub use combat::*;
pub use commands::*;
pub use components::*;
pub use controller::CommandEffects;
pub use flags::CharacterFlags;
pub use grapple::{GrappleState, Swing, find_anchor};
