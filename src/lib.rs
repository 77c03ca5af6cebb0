//! Simulation core of a side-scrolling knight runner.
//!
//! The world scrolls behind a steadily advancing break line. A player and up
//! to three AI companions run, jump, roll, hang from ledges and swing from
//! grapple ropes over procedurally generated terrain while enemies approach.
//! [`sim::Simulation`] owns one world and runs its frame stages against a
//! [`physics::PhysicsBackend`]; [`sim::SimulationPlugin`] schedules those
//! stages inside a bevy `App` with avian as the engine.

pub mod character;
pub mod core;
pub mod host;
pub mod physics;
pub mod registry;
pub mod sim;
pub mod steering;
pub mod terrain;
