//! Core domain: configuration, run state and host-facing messages.

mod config;
mod events;
mod state;
mod validation;


pub use config::*;
pub use events::*;
pub use state::*;
pub use validation::*;
