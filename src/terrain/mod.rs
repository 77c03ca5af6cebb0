//! Terrain domain: procedural ground and platforms between the receding
//! break line and the generation frontier.

mod scroller;

#[cfg(test)]
mod tests;

pub use scroller::{ScrollReport, TerrainScroller};
