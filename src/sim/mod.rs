//! Simulation: world state, level loading and the per-tick step.

pub mod event;
pub mod level;
pub mod step;
pub mod world;
