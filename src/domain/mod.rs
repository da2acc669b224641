//! Pure game rules: maze, entities, ghost AI. No I/O.

pub mod ai;
pub mod entity;
pub mod grid;
pub mod tile;
