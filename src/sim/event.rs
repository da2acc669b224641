//! Events emitted during a simulation step.
//! The presentation layer consumes these for messages and sound.

use crate::domain::entity::Position;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameEvent {
    PelletEaten { pos: Position },
    PowerPelletEaten { pos: Position },
    GhostEaten { id: usize, pos: Position },
    GhostRevived { id: usize },
    PlayerCaught { lives_left: u32 },
    PowerExpired,
    LevelCleared { level: u32 },
    GameOver { score: u32 },
    Restarted,
}
