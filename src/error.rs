//! Error types.
//!
//! Level problems are fatal at load time. Config problems only downgrade to
//! defaults, so `ConfigError` is reported and never propagated out of `main`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LevelError {
    #[error("level layout is empty")]
    Empty,

    #[error("row {row} is {found} cells wide, expected {expected}")]
    RaggedRow { row: usize, expected: usize, found: usize },

    #[error("unknown tile {ch:?} at column {col}, row {row}")]
    UnknownTile { ch: char, col: usize, row: usize },

    #[error("level has no player start ('P')")]
    MissingPlayer,

    #[error("level has no ghost start ('G')")]
    MissingGhost,

    #[error("level has no pellets to clear")]
    NoPellets,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} parse error: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Error)]
pub enum GameError {
    #[error("terminal error: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not read level file {path}: {source}")]
    LevelFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("bad level: {0}")]
    Level(#[from] LevelError),
}

pub type GameResult<T> = Result<T, GameError>;
