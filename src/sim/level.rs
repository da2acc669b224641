//! Level loader.
//!
//! ## Sources (priority order):
//!   1. The file named by `general.level_file`
//!   2. The embedded classic maze
//!
//! ## File format:
//!   One maze row per line, all rows the same width. Trailing blank lines
//!   and `\r` line endings are ignored.
//!
//! ## Tile legend:
//!   '#' = Wall          '.' = Pellet
//!   'o' = Power pellet  ' ' = Floor
//!   'P' = Player spawn  'G' = Ghost home (first four)

use std::path::Path;

use tracing::info;

use crate::domain::grid::Grid;
use crate::error::{GameError, GameResult, LevelError};

/// The classic 28-column maze. Row 14 is the tunnel; the ghost pen opens
/// upward through the gap in row 12.
pub const CLASSIC: &[&str] = &[
    "############################",
    "#............##............#",
    "#.####.#####.##.#####.####.#",
    "#o####.#####.##.#####.####o#",
    "#.####.#####.##.#####.####.#",
    "#..........................#",
    "#.####.##.########.##.####.#",
    "#.####.##.########.##.####.#",
    "#......##....##....##......#",
    "######.##### ## #####.######",
    "######.##### ## #####.######",
    "######.##          ##.######",
    "######.## ###  ### ##.######",
    "######.## #      # ##.######",
    "      .   # GGGG #   .      ",
    "######.## #      # ##.######",
    "######.## ######## ##.######",
    "######.##          ##.######",
    "######.## ######## ##.######",
    "######.## ######## ##.######",
    "#............##............#",
    "#.####.#####.##.#####.####.#",
    "#o..##.......P........##..o#",
    "###.##.##.########.##.##.###",
    "#......##....##....##......#",
    "#.##########.##.##########.#",
    "#..........................#",
    "############################",
];

// ══════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════

/// Load the configured level, or the classic maze when `path` is `None`.
pub fn load(path: Option<&Path>) -> GameResult<Grid> {
    match path {
        Some(p) => load_from_file(p),
        None => {
            let grid = classic()?;
            info!(pellets = grid.pellets_remaining(), "loaded embedded classic maze");
            Ok(grid)
        }
    }
}

pub fn classic() -> Result<Grid, LevelError> {
    playable(Grid::parse(CLASSIC)?)
}

pub fn load_from_file(path: &Path) -> GameResult<Grid> {
    let content = std::fs::read_to_string(path).map_err(|source| GameError::LevelFile {
        path: path.to_path_buf(),
        source,
    })?;
    let grid = parse_level_text(&content)?;
    info!(
        path = %path.display(),
        width = grid.width(),
        height = grid.height(),
        pellets = grid.pellets_remaining(),
        ghosts = grid.ghost_starts().len(),
        "loaded level file"
    );
    Ok(grid)
}

/// Parse a whole level file.
pub fn parse_level_text(content: &str) -> Result<Grid, LevelError> {
    let mut rows: Vec<&str> = content.lines().map(|l| l.trim_end_matches('\r')).collect();
    while rows.last().map_or(false, |r| r.trim().is_empty()) {
        rows.pop();
    }
    playable(Grid::parse(&rows)?)
}

/// A level with nothing to eat would clear itself every tick.
fn playable(grid: Grid) -> Result<Grid, LevelError> {
    if grid.pellets_remaining() == 0 {
        return Err(LevelError::NoPellets);
    }
    Ok(grid)
}

#[cfg(test)]
mod tests {
    use std::collections::{HashSet, VecDeque};

    use super::*;
    use crate::domain::entity::{Direction, Position};
    use crate::domain::tile::Cell;

    #[test]
    fn classic_maze_parses() {
        let g = classic().unwrap();
        assert_eq!(g.width(), 28);
        assert_eq!(g.height(), 28);
        assert_eq!(g.ghost_starts().len(), 4);
        assert_eq!(g.player_start(), Position::new(13, 22));
        assert_eq!(g.pellets_remaining(), 229);
    }

    #[test]
    fn classic_maze_has_one_tunnel() {
        let g = classic().unwrap();
        let tunnels: Vec<i32> = (0..g.height() as i32).filter(|&r| g.is_tunnel_row(r)).collect();
        assert_eq!(tunnels, vec![14]);
    }

    #[test]
    fn classic_maze_is_connected() {
        let g = classic().unwrap();
        let mut seen = HashSet::from([g.player_start()]);
        let mut queue = VecDeque::from([g.player_start()]);
        while let Some(cur) = queue.pop_front() {
            for d in Direction::ALL {
                if let Some(next) = g.neighbor(cur, d) {
                    if seen.insert(next) {
                        queue.push_back(next);
                    }
                }
            }
        }
        for (row, cells) in g.rows().iter().enumerate() {
            for (col, cell) in cells.iter().enumerate() {
                if *cell == Cell::Pellet || *cell == Cell::PowerPellet {
                    let pos = Position::new(col as i32, row as i32);
                    assert!(seen.contains(&pos), "pellet ({col},{row}) unreachable");
                }
            }
        }
        for home in g.ghost_starts() {
            assert!(seen.contains(home), "ghost home {home:?} unreachable");
        }
    }

    #[test]
    fn trailing_blank_lines_ignored() {
        let g = parse_level_text("#####\r\n#P.G#\r\n#####\r\n\n  \n").unwrap();
        assert_eq!(g.height(), 3);
        assert_eq!(g.pellets_remaining(), 1);
    }

    #[test]
    fn ragged_file_rejected() {
        let err = parse_level_text("#####\n#P.G\n#####\n").unwrap_err();
        assert!(matches!(err, LevelError::RaggedRow { row: 1, .. }));
    }

    #[test]
    fn level_without_pellets_rejected() {
        let err = parse_level_text("#####\n#P G#\n#####\n").unwrap_err();
        assert_eq!(err, LevelError::NoPellets);
    }

    #[test]
    fn missing_file_is_level_file_error() {
        let path = std::env::temp_dir().join("mazechase-no-such-level.txt");
        let err = load_from_file(&path).unwrap_err();
        assert!(matches!(err, GameError::LevelFile { .. }));
    }

    #[test]
    fn file_round_trip() {
        let path = std::env::temp_dir().join(format!("mazechase-level-{}.txt", std::process::id()));
        std::fs::write(&path, "#######\n#P.o.G#\n#######\n").unwrap();
        let g = load(Some(&path)).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(g.pellets_remaining(), 3);
    }
}
