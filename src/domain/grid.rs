//! The maze: cells, spawn markers and pellet bookkeeping.
//!
//! ## Cell layers
//!   - `initial`: the layout as parsed. Never mutated.
//!   - `cells`: the live maze. Only `consume()` changes it.
//!
//! `pellets_remaining` always equals the number of Pellet/PowerPellet cells
//! in `cells`; `consume()` and `reset()` are the only writers.
//!
//! ## Tunnels
//! A row whose first and last cells are both walkable is a tunnel row.
//! Stepping off either end of a tunnel row re-enters at the opposite end.

use crate::error::LevelError;

use super::entity::{Direction, Position};
use super::tile::Cell;

/// At most this many `G` markers become ghosts.
pub const MAX_GHOSTS: usize = 4;

#[derive(Clone, Debug)]
pub struct Grid {
    initial: Vec<Vec<Cell>>,
    cells: Vec<Vec<Cell>>,
    width: usize,
    height: usize,
    pellets_remaining: usize,
    player_start: Position,
    ghost_starts: Vec<Position>,
}

impl Grid {
    /// Parse a layout (one string per row). Fails fast on ragged rows,
    /// unknown characters, or missing spawn markers.
    pub fn parse<S: AsRef<str>>(rows: &[S]) -> Result<Grid, LevelError> {
        let height = rows.len();
        if height == 0 {
            return Err(LevelError::Empty);
        }
        let width = rows[0].as_ref().chars().count();
        if width == 0 {
            return Err(LevelError::Empty);
        }

        let mut cells = Vec::with_capacity(height);
        let mut player_start = None;
        let mut ghost_starts = Vec::with_capacity(MAX_GHOSTS);

        for (row, line) in rows.iter().enumerate() {
            let line = line.as_ref();
            let found = line.chars().count();
            if found != width {
                return Err(LevelError::RaggedRow { row, expected: width, found });
            }

            let mut cell_row = Vec::with_capacity(width);
            for (col, ch) in line.chars().enumerate() {
                let cell = Cell::from_layout(ch).ok_or(LevelError::UnknownTile { ch, col, row })?;
                let pos = Position::new(col as i32, row as i32);
                match ch {
                    'P' if player_start.is_none() => player_start = Some(pos),
                    'G' if ghost_starts.len() < MAX_GHOSTS => ghost_starts.push(pos),
                    _ => {}
                }
                cell_row.push(cell);
            }
            cells.push(cell_row);
        }

        let player_start = player_start.ok_or(LevelError::MissingPlayer)?;
        if ghost_starts.is_empty() {
            return Err(LevelError::MissingGhost);
        }

        let pellets_remaining = count_pellets(&cells);
        Ok(Grid {
            initial: cells.clone(),
            cells,
            width,
            height,
            pellets_remaining,
            player_start,
            ghost_starts,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pellets_remaining(&self) -> usize {
        self.pellets_remaining
    }

    pub fn player_start(&self) -> Position {
        self.player_start
    }

    pub fn ghost_starts(&self) -> &[Position] {
        &self.ghost_starts
    }

    fn in_bounds(&self, pos: Position) -> bool {
        pos.col >= 0 && pos.row >= 0 && (pos.col as usize) < self.width && (pos.row as usize) < self.height
    }

    /// Cell at `pos`; out of bounds reads as wall.
    #[inline]
    pub fn cell(&self, pos: Position) -> Cell {
        if self.in_bounds(pos) {
            self.cells[pos.row as usize][pos.col as usize]
        } else {
            Cell::Wall
        }
    }

    #[inline]
    pub fn is_walkable(&self, pos: Position) -> bool {
        self.cell(pos).is_walkable()
    }

    /// Is `row` a tunnel row (both edge cells walkable)?
    pub fn is_tunnel_row(&self, row: i32) -> bool {
        if row < 0 || row as usize >= self.height {
            return false;
        }
        let cells = &self.cells[row as usize];
        cells[0].is_walkable() && cells[self.width - 1].is_walkable()
    }

    /// Fold a position that left the grid horizontally back onto a tunnel
    /// row. Anything else is returned unchanged.
    pub fn wrap(&self, pos: Position) -> Position {
        if !self.is_tunnel_row(pos.row) {
            return pos;
        }
        let cells = &self.cells[pos.row as usize];
        let col = if pos.col < 0 {
            cells.iter().rposition(|c| c.is_walkable())
        } else if pos.col as usize >= self.width {
            cells.iter().position(|c| c.is_walkable())
        } else {
            return pos;
        };
        match col {
            Some(c) => Position::new(c as i32, pos.row),
            None => pos,
        }
    }

    /// The walkable cell one step from `pos` in `dir`, tunnels applied.
    pub fn neighbor(&self, pos: Position, dir: Direction) -> Option<Position> {
        if dir == Direction::None {
            return None;
        }
        let next = self.wrap(pos.offset(dir));
        self.is_walkable(next).then_some(next)
    }

    /// Every direction with a walkable neighbor.
    pub fn walkable_directions(&self, pos: Position) -> Vec<Direction> {
        Direction::ALL
            .into_iter()
            .filter(|&d| self.neighbor(pos, d).is_some())
            .collect()
    }

    /// Eat whatever pellet is at `pos`. Returns the pellet kind, or the
    /// untouched cell when there was nothing to eat.
    pub fn consume(&mut self, pos: Position) -> Cell {
        let cell = self.cell(pos);
        if !cell.is_pellet() {
            return cell;
        }
        self.cells[pos.row as usize][pos.col as usize] = Cell::Empty;
        self.pellets_remaining -= 1;
        cell
    }

    /// Restore the layout as loaded.
    pub fn reset(&mut self) {
        self.cells = self.initial.clone();
        self.pellets_remaining = count_pellets(&self.cells);
    }

    /// Rows of cells, top to bottom.
    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.cells
    }
}

fn count_pellets(cells: &[Vec<Cell>]) -> usize {
    cells.iter().flatten().filter(|c| c.is_pellet()).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: &[&str]) -> Grid {
        Grid::parse(rows).expect("valid level")
    }

    fn live_pellets(g: &Grid) -> usize {
        g.rows().iter().flatten().filter(|c| c.is_pellet()).count()
    }

    #[test]
    fn parses_markers_and_pellets() {
        let g = grid(&[
            "#######",
            "#P.o.G#",
            "#######",
        ]);
        assert_eq!(g.width(), 7);
        assert_eq!(g.height(), 3);
        assert_eq!(g.player_start(), Position::new(1, 1));
        assert_eq!(g.ghost_starts(), &[Position::new(5, 1)]);
        assert_eq!(g.pellets_remaining(), 3);
        assert_eq!(g.cell(Position::new(1, 1)), Cell::Floor);
        assert_eq!(g.cell(Position::new(3, 1)), Cell::PowerPellet);
    }

    #[test]
    fn at_most_four_ghosts() {
        let g = grid(&[
            "########",
            "#PGGGGG#",
            "########",
        ]);
        assert_eq!(g.ghost_starts().len(), MAX_GHOSTS);
        assert!(g.is_walkable(Position::new(6, 1)));
    }

    #[test]
    fn ragged_rows_rejected() {
        let err = Grid::parse(&["#####", "#P.G", "#####"]).unwrap_err();
        assert_eq!(err, LevelError::RaggedRow { row: 1, expected: 5, found: 4 });
    }

    #[test]
    fn missing_markers_rejected() {
        assert_eq!(Grid::parse(&["#####", "#..G#", "#####"]).unwrap_err(), LevelError::MissingPlayer);
        assert_eq!(Grid::parse(&["#####", "#P..#", "#####"]).unwrap_err(), LevelError::MissingGhost);
        assert_eq!(Grid::parse::<&str>(&[]).unwrap_err(), LevelError::Empty);
    }

    #[test]
    fn unknown_tile_rejected() {
        let err = Grid::parse(&["#####", "#PxG#", "#####"]).unwrap_err();
        assert_eq!(err, LevelError::UnknownTile { ch: 'x', col: 2, row: 1 });
    }

    #[test]
    fn out_of_bounds_is_wall() {
        let g = grid(&["#####", "#P.G#", "#####"]);
        assert!(!g.is_walkable(Position::new(-1, 1)));
        assert!(!g.is_walkable(Position::new(5, 1)));
        assert!(!g.is_walkable(Position::new(2, -1)));
    }

    #[test]
    fn consume_pellet_once() {
        let mut g = grid(&["#####", "#P.G#", "#####"]);
        let at = Position::new(2, 1);
        assert_eq!(g.consume(at), Cell::Pellet);
        assert_eq!(g.cell(at), Cell::Empty);
        assert_eq!(g.pellets_remaining(), 0);
        // Second bite is a no-op
        assert_eq!(g.consume(at), Cell::Empty);
        assert_eq!(g.pellets_remaining(), 0);
        // Floor is a no-op too
        assert_eq!(g.consume(Position::new(1, 1)), Cell::Floor);
        assert_eq!(g.pellets_remaining(), live_pellets(&g));
    }

    #[test]
    fn reset_restores_pellets() {
        let mut g = grid(&["#######", "#P.o.G#", "#######"]);
        g.consume(Position::new(2, 1));
        g.consume(Position::new(3, 1));
        assert_eq!(g.pellets_remaining(), 1);
        g.reset();
        assert_eq!(g.pellets_remaining(), 3);
        assert_eq!(g.cell(Position::new(3, 1)), Cell::PowerPellet);
    }

    #[test]
    fn tunnel_wraps_both_ways() {
        let g = grid(&[
            "#######",
            "  P.G  ",
            "#######",
        ]);
        assert!(g.is_tunnel_row(1));
        assert!(!g.is_tunnel_row(0));
        assert_eq!(g.wrap(Position::new(-1, 1)), Position::new(6, 1));
        assert_eq!(g.wrap(Position::new(7, 1)), Position::new(0, 1));
        assert_eq!(g.neighbor(Position::new(0, 1), Direction::Left), Some(Position::new(6, 1)));
        assert_eq!(g.neighbor(Position::new(6, 1), Direction::Right), Some(Position::new(0, 1)));
    }

    #[test]
    fn wrap_lands_on_rightmost_walkable() {
        // Right edge walkable, but the cell before it is a wall: the
        // rightmost walkable cell is still the edge.
        let g = grid(&[
            "########",
            " P.G  # ",
            "########",
        ]);
        assert_eq!(g.wrap(Position::new(-1, 1)), Position::new(7, 1));
    }

    #[test]
    fn non_tunnel_rows_do_not_wrap() {
        let g = grid(&[
            "#####",
            " P.G#",
            "#####",
        ]);
        assert!(!g.is_tunnel_row(1));
        assert_eq!(g.wrap(Position::new(-1, 1)), Position::new(-1, 1));
        assert_eq!(g.neighbor(Position::new(0, 1), Direction::Left), None);
    }

    #[test]
    fn walkable_directions_in_corridor() {
        let g = grid(&[
            "#####",
            "#P.G#",
            "#####",
        ]);
        assert_eq!(g.walkable_directions(Position::new(2, 1)), vec![Direction::Left, Direction::Right]);
        assert_eq!(g.walkable_directions(Position::new(1, 1)), vec![Direction::Right]);
    }
}
