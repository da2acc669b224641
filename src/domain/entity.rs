//! Entities: Player and Ghost, plus the grid coordinate and direction types
//! they move with. Movement is cell based; `move_cooldown` counts ticks
//! until the next one-cell step.

/// Grid coordinate. Signed so a step off the edge can be expressed before
/// `Grid::wrap` folds it back onto a tunnel row.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct Position {
    pub col: i32,
    pub row: i32,
}

impl Position {
    pub const fn new(col: i32, row: i32) -> Self {
        Position { col, row }
    }

    /// The adjacent position in `dir` (no wrapping, no bounds check).
    pub fn offset(self, dir: Direction) -> Position {
        let (dx, dy) = dir.delta();
        Position { col: self.col + dx, row: self.row + dy }
    }

    /// Squared Euclidean distance.
    pub fn dist_sq(self, other: Position) -> i32 {
        let dx = self.col - other.col;
        let dy = self.row - other.row;
        dx * dx + dy * dy
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    #[default]
    None,
}

impl Direction {
    /// The four movement directions, in the order candidates are scanned.
    pub const ALL: [Direction; 4] = [Direction::Up, Direction::Left, Direction::Down, Direction::Right];

    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
            Direction::None => (0, 0),
        }
    }

    pub fn reverse(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
            Direction::None => Direction::None,
        }
    }
}

/// What the input layer hands to `step` each tick.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameInput {
    /// Requested direction; `Direction::None` when no key is held.
    pub movement: Direction,
    /// Restart request. Only honoured in game over.
    pub restart: bool,
}

#[derive(Clone, Debug)]
pub struct Player {
    pub pos: Position,
    pub direction: Direction,
    /// Last requested direction, applied as soon as it is walkable.
    pub queued: Direction,
    pub move_cooldown: u32,
    pub score: u32,
    pub lives: u32,
}

impl Player {
    pub fn new(pos: Position, lives: u32) -> Self {
        Player {
            pos,
            direction: Direction::None,
            queued: Direction::None,
            move_cooldown: 0,
            score: 0,
            lives,
        }
    }

    /// Back to spawn, keeping score and lives.
    pub fn respawn(&mut self, pos: Position) {
        self.pos = pos;
        self.direction = Direction::None;
        self.queued = Direction::None;
        self.move_cooldown = 0;
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GhostState {
    Normal,
    Frightened,
    Eaten,
}

/// The four classic ghosts; only used for colour.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GhostName {
    Blinky,
    Pinky,
    Inky,
    Clyde,
}

impl GhostName {
    pub const ROSTER: [GhostName; 4] = [GhostName::Blinky, GhostName::Pinky, GhostName::Inky, GhostName::Clyde];
}

#[derive(Clone, Debug)]
pub struct Ghost {
    pub id: usize,
    pub name: GhostName,
    pub pos: Position,
    pub direction: Direction,
    pub state: GhostState,
    pub home: Position,
    pub move_cooldown: u32,
}

impl Ghost {
    pub fn new(id: usize, home: Position) -> Self {
        Ghost {
            id,
            name: GhostName::ROSTER[id % GhostName::ROSTER.len()],
            pos: home,
            direction: Direction::None,
            state: GhostState::Normal,
            home,
            move_cooldown: 0,
        }
    }

    pub fn respawn(&mut self) {
        self.pos = self.home;
        self.direction = Direction::None;
        self.state = GhostState::Normal;
        self.move_cooldown = 0;
    }

    pub fn is_eaten(&self) -> bool {
        self.state == GhostState::Eaten
    }
}

/// Count down a move cooldown. Returns true when the entity may step this
/// tick, re-arming the cooldown to `rate` ticks.
pub fn ready_to_move(cooldown: &mut u32, rate: u32) -> bool {
    if *cooldown > 0 {
        *cooldown -= 1;
    }
    if *cooldown == 0 {
        *cooldown = rate.max(1);
        true
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reverse_pairs() {
        for d in Direction::ALL {
            assert_eq!(d.reverse().reverse(), d);
            assert_ne!(d.reverse(), d);
        }
        assert_eq!(Direction::None.reverse(), Direction::None);
    }

    #[test]
    fn offset_follows_screen_axes() {
        let p = Position::new(3, 3);
        assert_eq!(p.offset(Direction::Up), Position::new(3, 2));
        assert_eq!(p.offset(Direction::Down), Position::new(3, 4));
        assert_eq!(p.offset(Direction::Left), Position::new(2, 3));
        assert_eq!(p.offset(Direction::Right), Position::new(4, 3));
        assert_eq!(p.offset(Direction::None), p);
    }

    #[test]
    fn cooldown_rate_one_moves_every_tick() {
        let mut cd = 0;
        for _ in 0..5 {
            assert!(ready_to_move(&mut cd, 1));
        }
    }

    #[test]
    fn cooldown_rate_three() {
        let mut cd = 0;
        let moves: Vec<bool> = (0..7).map(|_| ready_to_move(&mut cd, 3)).collect();
        assert_eq!(moves, vec![true, false, false, true, false, false, true]);
    }

    #[test]
    fn ghost_names_cycle() {
        assert_eq!(Ghost::new(0, Position::default()).name, GhostName::Blinky);
        assert_eq!(Ghost::new(3, Position::default()).name, GhostName::Clyde);
        assert_eq!(Ghost::new(4, Position::default()).name, GhostName::Blinky);
    }
}
