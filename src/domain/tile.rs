/// Maze cell kinds.
/// Properties are queried via methods so cell semantics stay in one place.
///
/// `Floor` is open path as drawn in the layout, `Empty` is a cell whose
/// pellet has been eaten. Both are walkable and look the same on screen.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Cell {
    Wall,
    #[default]
    Floor,
    Pellet,
    PowerPellet,
    Empty,
}

impl Cell {
    /// Map a layout character to its cell. Spawn markers are floor.
    pub fn from_layout(ch: char) -> Option<Cell> {
        match ch {
            '#' => Some(Cell::Wall),
            '.' => Some(Cell::Pellet),
            'o' => Some(Cell::PowerPellet),
            ' ' | 'P' | 'G' => Some(Cell::Floor),
            _ => None,
        }
    }

    pub fn is_walkable(self) -> bool {
        !matches!(self, Cell::Wall)
    }

    /// Pellet or power-pellet.
    pub fn is_pellet(self) -> bool {
        matches!(self, Cell::Pellet | Cell::PowerPellet)
    }
}
