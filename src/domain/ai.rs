//! Ghost AI.
//!
//! Three behaviours, one per `GhostState`:
//!   1. **Normal**: pick among walkable non-reverse directions, biased toward
//!      the player.
//!   2. **Frightened**: same candidates, biased away from the player.
//!   3. **Eaten**: BFS shortest path back to the ghost's home cell.
//!
//! Normal and Frightened go through a `DirectionPolicy` so tests can inject a
//! seeded or scripted chooser. Eaten navigation is deterministic.

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use super::entity::{Direction, GhostState, Position};
use super::grid::Grid;

/// Probability of the greedy move when the configured bias is unusable.
pub const DEFAULT_CHASE_BIAS: f64 = 0.8;

/// Everything a policy may look at when choosing a direction. The ghost's
/// own cell is implied by `targets`, one step away in each option.
#[derive(Clone, Copy, Debug)]
pub struct Choice<'a> {
    pub player: Position,
    /// Walkable candidates, never empty.
    pub options: &'a [Direction],
    /// The cell each option leads to (same order as `options`).
    pub targets: &'a [Position],
    pub state: GhostState,
}

pub trait DirectionPolicy {
    fn choose(&mut self, choice: &Choice<'_>) -> Direction;
}

/// Biased random walk.
///
/// With probability `bias` take the option that best improves squared
/// distance to the player (closest when Normal, farthest when Frightened),
/// breaking ties uniformly. Otherwise take any option uniformly.
pub struct BiasedPolicy<R: Rng> {
    rng: R,
    bias: f64,
}

impl<R: Rng> BiasedPolicy<R> {
    /// `bias` is clamped to `0.0..=1.0`; NaN and infinities fall back to
    /// `DEFAULT_CHASE_BIAS`.
    pub fn new(rng: R, bias: f64) -> Self {
        let bias = if bias.is_finite() { bias.clamp(0.0, 1.0) } else { DEFAULT_CHASE_BIAS };
        BiasedPolicy { rng, bias }
    }
}

impl BiasedPolicy<StdRng> {
    /// Reproducible policy from a seed.
    pub fn seeded(seed: u64, bias: f64) -> Self {
        BiasedPolicy::new(StdRng::seed_from_u64(seed), bias)
    }

    /// Policy seeded from OS entropy.
    pub fn from_entropy(bias: f64) -> Self {
        BiasedPolicy::new(StdRng::from_entropy(), bias)
    }
}

impl<R: Rng> DirectionPolicy for BiasedPolicy<R> {
    fn choose(&mut self, choice: &Choice<'_>) -> Direction {
        if choice.options.len() == 1 {
            return choice.options[0];
        }

        if !self.rng.gen_bool(self.bias) {
            return *choice.options.choose(&mut self.rng).unwrap_or(&Direction::None);
        }

        let flee = choice.state == GhostState::Frightened;
        let score = |target: Position| {
            let d = target.dist_sq(choice.player);
            if flee { -d } else { d }
        };
        let best = choice.targets.iter().map(|&t| score(t)).min().unwrap_or(0);
        let tied: Vec<Direction> = choice
            .options
            .iter()
            .zip(choice.targets)
            .filter(|(_, &t)| score(t) == best)
            .map(|(&d, _)| d)
            .collect();
        *tied.choose(&mut self.rng).unwrap_or(&Direction::None)
    }
}

/// Candidate directions for a roaming ghost: walkable, and not a reversal
/// unless reversing is the only way out.
pub fn candidate_directions(grid: &Grid, pos: Position, heading: Direction) -> Vec<Direction> {
    let open = grid.walkable_directions(pos);
    if open.len() <= 1 {
        return open;
    }
    let reverse = heading.reverse();
    open.into_iter().filter(|&d| d != reverse).collect()
}

/// Choose the next direction for a Normal or Frightened ghost.
/// Returns `Direction::None` when the ghost is boxed in.
pub fn roam_direction(
    grid: &Grid,
    policy: &mut dyn DirectionPolicy,
    pos: Position,
    heading: Direction,
    player: Position,
    state: GhostState,
) -> Direction {
    let options = candidate_directions(grid, pos, heading);
    if options.is_empty() {
        return Direction::None;
    }
    let targets: Vec<Position> = options
        .iter()
        .filter_map(|&d| grid.neighbor(pos, d))
        .collect();
    policy.choose(&Choice { player, options: &options, targets: &targets, state })
}

/// First step of a shortest walkable path from `from` to `goal`, tunnels
/// included. `Direction::None` when already there or unreachable.
pub fn path_step(grid: &Grid, from: Position, goal: Position) -> Direction {
    if from == goal {
        return Direction::None;
    }

    let (w, h) = (grid.width(), grid.height());
    let mut visited = vec![vec![false; w]; h];
    visited[from.row as usize][from.col as usize] = true;

    let mut queue: VecDeque<(Position, Direction)> = VecDeque::with_capacity(64);
    for dir in Direction::ALL {
        if let Some(next) = grid.neighbor(from, dir) {
            if next == goal {
                return dir;
            }
            visited[next.row as usize][next.col as usize] = true;
            queue.push_back((next, dir));
        }
    }

    while let Some((cur, first)) = queue.pop_front() {
        for dir in Direction::ALL {
            if let Some(next) = grid.neighbor(cur, dir) {
                let seen = &mut visited[next.row as usize][next.col as usize];
                if *seen {
                    continue;
                }
                if next == goal {
                    return first;
                }
                *seen = true;
                queue.push_back((next, first));
            }
        }
    }

    Direction::None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: &[&str]) -> Grid {
        Grid::parse(rows).expect("valid level")
    }

    /// Always returns the first option.
    struct FirstOption;

    impl DirectionPolicy for FirstOption {
        fn choose(&mut self, choice: &Choice<'_>) -> Direction {
            choice.options[0]
        }
    }

    // ── Candidates ──

    #[test]
    fn no_reverse_when_alternatives_exist() {
        let g = grid(&[
            "#####",
            "#P.G#",
            "##.##",
            "#####",
        ]);
        // At (2,1) heading Right: Left is the reverse, Down and Right remain.
        let c = candidate_directions(&g, Position::new(2, 1), Direction::Right);
        assert!(!c.contains(&Direction::Left));
        assert!(c.contains(&Direction::Down));
        assert!(c.contains(&Direction::Right));
    }

    #[test]
    fn reverse_allowed_in_dead_end() {
        let g = grid(&["#####", "#P.G#", "#####"]);
        // (3,1) heading Right is a dead end: only Left is open.
        let c = candidate_directions(&g, Position::new(3, 1), Direction::Right);
        assert_eq!(c, vec![Direction::Left]);
    }

    // ── Biased policy ──

    fn crossroads() -> Grid {
        grid(&[
            "#######",
            "###.###",
            "#P...G#",
            "###.###",
            "#######",
        ])
    }

    #[test]
    fn full_bias_chases() {
        let g = crossroads();
        let mut p = BiasedPolicy::seeded(7, 1.0);
        let from = Position::new(3, 2);
        let player = Position::new(1, 2);
        for _ in 0..20 {
            let d = roam_direction(&g, &mut p, from, Direction::None, player, GhostState::Normal);
            assert_eq!(d, Direction::Left);
        }
    }

    #[test]
    fn full_bias_flees_when_frightened() {
        let g = crossroads();
        let mut p = BiasedPolicy::seeded(7, 1.0);
        let from = Position::new(3, 2);
        let player = Position::new(1, 2);
        for _ in 0..20 {
            let d = roam_direction(&g, &mut p, from, Direction::None, player, GhostState::Frightened);
            assert_eq!(d, Direction::Right);
        }
    }

    #[test]
    fn zero_bias_still_picks_valid_options() {
        let g = crossroads();
        let mut p = BiasedPolicy::seeded(1, 0.0);
        let from = Position::new(3, 2);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            let player = Position::new(1, 2);
            let d = roam_direction(&g, &mut p, from, Direction::None, player, GhostState::Normal);
            assert!(g.neighbor(from, d).is_some());
            seen.insert(d);
        }
        assert_eq!(seen.len(), 4, "uniform choice should reach every exit");
    }

    #[test]
    fn chase_ties_are_randomised() {
        let g = crossroads();
        let mut p = BiasedPolicy::seeded(3, 1.0);
        let from = Position::new(3, 2);
        // Player two rows straight up: Left and Right are equally far.
        let player = Position::new(3, 0);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..100 {
            seen.insert(roam_direction(&g, &mut p, from, Direction::Up, player, GhostState::Frightened));
        }
        // Heading Up excludes Down; Left and Right tie as the farthest.
        assert!(seen.contains(&Direction::Left));
        assert!(seen.contains(&Direction::Right));
        assert!(!seen.contains(&Direction::Down));
    }

    #[test]
    fn same_seed_same_choices() {
        let g = crossroads();
        let (from, player) = (Position::new(3, 2), Position::new(1, 2));
        let run = |seed| {
            let mut p = BiasedPolicy::seeded(seed, 0.5);
            (0..50)
                .map(|_| roam_direction(&g, &mut p, from, Direction::None, player, GhostState::Normal))
                .collect::<Vec<_>>()
        };
        assert_eq!(run(42), run(42));
    }

    #[test]
    fn unusable_bias_falls_back_to_default() {
        let g = crossroads();
        let from = Position::new(3, 2);
        for bias in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let mut p = BiasedPolicy::seeded(1, bias);
            assert_eq!(p.bias, DEFAULT_CHASE_BIAS);
            for _ in 0..50 {
                let player = Position::new(1, 2);
                let d = roam_direction(&g, &mut p, from, Direction::None, player, GhostState::Normal);
                assert!(g.neighbor(from, d).is_some());
            }
        }
        assert_eq!(BiasedPolicy::seeded(1, 3.0).bias, 1.0);
        assert_eq!(BiasedPolicy::seeded(1, -1.0).bias, 0.0);
    }

    #[test]
    fn boxed_in_ghost_stays() {
        let g = grid(&["#####", "#P#G#", "#####"]);
        let mut p = FirstOption;
        let (from, player) = (Position::new(3, 1), Position::new(1, 1));
        let d = roam_direction(&g, &mut p, from, Direction::None, player, GhostState::Normal);
        assert_eq!(d, Direction::None);
    }

    // ── Home navigation ──

    #[test]
    fn path_step_goes_around_walls() {
        let g = grid(&[
            "#######",
            "#P....#",
            "#.###.#",
            "#....G#",
            "#######",
        ]);
        // From (3,1) to (3,3): both ways around are 4 steps; either first
        // step is fine but it must be horizontal.
        let d = path_step(&g, Position::new(3, 1), Position::new(3, 3));
        assert!(matches!(d, Direction::Left | Direction::Right));

        assert_eq!(path_step(&g, Position::new(5, 1), Position::new(5, 3)), Direction::Down);
    }

    #[test]
    fn path_step_uses_tunnel() {
        let g = grid(&[
            "#########",
            "P.......G",
            "#########",
        ]);
        // Home at column 8; from column 0 the tunnel is one step.
        assert_eq!(path_step(&g, Position::new(0, 1), Position::new(8, 1)), Direction::Left);
    }

    #[test]
    fn path_step_at_goal_or_unreachable() {
        let g = grid(&["#####", "#P#G#", "#####"]);
        assert_eq!(path_step(&g, Position::new(3, 1), Position::new(3, 1)), Direction::None);
        assert_eq!(path_step(&g, Position::new(1, 1), Position::new(3, 1)), Direction::None);
    }

    #[test]
    fn following_path_steps_reaches_home() {
        let g = grid(&[
            "#########",
            "#P.....##",
            "#.##.#..#",
            "#....#.G#",
            "#########",
        ]);
        let home = Position::new(7, 3);
        let mut pos = Position::new(1, 3);
        for _ in 0..30 {
            if pos == home {
                break;
            }
            let d = path_step(&g, pos, home);
            pos = g.neighbor(pos, d).expect("path step must be walkable");
        }
        assert_eq!(pos, home);
    }
}
