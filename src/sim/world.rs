//! WorldState: the complete snapshot of a running game.
//!
//! ## Mode
//!   - `Playing`: ghosts chase.
//!   - `Power`: a power pellet is active; `power_timer` counts down and
//!     every non-Eaten ghost is Frightened.
//!   - `GameOver`: frozen until a restart request.
//!
//! `power_timer` is non-zero only in `Power`.

use std::time::Duration;

use crate::config::{RulesConfig, SpeedConfig};
use crate::domain::ai::DirectionPolicy;
use crate::domain::entity::{Ghost, GhostState, Player};
use crate::domain::grid::Grid;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Mode {
    Playing,
    Power,
    GameOver,
}

impl Mode {
    pub fn label(self) -> &'static str {
        match self {
            Mode::Playing => "PLAYING",
            Mode::Power => "POWER",
            Mode::GameOver => "GAME OVER",
        }
    }
}

/// Read-only HUD snapshot.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Hud {
    pub score: u32,
    pub lives: u32,
    pub mode: Mode,
    pub level: u32,
    /// Seconds of power left; `None` outside Power mode.
    pub power_left: Option<f32>,
    pub pellets_remaining: usize,
}

pub struct WorldState {
    // ── Maze ──
    pub grid: Grid,

    // ── Entities ──
    pub player: Player,
    pub ghosts: Vec<Ghost>,

    // ── Rules ──
    pub speed: SpeedConfig,
    pub rules: RulesConfig,
    pub policy: Box<dyn DirectionPolicy>,

    // ── Meta ──
    pub mode: Mode,
    pub power_timer: Duration,
    pub level: u32,
    pub tick: u64,
    pub paused: bool,

    // ── UI ──
    pub message: String,
    pub message_timer: u32,
}

impl WorldState {
    pub fn new(grid: Grid, speed: SpeedConfig, rules: RulesConfig, policy: Box<dyn DirectionPolicy>) -> Self {
        let player = Player::new(grid.player_start(), rules.starting_lives);
        let ghosts = grid
            .ghost_starts()
            .iter()
            .enumerate()
            .map(|(id, &home)| Ghost::new(id, home))
            .collect();
        WorldState {
            grid,
            player,
            ghosts,
            speed,
            rules,
            policy,
            mode: Mode::Playing,
            power_timer: Duration::ZERO,
            level: 1,
            tick: 0,
            paused: false,
            message: String::new(),
            message_timer: 0,
        }
    }

    pub fn hud(&self) -> Hud {
        Hud {
            score: self.player.score,
            lives: self.player.lives,
            mode: self.mode,
            level: self.level,
            power_left: (self.mode == Mode::Power).then(|| self.power_timer.as_secs_f32()),
            pellets_remaining: self.grid.pellets_remaining(),
        }
    }

    pub fn is_game_over(&self) -> bool {
        self.mode == Mode::GameOver
    }

    /// `duration` is in ticks.
    pub fn set_message(&mut self, msg: &str, duration: u32) {
        self.message = msg.to_string();
        self.message_timer = duration;
    }

    /// Ticks covering `secs` at the configured tick rate.
    pub fn ticks_for(&self, secs: f32) -> u32 {
        let ms = (secs.max(0.0) * 1000.0).round() as u64;
        ms.div_ceil(self.speed.tick_rate_ms.max(1)) as u32
    }

    /// Player and ghosts back to spawn. Score, lives and pellets are kept.
    pub fn respawn_actors(&mut self) {
        self.player.respawn(self.grid.player_start());
        for g in &mut self.ghosts {
            g.respawn();
        }
    }

    /// Power-up length rounded up to whole ticks, at least one.
    pub fn power_span(&self) -> Duration {
        let tick = self.speed.tick_duration();
        let ticks = self.rules.power_duration().as_millis().div_ceil(tick.as_millis()).max(1);
        u32::try_from(ticks)
            .ok()
            .and_then(|n| tick.checked_mul(n))
            .unwrap_or(Duration::MAX)
    }

    /// Start (or refresh) power mode.
    pub fn enter_power(&mut self) {
        self.mode = Mode::Power;
        self.power_timer = self.power_span();
        for g in &mut self.ghosts {
            if g.state != GhostState::Eaten {
                g.state = GhostState::Frightened;
            }
        }
    }

    /// Leave power mode. Frightened ghosts calm down; Eaten ones keep
    /// heading home.
    pub fn end_power(&mut self) {
        self.mode = Mode::Playing;
        self.power_timer = Duration::ZERO;
        for g in &mut self.ghosts {
            if g.state == GhostState::Frightened {
                g.state = GhostState::Normal;
            }
        }
    }
}
