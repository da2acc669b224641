//! The step function: advances the world by one tick.
//!
//! Processing order:
//!   1. Game over: honour a restart request, nothing else
//!   2. Tick counter, HUD message timer
//!   3. Power timer countdown (expiry calms Frightened ghosts)
//!   4. Player movement + pellet consumption
//!   5. Collision
//!   6. Ghost movement (roaming or heading home)
//!   7. Collision
//!   8. Level clear check
//!
//! Movement is sequential with a collision check after each half, so a
//! player and ghost that trade cells always meet in the first check.
//! A lost life ends the tick early.

use tracing::{debug, info};

use crate::domain::ai;
use crate::domain::entity::{ready_to_move, Direction, FrameInput, GhostState, Player};
use crate::domain::tile::Cell;
use super::event::GameEvent;
use super::world::{Mode, WorldState};

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step(world: &mut WorldState, input: FrameInput) -> Vec<GameEvent> {
    let mut events: Vec<GameEvent> = Vec::new();

    if world.mode == Mode::GameOver {
        if input.restart {
            restart_game(world, &mut events);
        }
        return events;
    }

    world.tick += 1;
    if world.message_timer > 0 {
        world.message_timer -= 1;
        if world.message_timer == 0 { world.message.clear(); }
    }

    resolve_power_timer(world, &mut events);
    resolve_player_movement(world, input.movement, &mut events);
    if resolve_collisions(world, &mut events) { return events; }
    resolve_ghost_movement(world, &mut events);
    if resolve_collisions(world, &mut events) { return events; }
    resolve_level_clear(world, &mut events);

    events
}

// ══════════════════════════════════════════════════════════════
// Power timer
// ══════════════════════════════════════════════════════════════

fn resolve_power_timer(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    if world.mode != Mode::Power { return; }
    world.power_timer = world.power_timer.saturating_sub(world.speed.tick_duration());
    if world.power_timer.is_zero() {
        world.end_power();
        events.push(GameEvent::PowerExpired);
        debug!(tick = world.tick, "power expired");
    }
}

// ══════════════════════════════════════════════════════════════
// Player movement
// ══════════════════════════════════════════════════════════════

/// Queue the requested turn, then on a move tick take it if open, else
/// keep going straight, else stand still.
fn resolve_player_movement(world: &mut WorldState, movement: Direction, events: &mut Vec<GameEvent>) {
    let p = &mut world.player;
    if movement != Direction::None {
        p.queued = movement;
    }
    if !ready_to_move(&mut p.move_cooldown, world.speed.player_move_rate) { return; }

    let next = match world.grid.neighbor(p.pos, p.queued) {
        Some(n) => {
            p.direction = p.queued;
            n
        }
        None => match world.grid.neighbor(p.pos, p.direction) {
            Some(n) => n,
            None => return,
        },
    };
    p.pos = next;

    resolve_pellet(world, events);
}

fn resolve_pellet(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    let pos = world.player.pos;
    match world.grid.consume(pos) {
        Cell::Pellet => {
            world.player.score += world.rules.pellet_score;
            events.push(GameEvent::PelletEaten { pos });
        }
        Cell::PowerPellet => {
            world.player.score += world.rules.power_pellet_score;
            world.enter_power();
            events.push(GameEvent::PowerPelletEaten { pos });
            debug!(?pos, "power pellet eaten");
        }
        _ => {}
    }
}

// ══════════════════════════════════════════════════════════════
// Ghost movement
// ══════════════════════════════════════════════════════════════

fn resolve_ghost_movement(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    let player = world.player.pos;
    let speed = &world.speed;

    for g in &mut world.ghosts {
        let rate = match g.state {
            GhostState::Normal => speed.ghost_move_rate,
            GhostState::Frightened => speed.frightened_move_rate,
            GhostState::Eaten => speed.eaten_move_rate,
        };
        if !ready_to_move(&mut g.move_cooldown, rate) { continue; }

        let dir = if g.is_eaten() {
            ai::path_step(&world.grid, g.pos, g.home)
        } else {
            ai::roam_direction(&world.grid, world.policy.as_mut(), g.pos, g.direction, player, g.state)
        };
        if let Some(next) = world.grid.neighbor(g.pos, dir) {
            g.pos = next;
            g.direction = dir;
        }

        if g.is_eaten() && g.pos == g.home {
            g.state = GhostState::Normal;
            g.direction = Direction::None;
            events.push(GameEvent::GhostRevived { id: g.id });
            debug!(ghost = ?g.name, "ghost back home");
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Collision
// ══════════════════════════════════════════════════════════════

/// Returns true when the player lost a life (rest of the tick is skipped).
fn resolve_collisions(world: &mut WorldState, events: &mut Vec<GameEvent>) -> bool {
    let pos = world.player.pos;
    for i in 0..world.ghosts.len() {
        if world.ghosts[i].pos != pos { continue; }
        match world.ghosts[i].state {
            GhostState::Frightened => {
                let g = &mut world.ghosts[i];
                g.state = GhostState::Eaten;
                world.player.score += world.rules.ghost_score;
                events.push(GameEvent::GhostEaten { id: g.id, pos });
                debug!(ghost = ?g.name, score = world.player.score, "ghost eaten");
            }
            GhostState::Normal => {
                player_caught(world, events);
                return true;
            }
            GhostState::Eaten => {}
        }
    }
    false
}

fn player_caught(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    world.player.lives = world.player.lives.saturating_sub(1);
    let lives_left = world.player.lives;
    events.push(GameEvent::PlayerCaught { lives_left });

    world.end_power();
    if lives_left == 0 {
        world.mode = Mode::GameOver;
        let score = world.player.score;
        events.push(GameEvent::GameOver { score });
        info!(score, level = world.level, "game over");
        world.set_message("GAME OVER  [R] restart  [Esc] quit", 0);
        return;
    }

    world.respawn_actors();
    let ticks = world.ticks_for(2.0);
    world.set_message(&format!("Caught! {lives_left} left"), ticks);
}

// ══════════════════════════════════════════════════════════════
// Level clear / restart
// ══════════════════════════════════════════════════════════════

fn resolve_level_clear(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    if world.grid.pellets_remaining() > 0 { return; }

    let cleared = world.level;
    events.push(GameEvent::LevelCleared { level: cleared });
    info!(level = cleared, score = world.player.score, "level cleared");

    world.grid.reset();
    world.end_power();
    world.respawn_actors();
    world.level += 1;
    let ticks = world.ticks_for(2.0);
    world.set_message(&format!("Level {cleared} cleared!"), ticks);
}

fn restart_game(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    world.grid.reset();
    world.player = Player::new(world.grid.player_start(), world.rules.starting_lives);
    for g in &mut world.ghosts {
        g.respawn();
    }
    world.mode = Mode::Playing;
    world.power_timer = std::time::Duration::ZERO;
    world.level = 1;
    world.message.clear();
    world.message_timer = 0;
    events.push(GameEvent::Restarted);
    info!("game restarted");
}
