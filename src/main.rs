//! Entry point and game loop.

mod config;
mod domain;
mod error;
mod sim;
mod ui;

use std::fs::OpenOptions;
use std::process::ExitCode;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use config::{GameConfig, GeneralConfig};
use domain::ai::{BiasedPolicy, DirectionPolicy};
use domain::entity::{Direction, FrameInput};
use error::GameResult;
use sim::level;
use sim::step;
use sim::world::WorldState;
use ui::gamepad::GamepadState;
use ui::input::{InputState, KEYS_PAUSE, KEYS_QUIT, KEYS_RESTART};
use ui::renderer::Renderer;
use ui::sound::SoundEngine;

const FRAME_SLEEP: Duration = Duration::from_millis(5);

fn main() -> ExitCode {
    let (mut config, config_err) = GameConfig::load();
    init_logging(&config.general);
    if let Some(e) = config_err {
        warn!(error = %e, "config.toml ignored, using defaults");
    }
    config.sanitize();

    match run(&config) {
        Ok(score) => {
            println!();
            println!("Thanks for playing Maze Chase!");
            println!("Final Score: {score}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "fatal");
            eprintln!("mazechase: {e}");
            ExitCode::FAILURE
        }
    }
}

/// The terminal belongs to the game, so logs go to a file or nowhere.
fn init_logging(general: &GeneralConfig) {
    let path = general.log_file.trim();
    if path.is_empty() {
        return;
    }
    let file = match OpenOptions::new().create(true).append(true).open(path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("mazechase: cannot open log file {path}: {e}");
            return;
        }
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(general.log_level.as_str()));
    if let Err(e) = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
    {
        eprintln!("mazechase: logging disabled: {e}");
    }
}

/// Load the level, own the terminal for the session, return the final score.
fn run(config: &GameConfig) -> GameResult<u32> {
    let grid = level::load(config.level_path().as_deref())?;

    let bias = config.rules.chase_bias;
    let seed = config.general.seed;
    let policy: Box<dyn DirectionPolicy> = if seed != 0 {
        Box::new(BiasedPolicy::seeded(seed, bias))
    } else {
        Box::new(BiasedPolicy::from_entropy(bias))
    };
    info!(seed, bias, tick_ms = config.speed.tick_rate_ms, "starting game");

    let mut world = WorldState::new(grid, config.speed.clone(), config.rules.clone(), policy);
    let mut renderer = Renderer::new();

    if let Err(e) = renderer.init() {
        let _ = renderer.cleanup();
        return Err(e.into());
    }

    let sound = SoundEngine::new();
    let result = game_loop(&mut world, &mut renderer, sound.as_ref(), config);
    let cleanup = renderer.cleanup();
    result?;
    cleanup?;

    info!(score = world.player.score, level = world.level, "session ended");
    Ok(world.player.score)
}

fn game_loop(
    world: &mut WorldState,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
) -> GameResult<()> {
    let mut kb = InputState::new();
    kb.honor_release = renderer.reports_key_release();
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);
    info!(key_release = kb.honor_release, gamepad = gp.connected, "input ready");
    let tick_rate = config.speed.tick_duration();
    let mut last_tick = Instant::now();
    let mut restart_requested = false;

    loop {
        kb.drain_events()?;
        gp.update();

        if kb.ctrl_c_pressed() {
            break;
        }
        match handle_meta(world, &kb, &gp) {
            Meta::Quit => break,
            Meta::Restart => restart_requested = true,
            Meta::None => {}
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
            // Pause blocks the simulation entirely.
            if !world.paused {
                let input = FrameInput {
                    movement: detect_movement(&kb, &gp),
                    restart: std::mem::take(&mut restart_requested),
                };
                let events = step::step(world, input);
                if let Some(sfx) = sound {
                    sfx.play_events(&events);
                }
            }
        }

        renderer.render(world)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

fn detect_movement(kb: &InputState, gp: &GamepadState) -> Direction {
    match kb.direction() {
        Direction::None => gp.direction(),
        dir => dir,
    }
}

enum Meta {
    None,
    Quit,
    Restart,
}

/// One-shot keys: quit, pause, restart.
fn handle_meta(world: &mut WorldState, kb: &InputState, gp: &GamepadState) -> Meta {
    if kb.any_pressed(KEYS_QUIT) || gp.cancel_pressed() {
        return Meta::Quit;
    }

    if world.is_game_over() {
        if kb.any_pressed(KEYS_RESTART) || gp.confirm_pressed() {
            return Meta::Restart;
        }
        return Meta::None;
    }

    if kb.any_pressed(KEYS_PAUSE) || gp.pause_pressed() {
        world.paused = !world.paused;
        info!(paused = world.paused, tick = world.tick, "pause toggled");
    }
    Meta::None
}
