//! External configuration loader.
//!
//! Reads `config.toml` from the executable's directory (or CWD).
//! Falls back to defaults if the file is missing or incomplete; a file that
//! exists but cannot be read or parsed also yields defaults, plus the error
//! so the caller can log it.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use crate::domain::ai::DEFAULT_CHASE_BIAS;
use crate::error::ConfigError;

/// Longest power-up accepted from the config file.
const MAX_POWER_SECONDS: f32 = 600.0;

// ── Public Config Struct ──

#[derive(Clone, Debug, Default)]
pub struct GameConfig {
    pub speed: SpeedConfig,
    pub rules: RulesConfig,
    pub gamepad: GamepadConfig,
    pub general: GeneralConfig,
}

/// Tick length and per-entity move rates (ticks per one-cell step).
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct SpeedConfig {
    pub tick_rate_ms: u64,
    pub player_move_rate: u32,
    pub ghost_move_rate: u32,
    pub frightened_move_rate: u32, // slower while fleeing
    pub eaten_move_rate: u32,      // faster on the way home
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct RulesConfig {
    pub starting_lives: u32,
    pub pellet_score: u32,
    pub power_pellet_score: u32,
    pub ghost_score: u32,
    pub power_seconds: f32,
    /// Probability that a ghost takes its best move rather than a random one.
    pub chase_bias: f64,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct GamepadConfig {
    pub confirm: Vec<String>,
    pub cancel: Vec<String>,
    pub pause: Vec<String>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct GeneralConfig {
    /// Empty = embedded classic maze.
    pub level_file: String,
    /// Empty = logging disabled.
    pub log_file: String,
    pub log_level: String,
    /// 0 = fresh seed every run.
    pub seed: u64,
}

// ── Defaults ──

impl Default for SpeedConfig {
    fn default() -> Self {
        SpeedConfig {
            tick_rate_ms: 25,
            player_move_rate: 5,      // 8 cells/s at 25ms
            ghost_move_rate: 6,
            frightened_move_rate: 10,
            eaten_move_rate: 3,
        }
    }
}

impl Default for RulesConfig {
    fn default() -> Self {
        RulesConfig {
            starting_lives: 3,
            pellet_score: 10,
            power_pellet_score: 50,
            ghost_score: 200,
            power_seconds: 8.0,
            chase_bias: DEFAULT_CHASE_BIAS,
        }
    }
}

impl Default for GamepadConfig {
    fn default() -> Self {
        GamepadConfig {
            confirm: vec!["Start".into(), "A".into()],
            cancel: vec!["Select".into()],
            pause: vec!["Y".into()],
        }
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        GeneralConfig {
            level_file: String::new(),
            log_file: String::new(),
            log_level: "info".into(),
            seed: 0,
        }
    }
}

impl SpeedConfig {
    pub fn tick_duration(&self) -> Duration {
        Duration::from_millis(self.tick_rate_ms.max(1))
    }
}

impl RulesConfig {
    /// Power-up length rounded to whole milliseconds. Unusable values give
    /// zero; `sanitize` keeps them out of a loaded config.
    pub fn power_duration(&self) -> Duration {
        let ms = (f64::from(self.power_seconds) * 1000.0).round();
        if ms.is_finite() && ms > 0.0 {
            Duration::from_millis(ms as u64)
        } else {
            Duration::ZERO
        }
    }

    /// Replace values the simulation cannot use. Returns the names of the
    /// fields that were changed.
    pub fn sanitize(&mut self) -> Vec<&'static str> {
        let mut fixed = vec![];
        let defaults = RulesConfig::default();

        if !self.power_seconds.is_finite() || self.power_seconds <= 0.0 {
            self.power_seconds = defaults.power_seconds;
            fixed.push("rules.power_seconds");
        } else if self.power_seconds > MAX_POWER_SECONDS {
            self.power_seconds = MAX_POWER_SECONDS;
            fixed.push("rules.power_seconds");
        }

        if !self.chase_bias.is_finite() {
            self.chase_bias = defaults.chase_bias;
            fixed.push("rules.chase_bias");
        } else if !(0.0..=1.0).contains(&self.chase_bias) {
            self.chase_bias = self.chase_bias.clamp(0.0, 1.0);
            fixed.push("rules.chase_bias");
        }
        fixed
    }
}

// ── TOML Schema ──

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct TomlConfig {
    speed: SpeedConfig,
    rules: RulesConfig,
    gamepad: GamepadConfig,
    general: GeneralConfig,
}

impl From<TomlConfig> for GameConfig {
    fn from(t: TomlConfig) -> Self {
        GameConfig {
            speed: t.speed,
            rules: t.rules,
            gamepad: t.gamepad,
            general: t.general,
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys fall back to defaults.
    pub fn load() -> (Self, Option<ConfigError>) {
        let search_dirs = candidate_dirs();
        match find_config(&search_dirs) {
            Some(path) => match Self::from_file(&path) {
                Ok(cfg) => (cfg, None),
                Err(e) => (GameConfig::default(), Some(e)),
            },
            None => (GameConfig::default(), None),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str::<TomlConfig>(text).map(GameConfig::from)
    }

    /// Fix out-of-range values in place, logging each one. Call after the
    /// logger is up.
    pub fn sanitize(&mut self) {
        let rules = self.rules.clone();
        for field in self.rules.sanitize() {
            warn!(
                field,
                power_seconds = rules.power_seconds,
                chase_bias = rules.chase_bias,
                "config value out of range, replaced"
            );
        }
    }

    /// Level file to load, if one is configured. Relative paths resolve
    /// against the candidate directories, then the CWD.
    pub fn level_path(&self) -> Option<PathBuf> {
        let name = self.general.level_file.trim();
        if name.is_empty() {
            return None;
        }
        let path = PathBuf::from(name);
        if path.is_absolute() {
            return Some(path);
        }
        Some(
            candidate_dirs()
                .iter()
                .map(|d| d.join(name))
                .find(|p| p.is_file())
                .unwrap_or(path),
        )
    }
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // Resolve symlinks so a linked binary still finds its data.
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

fn find_config(search_dirs: &[PathBuf]) -> Option<PathBuf> {
    search_dirs
        .iter()
        .map(|dir| dir.join("config.toml"))
        .find(|p| p.exists())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_all_defaults() {
        let cfg = GameConfig::from_toml_str("").unwrap();
        assert_eq!(cfg.speed, SpeedConfig::default());
        assert_eq!(cfg.rules, RulesConfig::default());
        assert_eq!(cfg.general.log_level, "info");
        assert!(cfg.level_path().is_none());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = GameConfig::from_toml_str(
            r#"
            [speed]
            tick_rate_ms = 40

            [rules]
            starting_lives = 5
            power_seconds = 6.5
            "#,
        )
        .unwrap();
        assert_eq!(cfg.speed.tick_rate_ms, 40);
        assert_eq!(cfg.speed.player_move_rate, SpeedConfig::default().player_move_rate);
        assert_eq!(cfg.rules.starting_lives, 5);
        assert_eq!(cfg.rules.pellet_score, 10);
        assert_eq!(cfg.rules.power_duration(), Duration::from_millis(6500));
    }

    #[test]
    fn default_power_is_eight_seconds() {
        assert_eq!(RulesConfig::default().power_duration(), Duration::from_secs(8));
    }

    #[test]
    fn power_duration_rounds_to_whole_millis() {
        let rules = RulesConfig { power_seconds: 0.05, ..RulesConfig::default() };
        assert_eq!(rules.power_duration(), Duration::from_millis(50));
        let rules = RulesConfig { power_seconds: f32::INFINITY, ..RulesConfig::default() };
        assert_eq!(rules.power_duration(), Duration::ZERO);
    }

    #[test]
    fn unusable_rules_are_replaced() {
        let mut cfg = GameConfig::from_toml_str(
            r#"
            [rules]
            power_seconds = inf
            chase_bias = nan
            "#,
        )
        .unwrap();
        assert!(cfg.rules.power_seconds.is_infinite());
        cfg.sanitize();
        assert_eq!(cfg.rules.power_seconds, 8.0);
        assert_eq!(cfg.rules.chase_bias, DEFAULT_CHASE_BIAS);

        let mut rules = RulesConfig { power_seconds: 0.0, chase_bias: 1.5, ..RulesConfig::default() };
        assert_eq!(rules.sanitize(), vec!["rules.power_seconds", "rules.chase_bias"]);
        assert_eq!(rules.power_seconds, 8.0);
        assert_eq!(rules.chase_bias, 1.0);

        let mut rules = RulesConfig { power_seconds: 1e30, ..RulesConfig::default() };
        assert_eq!(rules.sanitize(), vec!["rules.power_seconds"]);
        assert_eq!(rules.power_seconds, MAX_POWER_SECONDS);
    }

    #[test]
    fn sane_rules_are_untouched() {
        let mut rules = RulesConfig { power_seconds: 0.05, chase_bias: 0.0, ..RulesConfig::default() };
        assert!(rules.sanitize().is_empty());
        assert_eq!(rules, RulesConfig { power_seconds: 0.05, chase_bias: 0.0, ..RulesConfig::default() });
    }

    #[test]
    fn wrong_type_is_an_error() {
        assert!(GameConfig::from_toml_str("[speed]\ntick_rate_ms = \"fast\"").is_err());
    }

    #[test]
    fn absolute_level_path_is_kept() {
        let mut cfg = GameConfig::default();
        let abs = std::env::temp_dir().join("maze.txt");
        cfg.general.level_file = abs.to_string_lossy().into_owned();
        assert_eq!(cfg.level_path(), Some(abs));
    }
}
