//! Keyboard input tracker.
//!
//! Tracks which keys are currently held so the player keeps steering while
//! a key is down, and which were freshly pressed this frame for one-shot
//! actions (pause, restart, quit).
//!
//! Terminals that report Release events get exact hold tracking; the rest
//! fall back to a timeout after the last Press/Repeat.

use std::collections::HashMap;
use std::io;
use std::time::{Duration, Instant};

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::domain::entity::Direction;

/// After this long without a Press/Repeat event a key counts as released.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

// ── Key Constants ──

pub const KEYS_LEFT: &[KeyCode] = &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
pub const KEYS_RIGHT: &[KeyCode] = &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
pub const KEYS_UP: &[KeyCode] = &[KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')];
pub const KEYS_DOWN: &[KeyCode] = &[KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('S')];
pub const KEYS_RESTART: &[KeyCode] = &[KeyCode::Char('r'), KeyCode::Char('R'), KeyCode::Enter];
pub const KEYS_PAUSE: &[KeyCode] = &[KeyCode::F(1), KeyCode::Char('p'), KeyCode::Char('P')];
pub const KEYS_QUIT: &[KeyCode] = &[KeyCode::Esc, KeyCode::Char('q'), KeyCode::Char('Q')];

const DIRECTION_KEYS: [(Direction, &[KeyCode]); 4] = [
    (Direction::Up, KEYS_UP),
    (Direction::Down, KEYS_DOWN),
    (Direction::Left, KEYS_LEFT),
    (Direction::Right, KEYS_RIGHT),
];

pub struct InputState {
    /// Timestamp of the last Press/Repeat per key.
    last_active: HashMap<KeyCode, Instant>,
    /// Keys that went from released to held during the last drain.
    fresh_presses: Vec<KeyCode>,
    /// Raw key events from the last drain, for Ctrl+C detection.
    raw_events: Vec<KeyEvent>,
    /// Only true once keyboard enhancement is confirmed.
    pub honor_release: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            fresh_presses: Vec::with_capacity(8),
            raw_events: Vec::with_capacity(8),
            honor_release: false,
        }
    }

    /// Drain all pending terminal events without blocking. Call once per
    /// frame before the simulation tick.
    pub fn drain_events(&mut self) -> io::Result<()> {
        self.fresh_presses.clear();
        self.raw_events.clear();

        while poll(Duration::ZERO)? {
            if let Event::Key(key) = event::read()? {
                self.record(key, Instant::now());
            }
        }

        let now = Instant::now();
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
        Ok(())
    }

    fn record(&mut self, key: KeyEvent, at: Instant) {
        self.raw_events.push(key);
        match key.kind {
            KeyEventKind::Release if self.honor_release => {
                self.last_active.remove(&key.code);
            }
            KeyEventKind::Release => {}
            _ => {
                if !self.is_held_at(key.code, at) {
                    self.fresh_presses.push(key.code);
                }
                self.last_active.insert(key.code, at);
            }
        }
    }

    /// Edge trigger: pressed during the last drain.
    pub fn was_pressed(&self, code: KeyCode) -> bool {
        self.fresh_presses.contains(&code)
    }

    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.was_pressed(*c))
    }

    pub fn ctrl_c_pressed(&self) -> bool {
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && matches!(k.code, KeyCode::Char('c') | KeyCode::Char('C'))
        })
    }

    /// Steering intent from held arrow/WASD keys. When several are held the
    /// most recently pressed one wins, so a quick tap around a corner turns.
    pub fn direction(&self) -> Direction {
        let now = Instant::now();
        DIRECTION_KEYS
            .iter()
            .filter_map(|&(dir, keys)| {
                keys.iter()
                    .filter(|k| self.is_held_at(**k, now) || self.was_pressed(**k))
                    .filter_map(|k| self.last_active.get(k))
                    .max()
                    .map(|t| (*t, dir))
            })
            .max_by_key(|&(t, _)| t)
            .map_or(Direction::None, |(_, dir)| dir)
    }

    // ── Internal ──

    fn is_held_at(&self, code: KeyCode, now: Instant) -> bool {
        self.last_active
            .get(&code)
            .map_or(false, |t| now.saturating_duration_since(*t) < HOLD_TIMEOUT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn held(kb: &InputState, code: KeyCode) -> bool {
        kb.is_held_at(code, Instant::now())
    }

    #[test]
    fn fresh_press_then_held() {
        let mut kb = InputState::new();
        let t = Instant::now();
        kb.record(press(KeyCode::Left), t);
        assert!(kb.was_pressed(KeyCode::Left));
        assert!(held(&kb, KeyCode::Left));

        // A repeat while held is not a fresh press.
        kb.fresh_presses.clear();
        kb.record(press(KeyCode::Left), t);
        assert!(!kb.was_pressed(KeyCode::Left));
    }

    #[test]
    fn newest_direction_wins() {
        let mut kb = InputState::new();
        let t = Instant::now();
        kb.record(press(KeyCode::Left), t);
        kb.record(press(KeyCode::Char('w')), t + Duration::from_millis(10));
        assert_eq!(kb.direction(), Direction::Up);
    }

    #[test]
    fn no_keys_no_direction() {
        assert_eq!(InputState::new().direction(), Direction::None);
    }

    #[test]
    fn release_honoured_only_when_enabled() {
        let mut kb = InputState::new();
        let t = Instant::now();
        kb.record(press(KeyCode::Right), t);
        let mut release = press(KeyCode::Right);
        release.kind = KeyEventKind::Release;

        kb.record(release, t);
        assert!(held(&kb, KeyCode::Right));

        kb.honor_release = true;
        kb.record(release, t);
        assert!(!held(&kb, KeyCode::Right));
    }

    #[test]
    fn ctrl_c_detected() {
        let mut kb = InputState::new();
        kb.record(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL), Instant::now());
        assert!(kb.ctrl_c_pressed());
    }
}
