//! Presentation layer: double-buffered, diff-based terminal renderer.
//!
//! How it works:
//!   1. Compose the next frame into the `front` buffer
//!   2. Compare each cell with `back` (the previous frame)
//!   3. Emit terminal commands only for cells that changed, batched with
//!      `queue!` and flushed once
//!   4. Swap front/back
//!
//! Each maze cell is two terminal columns wide so the maze keeps a roughly
//! square aspect. Mazes taller than the terminal scroll to keep the player
//! in view.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::entity::{Direction, Ghost, GhostName, GhostState, Position};
use crate::domain::tile::Cell;
use crate::sim::world::{Mode, WorldState};

const BASE_BG: Color = Color::Rgb { r: 10, g: 10, b: 18 };
const HUD_BG: Color = Color::Rgb { r: 20, g: 20, b: 60 };
const MSG_BG: Color = Color::Rgb { r: 200, g: 180, b: 50 };
const WALL: Color = Color::Rgb { r: 40, g: 60, b: 220 };
const PELLET: Color = Color::Rgb { r: 250, g: 200, b: 170 };
const PLAYER: Color = Color::Rgb { r: 255, g: 230, b: 0 };
const FRIGHTENED: Color = Color::Rgb { r: 60, g: 60, b: 255 };

/// Frightened ghosts flash white for this long before power runs out.
const FLASH_SECS: f32 = 2.0;

// ── Glyph: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Glyph {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Glyph {
    const BLANK: Glyph = Glyph { ch: ' ', fg: Color::White, bg: BASE_BG };

    /// Never produced by composition; forces a full repaint when it is the
    /// back buffer's content.
    const INVALID: Glyph = Glyph { ch: '\0', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        Glyph { ch, fg, bg }
    }
}

// ── Frame: a 2D grid of Glyphs ──

struct Frame {
    width: usize,
    height: usize,
    cells: Vec<Glyph>,
}

impl Frame {
    fn new(w: usize, h: usize) -> Self {
        Frame { width: w, height: h, cells: vec![Glyph::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            *self = Frame::new(w, h);
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Glyph::BLANK);
    }

    fn invalidate(&mut self) {
        self.cells.fill(Glyph::INVALID);
    }

    fn set(&mut self, x: usize, y: usize, g: Glyph) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = g;
        }
    }

    fn get(&self, x: usize, y: usize) -> Glyph {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Glyph::BLANK
        }
    }

    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            self.set(x + i, y, Glyph::new(ch, fg, bg));
        }
    }

    fn fill_row(&mut self, y: usize, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Glyph::new(' ', Color::White, bg));
        }
    }

    /// One maze cell = two terminal columns.
    fn put_cell(&mut self, col: usize, row: usize, pair: [char; 2], fg: Color, bg: Color) {
        self.set(col, row, Glyph::new(pair[0], fg, bg));
        self.set(col + 1, row, Glyph::new(pair[1], fg, bg));
    }

    #[cfg(test)]
    fn row_text(&self, y: usize) -> String {
        (0..self.width).map(|x| self.get(x, y).ch).collect()
    }
}

// ── Layout ──

const CELL_W: usize = 2;
const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;
/// HUD, gap, message bar, help bar.
const RESERVED_ROWS: usize = MAP_ROW + 3;

/// First maze row to draw so that `focus` stays visible. Small mazes start
/// at row 0; tall ones keep the focus row centred, clamped to the edges.
fn view_top(focus: usize, maze_h: usize, view_h: usize) -> usize {
    if maze_h <= view_h {
        return 0;
    }
    focus.saturating_sub(view_h / 2).min(maze_h - view_h)
}

/// Screen column of maze column 0; narrow mazes are centred.
fn maze_left(frame_w: usize, maze_w: usize) -> usize {
    frame_w.saturating_sub(maze_w * CELL_W) / 2
}

// ── Composition ──

fn compose(f: &mut Frame, w: &WorldState) {
    f.clear();
    let view_h = f.height.saturating_sub(RESERVED_ROWS).max(1).min(w.grid.height());
    let top = view_top(w.player.pos.row.max(0) as usize, w.grid.height(), view_h);
    let left = maze_left(f.width, w.grid.width());

    compose_hud(f, w);
    compose_maze(f, w, top, view_h, left);

    let msg_row = MAP_ROW + view_h + 1;
    if !w.message.is_empty() && w.mode != Mode::GameOver {
        f.fill_row(msg_row, MSG_BG);
        f.put_str(1, msg_row, &w.message, Color::Black, MSG_BG);
    }
    let help = " Arrows/WASD: Move   F1/P: Pause   R/Enter: Restart   Esc/Q: Quit";
    f.put_str(0, msg_row + 1, help, Color::DarkGrey, BASE_BG);

    if w.mode == Mode::GameOver {
        compose_game_over(f, w, view_h);
    } else if w.paused {
        compose_pause(f, view_h);
    }
}

fn compose_hud(f: &mut Frame, w: &WorldState) {
    let hud = w.hud();
    f.fill_row(HUD_ROW, HUD_BG);
    let lives: String = "♥".repeat(hud.lives as usize);
    let mut line = format!(
        " SCORE {:<7} LIVES {:<5} LEVEL {:<3} PELLETS {:<4} {}",
        hud.score,
        lives,
        hud.level,
        hud.pellets_remaining,
        hud.mode.label()
    );
    if let Some(secs) = hud.power_left {
        line.push_str(&format!(" {secs:.1}s"));
    }
    let mode_fg = match hud.mode {
        Mode::Playing => Color::White,
        Mode::Power => Color::Rgb { r: 120, g: 160, b: 255 },
        Mode::GameOver => Color::Rgb { r: 255, g: 80, b: 80 },
    };
    f.put_str(0, HUD_ROW, &line, mode_fg, HUD_BG);
}

fn compose_maze(f: &mut Frame, w: &WorldState, top: usize, view_h: usize, left: usize) {
    for (vy, cells) in w.grid.rows()[top..top + view_h].iter().enumerate() {
        for (gx, &cell) in cells.iter().enumerate() {
            let (pair, fg, bg) = cell_look(cell);
            f.put_cell(left + gx * CELL_W, MAP_ROW + vy, pair, fg, bg);
        }
    }

    let mut draw = |pos: Position, pair: [char; 2], fg: Color| {
        let (gx, gy) = (pos.col as usize, pos.row as usize);
        if gy >= top && gy < top + view_h {
            f.put_cell(left + gx * CELL_W, MAP_ROW + gy - top, pair, fg, BASE_BG);
        }
    };

    // Eaten ghosts under live ones, player on top.
    let power_left = w.hud().power_left;
    for g in w.ghosts.iter().filter(|g| g.is_eaten()) {
        let (pair, fg) = ghost_look(g, power_left, w.tick);
        draw(g.pos, pair, fg);
    }
    for g in w.ghosts.iter().filter(|g| !g.is_eaten()) {
        let (pair, fg) = ghost_look(g, power_left, w.tick);
        draw(g.pos, pair, fg);
    }
    draw(w.player.pos, [player_char(w.player.direction), ' '], PLAYER);
}

fn cell_look(cell: Cell) -> ([char; 2], Color, Color) {
    match cell {
        Cell::Wall => (['█', '█'], WALL, BASE_BG),
        Cell::Pellet => (['·', ' '], PELLET, BASE_BG),
        Cell::PowerPellet => (['●', ' '], PELLET, BASE_BG),
        Cell::Floor | Cell::Empty => ([' ', ' '], Color::White, BASE_BG),
    }
}

fn player_char(dir: Direction) -> char {
    match dir {
        Direction::Left => 'ᗤ',
        Direction::Up => 'ᗢ',
        Direction::Down => 'ᗥ',
        Direction::Right | Direction::None => 'ᗧ',
    }
}

fn ghost_look(g: &Ghost, power_left: Option<f32>, tick: u64) -> ([char; 2], Color) {
    match g.state {
        GhostState::Eaten => (['°', '°'], Color::White),
        GhostState::Frightened => {
            let flashing = power_left.map_or(false, |s| s < FLASH_SECS) && (tick / 8) % 2 == 0;
            (['ᗣ', ' '], if flashing { Color::White } else { FRIGHTENED })
        }
        GhostState::Normal => {
            let fg = match g.name {
                GhostName::Blinky => Color::Rgb { r: 255, g: 0, b: 0 },
                GhostName::Pinky => Color::Rgb { r: 255, g: 184, b: 255 },
                GhostName::Inky => Color::Rgb { r: 0, g: 255, b: 255 },
                GhostName::Clyde => Color::Rgb { r: 255, g: 184, b: 82 },
            };
            (['ᗣ', ' '], fg)
        }
    }
}

fn overlay_box(f: &mut Frame, view_h: usize, lines: &[(&str, Color)]) {
    let box_w = lines.iter().map(|(s, _)| s.chars().count()).max().unwrap_or(0) + 4;
    let box_h = lines.len() + 2;
    let x0 = f.width.saturating_sub(box_w) / 2;
    let y0 = MAP_ROW + view_h.saturating_sub(box_h) / 2;
    let bg = Color::Rgb { r: 30, g: 30, b: 30 };
    for y in y0..y0 + box_h {
        for x in x0..x0 + box_w {
            f.set(x, y, Glyph::new(' ', Color::White, bg));
        }
    }
    for (i, (text, fg)) in lines.iter().enumerate() {
        let pad = (box_w - text.chars().count()) / 2;
        f.put_str(x0 + pad, y0 + 1 + i, text, *fg, bg);
    }
}

fn compose_game_over(f: &mut Frame, w: &WorldState, view_h: usize) {
    let score = format!("Final score: {}", w.player.score);
    let level = format!("Reached level {}", w.level);
    overlay_box(
        f,
        view_h,
        &[
            ("G A M E   O V E R", Color::Rgb { r: 255, g: 60, b: 60 }),
            ("", Color::White),
            (score.as_str(), Color::White),
            (level.as_str(), Color::White),
            ("", Color::White),
            ("R / Enter: play again", Color::Rgb { r: 80, g: 255, b: 80 }),
            ("Esc / Q: quit", Color::DarkGrey),
        ],
    );
}

fn compose_pause(f: &mut Frame, view_h: usize) {
    overlay_box(
        f,
        view_h,
        &[
            ("PAUSED", Color::Rgb { r: 255, g: 220, b: 50 }),
            ("", Color::White),
            ("F1 / P: resume", Color::Rgb { r: 100, g: 200, b: 255 }),
            ("Esc / Q: quit", Color::Rgb { r: 100, g: 200, b: 255 }),
        ],
    );
}

// ── Renderer ──

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: Frame,
    back: Frame,
    term_w: usize,
    term_h: usize,
    last_mode: Option<(Mode, bool)>,
    keyboard_enhanced: bool,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: Frame::new(0, 0),
            back: Frame::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_mode: None,
            keyboard_enhanced: false,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(BASE_BG),
            Clear(ClearType::All)
        )?;
        let (tw, th) = terminal::size()?;
        self.resize(tw as usize, th as usize);

        // Release events make held-key tracking exact where supported.
        if matches!(terminal::supports_keyboard_enhancement(), Ok(true)) {
            execute!(
                self.writer,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
            self.keyboard_enhanced = true;
        }
        Ok(())
    }

    /// True when the terminal reports key Release events.
    pub fn reports_key_release(&self) -> bool {
        self.keyboard_enhanced
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        if self.keyboard_enhanced {
            execute!(self.writer, PopKeyboardEnhancementFlags)?;
            self.keyboard_enhanced = false;
        }
        execute!(self.writer, ResetColor, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }

    fn resize(&mut self, w: usize, h: usize) {
        self.term_w = w;
        self.term_h = h;
        self.front.resize(w, h);
        self.back.resize(w, h);
        self.back.invalidate();
    }

    pub fn render(&mut self, world: &WorldState) -> io::Result<()> {
        let (tw, th) = terminal::size()?;
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.resize(tw as usize, th as usize);
            queue!(self.writer, SetBackgroundColor(BASE_BG), Clear(ClearType::All))?;
        }

        // Overlays come and go: repaint everything on a mode/pause change.
        let mode = (world.mode, world.paused);
        if self.last_mode != Some(mode) {
            self.back.invalidate();
            self.last_mode = Some(mode);
        }

        compose(&mut self.front, world);
        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = BASE_BG;
        let mut cursor_at: Option<(usize, usize)> = None;

        queue!(self.writer, SetForegroundColor(last_fg), SetBackgroundColor(last_bg))?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let g = self.front.get(x, y);
                if g == self.back.get(x, y) {
                    continue;
                }
                if cursor_at != Some((x, y)) {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                }
                if g.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(g.fg))?;
                    last_fg = g.fg;
                }
                if g.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(g.bg))?;
                    last_bg = g.bg;
                }
                queue!(self.writer, Print(g.ch))?;
                cursor_at = Some((x + 1, y));
            }
        }

        self.writer.flush()
    }
}
