use std::{
    collections::{HashMap, HashSet},
    io,
    time::{Duration, Instant},
};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::Rect as CellRect,
    style::{Style, Stylize},
    text::Line,
    widgets::Widget,
};
use tui_big_text::{BigText, PixelSize};

use pong_multiplayer::{
    config::{SCREEN_HEIGHT, SCREEN_WIDTH},
    game_theme::GameTheme,
    geometry::{Rect, Vector},
    render::{Key, Keyboard, Surface, TextStyle, Tone},
};

/// Text at or above this size is drawn with block glyphs.
const BIG_TEXT_SIZE: f64 = 40.0;
const BOLD_TEXT_SIZE: f64 = 24.0;

/// A quadrant glyph is 4 columns by 4 rows.
const BIG_GLYPH_COLS: u16 = 4;
const BIG_GLYPH_ROWS: u16 = 4;

/// Without release events a key counts as held this long after its first
/// press, then this long after each auto-repeat.
const FIRST_HOLD: Duration = Duration::from_millis(250);
const REPEAT_HOLD: Duration = Duration::from_millis(120);

/// Biggest area inside `outer` that keeps the field's aspect ratio. Cells are
/// about twice as tall as wide.
pub fn fit_field(outer: CellRect) -> CellRect {
    let ratio = SCREEN_WIDTH / SCREEN_HEIGHT * 2.0;
    let width = (outer.width as f64).min(outer.height as f64 * ratio);
    let height = (width / ratio).min(outer.height as f64);

    let width = width.floor() as u16;
    let height = height.floor() as u16;
    CellRect::new(
        outer.x + (outer.width - width) / 2,
        outer.y + (outer.height - height) / 2,
        width,
        height,
    )
}

/// Rect of `width` x `height` cells centred in a `cols` x `rows` screen,
/// shrunk to fit.
pub fn centered_rect(width: u16, height: u16, cols: u16, rows: u16) -> CellRect {
    let width = width.min(cols);
    let height = height.min(rows);
    CellRect::new((cols - width) / 2, (rows - height) / 2, width, height)
}

/// Draws the logical 640x480 field onto a block of terminal cells.
pub struct TerminalSurface<'a> {
    buf: &'a mut Buffer,
    area: CellRect,
    theme: GameTheme,
}

impl<'a> TerminalSurface<'a> {
    pub fn new(buf: &'a mut Buffer, area: CellRect, theme: GameTheme) -> Self {
        Self { buf, area, theme }
    }

    fn cols(&self) -> f64 {
        self.area.width.max(1) as f64
    }

    fn rows(&self) -> f64 {
        self.area.height.max(1) as f64
    }

    /// Field x to a column offset, rounding `ceil` up or down.
    fn col(&self, x: f64, ceil: bool) -> i32 {
        let col = x * self.cols() / SCREEN_WIDTH;
        (if ceil { col.ceil() } else { col.floor() }) as i32
    }

    fn row(&self, y: f64, ceil: bool) -> i32 {
        let row = y * self.rows() / SCREEN_HEIGHT;
        (if ceil { row.ceil() } else { row.floor() }) as i32
    }

    /// Cell rect for a span of field-relative cells, clipped to the area.
    fn clip(&self, col: i32, row: i32, cols: i32, rows: i32) -> Option<CellRect> {
        let left = col.max(0);
        let top = row.max(0);
        let right = (col + cols).min(self.area.width as i32);
        let bottom = (row + rows).min(self.area.height as i32);
        if left >= right || top >= bottom {
            return None;
        }

        Some(CellRect::new(
            self.area.x + left as u16,
            self.area.y + top as u16,
            (right - left) as u16,
            (bottom - top) as u16,
        ))
    }
}

impl Surface for TerminalSurface<'_> {
    fn fill_rect(&mut self, rect: Rect, tone: Tone) {
        let col = self.col(rect.x, false);
        let row = self.row(rect.y, false);
        // anything visible covers at least one cell
        let cols = (self.col(rect.max_x(), true) - col).max(1);
        let rows = (self.row(rect.max_y(), true) - row).max(1);

        let Some(cells) = self.clip(col, row, cols, rows) else {
            return;
        };

        let color = self.theme.color(tone);
        for y in cells.top()..cells.bottom() {
            for x in cells.left()..cells.right() {
                if let Some(cell) = self.buf.cell_mut((x, y)) {
                    cell.set_char(' ').set_bg(color);
                }
            }
        }
    }

    fn draw_text(&mut self, text: &str, at: Vector, style: TextStyle) {
        let color = self.theme.color(style.tone);
        let col = self.col(at.x, false);
        let row = self.row(at.y, false);
        let chars = text.chars().count() as i32;

        if style.size >= BIG_TEXT_SIZE {
            let cols = chars * BIG_GLYPH_COLS as i32;
            let Some(cells) = self.clip(col, row, cols, BIG_GLYPH_ROWS as i32) else {
                return;
            };
            BigText::builder()
                .pixel_size(PixelSize::Quadrant)
                .style(Style::new().fg(color))
                .lines(vec![Line::from(text.to_string())])
                .build()
                .render(cells, self.buf);
            return;
        }

        let Some(cells) = self.clip(col, row, chars, 1) else {
            return;
        };
        let mut text_style = Style::new().fg(color);
        if style.size >= BOLD_TEXT_SIZE {
            text_style = text_style.bold();
        }

        // clipped on the left: skip the characters that fall outside
        let skip = (cells.x as i32 - (self.area.x as i32 + col)).max(0) as usize;
        let visible: String = text.chars().skip(skip).collect();
        self.buf.set_stringn(
            cells.x,
            cells.y,
            visible,
            cells.width as usize,
            text_style,
        );
    }

    fn measure(&self, text: &str, size: f64) -> (f64, f64) {
        let chars = text.chars().count() as f64;
        let (cols, rows) = if size >= BIG_TEXT_SIZE {
            (chars * BIG_GLYPH_COLS as f64, BIG_GLYPH_ROWS as f64)
        } else {
            (chars, 1.0)
        };
        (
            cols * SCREEN_WIDTH / self.cols(),
            rows * SCREEN_HEIGHT / self.rows(),
        )
    }
}

#[derive(Debug, Clone, Copy)]
struct Hold {
    last: Instant,
    repeating: bool,
}

/// Crossterm-backed keyboard snapshot, refreshed once per frame.
///
/// Terminals only report key releases when the keyboard enhancement protocol
/// is on. Without it, holding is inferred from auto-repeat.
pub struct TerminalKeyboard {
    releases: bool,
    held: HashMap<Key, Hold>,
    pressed: HashSet<Key>,
    typed: Vec<char>,
}

impl TerminalKeyboard {
    pub fn new(releases: bool) -> Self {
        Self {
            releases,
            held: HashMap::new(),
            pressed: HashSet::new(),
            typed: Vec::new(),
        }
    }

    /// Drains pending terminal events without blocking.
    pub fn poll(&mut self) -> io::Result<()> {
        self.begin_frame();
        while event::poll(Duration::ZERO)? {
            if let Event::Key(key_event) = event::read()? {
                self.record(key_event, Instant::now());
            }
        }
        self.expire(Instant::now());
        Ok(())
    }

    fn begin_frame(&mut self) {
        self.pressed.clear();
        self.typed.clear();
    }

    fn record(&mut self, key_event: KeyEvent, now: Instant) {
        let Some(key) = map_key(&key_event) else {
            return;
        };

        match key_event.kind {
            KeyEventKind::Release => {
                self.held.remove(&key);
            }
            KeyEventKind::Press | KeyEventKind::Repeat => {
                let repeat = key_event.kind == KeyEventKind::Repeat || self.held.contains_key(&key);
                if !repeat {
                    self.pressed.insert(key);
                }
                self.held.insert(
                    key,
                    Hold {
                        last: now,
                        repeating: repeat,
                    },
                );

                if let KeyCode::Char(c) = key_event.code {
                    self.typed.push(c);
                }
            }
        }
    }

    fn expire(&mut self, now: Instant) {
        if self.releases {
            return;
        }
        self.held.retain(|_, hold| {
            let window = if hold.repeating { REPEAT_HOLD } else { FIRST_HOLD };
            now.duration_since(hold.last) < window
        });
    }
}

impl Keyboard for TerminalKeyboard {
    fn is_pressed(&self, key: Key) -> bool {
        self.held.contains_key(&key)
    }

    fn just_pressed(&self, key: Key) -> bool {
        self.pressed.contains(&key)
    }

    fn typed(&self) -> &[char] {
        &self.typed
    }
}

/// Ctrl+C leaves like Escape; other control chords are ignored.
fn map_key(key_event: &KeyEvent) -> Option<Key> {
    let control = key_event.modifiers.contains(KeyModifiers::CONTROL);
    match key_event.code {
        KeyCode::Char('c') if control => Some(Key::Escape),
        KeyCode::Char(_) if control => None,
        KeyCode::Char(c) => Some(Key::Char(c.to_ascii_lowercase())),
        KeyCode::Up => Some(Key::Up),
        KeyCode::Down => Some(Key::Down),
        KeyCode::Enter => Some(Key::Enter),
        KeyCode::Esc => Some(Key::Escape),
        KeyCode::Tab => Some(Key::Tab),
        KeyCode::Backspace => Some(Key::Backspace),
        _ => None,
    }
}
