//! Collaborator seams between the game and whatever draws it and reads keys.
//!
//! The game only ever talks in logical field units (see `config::SCREEN_WIDTH`
//! and `config::SCREEN_HEIGHT`); a surface is free to scale.

use crate::geometry::{Rect, Vector};

/// Semantic colour slot. The renderer maps it through the active theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tone {
    Field,
    Paddle,
    Ball,
    Text,
    Highlight,
    Dim,
    Overlay,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub size: f64,
    pub tone: Tone,
}

impl TextStyle {
    pub const fn new(size: f64, tone: Tone) -> Self {
        Self { size, tone }
    }
}

/// Something that accepts filled rectangles and text at a position.
pub trait Surface {
    fn fill_rect(&mut self, rect: Rect, tone: Tone);

    /// `at` is the top-left corner of the text box.
    fn draw_text(&mut self, text: &str, at: Vector, style: TextStyle);

    /// Width and height the text would occupy, in logical units.
    fn measure(&self, text: &str, size: f64) -> (f64, f64);

    /// Draws `text` horizontally centred on the field at height `y`.
    fn draw_centered(&mut self, text: &str, y: f64, style: TextStyle) {
        let (width, _) = self.measure(text, style.size);
        let x = (crate::config::SCREEN_WIDTH - width) / 2.0;
        self.draw_text(text, Vector::new(x, y), style);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Up,
    Down,
    Enter,
    Escape,
    Tab,
    Backspace,
    /// Printable keys, always lowercase.
    Char(char),
}

/// Snapshot of the keyboard for the current frame.
pub trait Keyboard {
    /// Key is currently held down.
    fn is_pressed(&self, key: Key) -> bool;

    /// Key went down during this frame.
    fn just_pressed(&self, key: Key) -> bool;

    /// Characters typed during this frame, in order, with original case.
    fn typed(&self) -> &[char];
}
