use crate::{
    ball::Ball,
    error::GameError,
    render::{Key, Keyboard, Surface, TextStyle, Tone},
};

use super::{hud::MENU_SIZE, Session, State, Transition};

/// Winner banner over the frozen final frame of the match.
pub struct WinnerState {
    winner: String,
    finished: Box<dyn State>,
}

impl WinnerState {
    pub fn new(winner: String, finished: Box<dyn State>) -> Self {
        Self { winner, finished }
    }

    pub fn winner(&self) -> &str {
        &self.winner
    }
}

impl State for WinnerState {
    fn update(&mut self, _session: &mut Session, keys: &dyn Keyboard) -> Result<Transition, GameError> {
        if keys.just_pressed(Key::Enter) || keys.just_pressed(Key::Escape) {
            return Ok(Transition::MainMenu);
        }
        Ok(Transition::Stay)
    }

    fn draw(&self, session: &Session, surface: &mut dyn Surface) {
        self.finished.draw(session, surface);

        surface.draw_centered(
            &format!("{} WON", self.winner),
            200.0,
            TextStyle::new(40.0, Tone::Highlight),
        );
        surface.draw_centered(
            "Press Enter to play again",
            300.0,
            TextStyle::new(MENU_SIZE, Tone::Text),
        );
    }

    fn ball(&self) -> Option<&Ball> {
        self.finished.ball()
    }

    fn name(&self) -> &'static str {
        "winner"
    }
}
