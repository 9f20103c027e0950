use tokio::sync::oneshot::{self, error::TryRecvError};
use tracing::{error, info};

use crate::{
    error::GameError,
    geometry::Vector,
    level::Level,
    network::{self, NetError},
    protocol::SessionInfo,
    render::{Key, Keyboard, Surface, TextStyle, Tone},
};

use super::{
    hud::{self, MenuInput, OptionList, HEADING_SIZE, MENU_SIZE},
    Connecting, OnePlayer, Session, State, Transition, TwoPlayers,
};

pub const MAX_NAME_LENGTH: usize = 10;

const MENU_TOP: f64 = 260.0;

pub struct MainMenu {
    options: OptionList,
}

impl MainMenu {
    pub fn new() -> Self {
        Self {
            options: OptionList::new(["Local Mode", "Multiplayer", "Spectate", "Exit"]),
        }
    }
}

impl Default for MainMenu {
    fn default() -> Self {
        Self::new()
    }
}

impl State for MainMenu {
    fn update(&mut self, session: &mut Session, keys: &dyn Keyboard) -> Result<Transition, GameError> {
        let transition = match self.options.update(keys) {
            MenuInput::Select(0) => Transition::Switch(Box::new(LocalMenu::new())),
            MenuInput::Select(1) => Transition::Switch(Box::new(NameInput::new())),
            MenuInput::Select(2) => Transition::Switch(Box::new(SpectateSessions::new(session))),
            MenuInput::Select(_) | MenuInput::Back => Transition::Quit,
            MenuInput::Idle => Transition::Stay,
        };
        Ok(transition)
    }

    fn draw(&self, _session: &Session, surface: &mut dyn Surface) {
        hud::draw_title(surface);
        self.options.draw(surface, MENU_TOP);
    }

    fn name(&self) -> &'static str {
        "main_menu"
    }
}

pub struct LocalMenu {
    options: OptionList,
}

impl LocalMenu {
    pub fn new() -> Self {
        Self {
            options: OptionList::new(["One Player", "Two Players", "Back"]),
        }
    }
}

impl Default for LocalMenu {
    fn default() -> Self {
        Self::new()
    }
}

impl State for LocalMenu {
    fn update(&mut self, _session: &mut Session, keys: &dyn Keyboard) -> Result<Transition, GameError> {
        let transition = match self.options.update(keys) {
            MenuInput::Select(0) => Transition::Switch(Box::new(LevelSelect::new(Purpose::OnePlayer))),
            MenuInput::Select(1) => Transition::Switch(Box::new(ControlsScreen)),
            MenuInput::Select(_) | MenuInput::Back => Transition::Switch(Box::new(MainMenu::new())),
            MenuInput::Idle => Transition::Stay,
        };
        Ok(transition)
    }

    fn draw(&self, _session: &Session, surface: &mut dyn Surface) {
        hud::draw_title(surface);
        self.options.draw(surface, MENU_TOP);
    }

    fn name(&self) -> &'static str {
        "local_menu"
    }
}

/// Key bindings for a two-player match.
pub struct ControlsScreen;

impl State for ControlsScreen {
    fn update(&mut self, _session: &mut Session, keys: &dyn Keyboard) -> Result<Transition, GameError> {
        if keys.just_pressed(Key::Enter) {
            return Ok(Transition::Switch(Box::new(LevelSelect::new(Purpose::TwoPlayers))));
        }
        if keys.just_pressed(Key::Escape) {
            return Ok(Transition::Switch(Box::new(LocalMenu::new())));
        }
        Ok(Transition::Stay)
    }

    fn draw(&self, _session: &Session, surface: &mut dyn Surface) {
        let text = TextStyle::new(MENU_SIZE, Tone::Text);
        let highlight = TextStyle::new(MENU_SIZE, Tone::Highlight);

        surface.draw_centered("Controls", 140.0, TextStyle::new(HEADING_SIZE, Tone::Text));

        let columns = [
            (160.0, "Player 1", "Up: [Q]", "Down: [A]"),
            (480.0, "Player 2", "Up: [Up Arrow]", "Down: [Down Arrow]"),
        ];
        for (center, player, up, down) in columns {
            for (line, style, y) in [(player, highlight, 220.0), (up, text, 260.0), (down, text, 290.0)] {
                let (width, _) = surface.measure(line, MENU_SIZE);
                surface.draw_text(line, Vector::new(center - width / 2.0, y), style);
            }
        }

        let hint = TextStyle::new(hud::SMALL_SIZE, Tone::Dim);
        surface.draw_centered("Press Enter to continue", 400.0, hint);
        surface.draw_centered("Press Esc to go back", 425.0, hint);
    }

    fn name(&self) -> &'static str {
        "controls"
    }
}

/// What starts once a level is picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Purpose {
    OnePlayer,
    TwoPlayers,
    Multiplayer,
}

pub struct LevelSelect {
    purpose: Purpose,
    options: OptionList,
}

impl LevelSelect {
    pub fn new(purpose: Purpose) -> Self {
        let mut options: Vec<&str> = Level::ALL.iter().map(|level| level.name()).collect();
        options.push("Back");
        Self {
            purpose,
            options: OptionList::new(options),
        }
    }

    fn back(&self) -> Transition {
        match self.purpose {
            Purpose::OnePlayer | Purpose::TwoPlayers => Transition::Switch(Box::new(LocalMenu::new())),
            Purpose::Multiplayer => Transition::MainMenu,
        }
    }
}

impl State for LevelSelect {
    fn update(&mut self, session: &mut Session, keys: &dyn Keyboard) -> Result<Transition, GameError> {
        let level = match self.options.update(keys) {
            MenuInput::Idle => return Ok(Transition::Stay),
            MenuInput::Back => return Ok(self.back()),
            MenuInput::Select(i) => match Level::ALL.get(i) {
                Some(level) => *level,
                None => return Ok(self.back()),
            },
        };

        session.level = level;
        info!(%level, purpose = ?self.purpose, "level selected");

        let next: Box<dyn State> = match self.purpose {
            Purpose::OnePlayer => Box::new(OnePlayer::new(session)),
            Purpose::TwoPlayers => Box::new(TwoPlayers::new(session)),
            Purpose::Multiplayer => Box::new(Connecting::multiplayer(session)),
        };
        Ok(Transition::Switch(next))
    }

    fn draw(&self, _session: &Session, surface: &mut dyn Surface) {
        hud::draw_title(surface);
        surface.draw_centered("Select level", 200.0, TextStyle::new(MENU_SIZE, Tone::Dim));
        self.options.draw(surface, MENU_TOP - 20.0);
    }

    fn name(&self) -> &'static str {
        "level_select"
    }
}

/// Whether `c` may be appended to `name`: letters, `-` and `.`, no leading
/// or doubled separators, at most `MAX_NAME_LENGTH` characters.
pub fn accepts_name_char(name: &str, c: char) -> bool {
    let separator = |c: char| c == '-' || c == '.';

    if !(c.is_ascii_alphabetic() || separator(c)) {
        return false;
    }

    if name.chars().count() >= MAX_NAME_LENGTH {
        return false;
    }

    match name.chars().last() {
        None => !separator(c),
        Some(last) => !(separator(last) && separator(c)),
    }
}

pub struct NameInput {
    name: String,
}

impl NameInput {
    pub fn new() -> Self {
        Self {
            name: String::new(),
        }
    }

    pub fn entered(&self) -> &str {
        &self.name
    }
}

impl Default for NameInput {
    fn default() -> Self {
        Self::new()
    }
}

impl State for NameInput {
    fn update(&mut self, session: &mut Session, keys: &dyn Keyboard) -> Result<Transition, GameError> {
        if keys.just_pressed(Key::Escape) {
            return Ok(Transition::MainMenu);
        }

        for &c in keys.typed() {
            if accepts_name_char(&self.name, c) {
                self.name.push(c);
            }
        }

        if keys.just_pressed(Key::Backspace) {
            self.name.pop();
        }

        if keys.just_pressed(Key::Enter) {
            let name = self.name.trim_end_matches(['-', '.']);
            if !name.is_empty() {
                session.player_name = name.to_string();
                return Ok(Transition::Switch(Box::new(LevelSelect::new(Purpose::Multiplayer))));
            }
        }

        Ok(Transition::Stay)
    }

    fn draw(&self, _session: &Session, surface: &mut dyn Surface) {
        let style = TextStyle::new(MENU_SIZE, Tone::Text);
        surface.draw_centered("Enter your name:", 250.0, style);

        let shown = if self.name.chars().count() < MAX_NAME_LENGTH {
            format!("{}_", self.name)
        } else {
            self.name.clone()
        };
        surface.draw_centered(&shown, 280.0, TextStyle::new(MENU_SIZE, Tone::Highlight));
    }

    fn name(&self) -> &'static str {
        "name_input"
    }
}

enum Listing {
    Fetching(oneshot::Receiver<Result<Vec<SessionInfo>, NetError>>),
    Loaded(Vec<SessionInfo>),
    Failed,
}

/// Lists running matches from `GET /sessions` and spectates the chosen one.
pub struct SpectateSessions {
    listing: Listing,
    options: OptionList,
}

impl SpectateSessions {
    pub fn new(session: &Session) -> Self {
        let config = session.config().clone();
        let (tx, rx) = oneshot::channel();
        session.runtime().spawn(async move {
            let _ = tx.send(network::fetch_sessions(&config).await);
        });

        Self {
            listing: Listing::Fetching(rx),
            options: OptionList::new(Vec::<String>::new()),
        }
    }

    /// Builds the screen from an already fetched result.
    pub fn with_result(result: Result<Vec<SessionInfo>, NetError>) -> Self {
        let mut screen = Self {
            listing: Listing::Failed,
            options: OptionList::new(Vec::<String>::new()),
        };
        screen.settle(result);
        screen
    }

    pub fn status(&self) -> Option<&'static str> {
        match &self.listing {
            Listing::Fetching(_) => Some("Fetching sessions..."),
            Listing::Loaded(sessions) if sessions.is_empty() => Some("No active sessions"),
            Listing::Loaded(_) => None,
            Listing::Failed => Some("Failed to fetch sessions"),
        }
    }

    fn settle(&mut self, result: Result<Vec<SessionInfo>, NetError>) {
        match result {
            Ok(sessions) => {
                info!(count = sessions.len(), "fetched sessions");
                self.options = OptionList::new(
                    sessions
                        .iter()
                        .map(|s| format!("{} X {}", s.player1, s.player2)),
                );
                self.listing = Listing::Loaded(sessions);
            }
            Err(e) => {
                error!(error = %e, "failed to fetch sessions");
                self.listing = Listing::Failed;
            }
        }
    }

    fn poll(&mut self) {
        let Listing::Fetching(rx) = &mut self.listing else {
            return;
        };

        match rx.try_recv() {
            Ok(result) => self.settle(result),
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Closed) => {
                error!("session fetch task stopped without an answer");
                self.listing = Listing::Failed;
            }
        }
    }
}

impl State for SpectateSessions {
    fn update(&mut self, session: &mut Session, keys: &dyn Keyboard) -> Result<Transition, GameError> {
        self.poll();

        match self.options.update(keys) {
            MenuInput::Back => Ok(Transition::MainMenu),
            MenuInput::Select(i) => {
                let Listing::Loaded(sessions) = &self.listing else {
                    return Ok(Transition::Stay);
                };
                let Some(chosen) = sessions.get(i) else {
                    return Ok(Transition::Stay);
                };

                info!(session_id = %chosen.id, "spectating session");
                session.spectate_id = Some(chosen.id.clone());
                Ok(Transition::Switch(Box::new(Connecting::spectator(session, chosen.id.clone()))))
            }
            MenuInput::Idle => Ok(Transition::Stay),
        }
    }

    fn draw(&self, _session: &Session, surface: &mut dyn Surface) {
        surface.draw_centered("Active Sessions", 100.0, TextStyle::new(HEADING_SIZE, Tone::Text));

        match self.status() {
            Some(status) => surface.draw_centered(status, 220.0, TextStyle::new(MENU_SIZE, Tone::Dim)),
            None => self.options.draw(surface, 180.0),
        }

        surface.draw_centered(
            "Press Esc to go back",
            425.0,
            TextStyle::new(hud::SMALL_SIZE, Tone::Dim),
        );
    }

    fn name(&self) -> &'static str {
        "spectate_sessions"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_rules() {
        assert!(accepts_name_char("", 'a'));
        assert!(accepts_name_char("", 'Z'));
        assert!(!accepts_name_char("", '-'));
        assert!(!accepts_name_char("", '.'));
        assert!(accepts_name_char("ada", '.'));
        assert!(!accepts_name_char("ada.", '-'));
        assert!(accepts_name_char("ada.", 'b'));
        assert!(!accepts_name_char("ada", '1'));
        assert!(!accepts_name_char("ada", ' '));
        assert!(!accepts_name_char("ada", 'é'));
        assert!(!accepts_name_char("abcdefghij", 'k'));
        assert!(accepts_name_char("abcdefghi", 'j'));
    }

    #[test]
    fn listing_status_texts() {
        let failed = SpectateSessions::with_result(Err(NetError::HttpStatus(500)));
        assert_eq!(failed.status(), Some("Failed to fetch sessions"));

        let empty = SpectateSessions::with_result(Ok(vec![]));
        assert_eq!(empty.status(), Some("No active sessions"));

        let loaded = SpectateSessions::with_result(Ok(vec![SessionInfo {
            id: "s1".to_string(),
            player1: "ada".to_string(),
            player2: "grace".to_string(),
        }]));
        assert_eq!(loaded.status(), None);
        assert_eq!(loaded.options.len(), 1);
    }
}
