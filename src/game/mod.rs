//! Screen state machine.
//!
//! Every screen is a [`State`]. A frame calls `update` with the keyboard
//! snapshot and then `draw`; `update` answers with a [`Transition`] that the
//! [`Game`] applies. Data that outlives a single screen (player name, level,
//! the live connection) lives in the [`Session`].

mod hud;
mod menu;
mod online;
mod playing;
mod winner;

use std::mem;

use tokio::{runtime::Handle, sync::mpsc::error::TryRecvError};
use tracing::{debug, info};

use crate::{
    ball::Ball,
    config::Config,
    error::GameError,
    level::Level,
    network::{Link, NetError, NetworkEvent},
    protocol::PlayerInput,
    render::{Key, Keyboard, Surface},
};

pub use hud::{metric_line, network_line, MenuInput, OptionList, PauseChoice, PauseMenu};
pub use menu::{accepts_name_char, ControlsScreen, LevelSelect, LocalMenu, MainMenu, NameInput, Purpose, SpectateSessions};
pub use online::{Connecting, MirrorBoard, Multiplayer, Spectator};
pub use playing::{LocalMatch, OnePlayer, TwoPlayers};
pub use winner::WinnerState;

/// What the active screen wants after a frame.
pub enum Transition {
    Stay,
    Switch(Box<dyn State>),
    /// A match finished. The finished screen stays visible behind the
    /// winner banner.
    Ended { winner: String },
    /// Hard reset: closes any connection and clears the session.
    MainMenu,
    Quit,
}

pub trait State {
    fn update(&mut self, session: &mut Session, keys: &dyn Keyboard)
        -> Result<Transition, GameError>;

    fn draw(&self, session: &Session, surface: &mut dyn Surface);

    /// Ball shown by the metric overlay, if the screen has one.
    fn ball(&self) -> Option<&Ball> {
        None
    }

    /// Only local matches can be paused.
    fn can_pause(&self) -> bool {
        false
    }

    fn name(&self) -> &'static str;
}

/// Outcome of polling the link's event channel once.
#[derive(Debug)]
pub enum LinkPoll {
    Event(NetworkEvent),
    Idle,
    /// No link, or the receive task is gone.
    Lost,
}

/// Data shared by the screens of one match attempt, from leaving the main
/// menu to coming back to it.
pub struct Session {
    config: Config,
    runtime: Handle,
    pub player_name: String,
    pub level: Level,
    pub spectate_id: Option<String>,
    pub fps: f64,
    pub show_metrics: bool,
    link: Option<Link>,
}

impl Session {
    pub fn new(config: Config, runtime: Handle) -> Self {
        Self {
            config,
            runtime,
            player_name: String::new(),
            level: Level::default(),
            spectate_id: None,
            fps: 0.0,
            show_metrics: false,
            link: None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn runtime(&self) -> &Handle {
        &self.runtime
    }

    pub fn attach(&mut self, link: Link) {
        self.close_link();
        self.link = Some(link);
    }

    pub fn has_link(&self) -> bool {
        self.link.is_some()
    }

    /// Next event in arrival order, without waiting.
    pub fn poll_link(&mut self) -> LinkPoll {
        let Some(link) = self.link.as_mut() else {
            return LinkPoll::Lost;
        };

        match link.events.try_recv() {
            Ok(event) => LinkPoll::Event(event),
            Err(TryRecvError::Empty) => LinkPoll::Idle,
            Err(TryRecvError::Disconnected) => LinkPoll::Lost,
        }
    }

    /// Sends on the calling thread, bounded by the write timeout. A slow
    /// server stalls the frame for at most that long.
    pub fn send_input(&mut self, input: PlayerInput) -> Result<(), NetError> {
        let Some(link) = self.link.as_mut() else {
            return Err(NetError::NotConnected);
        };

        self.runtime.block_on(link.client.send_player_input(input))
    }

    pub fn close_link(&mut self) {
        if let Some(mut link) = self.link.take() {
            debug!("closing game server connection");
            self.runtime.block_on(link.client.close());
        }
    }

    /// Back to a fresh session. Keeps configuration and display toggles.
    pub fn reset(&mut self) {
        self.close_link();
        self.player_name.clear();
        self.level = Level::default();
        self.spectate_id = None;
    }
}

/// Owns the active screen and applies transitions.
pub struct Game {
    session: Session,
    state: Box<dyn State>,
    pause: Option<PauseMenu>,
    running: bool,
}

impl Game {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            state: Box::new(MainMenu::new()),
            pause: None,
            running: true,
        }
    }

    pub fn update(&mut self, keys: &dyn Keyboard) -> Result<(), GameError> {
        if keys.just_pressed(Key::Tab) {
            self.session.show_metrics = !self.session.show_metrics;
        }

        if let Some(pause) = self.pause.as_mut() {
            match pause.update(keys) {
                PauseChoice::Stay => {}
                PauseChoice::Resume => {
                    debug!("resuming match");
                    self.pause = None;
                }
                PauseChoice::Exit => self.apply(Transition::MainMenu),
            }
            return Ok(());
        }

        if self.state.can_pause() && keys.just_pressed(Key::Escape) {
            debug!(state = self.state.name(), "pausing match");
            self.pause = Some(PauseMenu::default());
            return Ok(());
        }

        let transition = self.state.update(&mut self.session, keys)?;
        self.apply(transition);
        Ok(())
    }

    pub fn draw(&self, surface: &mut dyn Surface) {
        self.state.draw(&self.session, surface);

        if self.session.show_metrics {
            if let Some(ball) = self.state.ball() {
                hud::draw_metric(surface, self.session.fps, ball, self.session.level);
            }
        }

        if let Some(pause) = &self.pause {
            pause.draw(surface);
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_paused(&self) -> bool {
        self.pause.is_some()
    }

    pub fn state_name(&self) -> &'static str {
        self.state.name()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn set_fps(&mut self, fps: f64) {
        self.session.fps = fps;
    }

    /// Releases the connection, if any. Call before exiting.
    pub fn shutdown(&mut self) {
        self.session.close_link();
    }

    fn apply(&mut self, transition: Transition) {
        match transition {
            Transition::Stay => {}
            Transition::Switch(next) => {
                info!(from = self.state.name(), to = next.name(), "state change");
                self.state = next;
            }
            Transition::Ended { winner } => {
                info!(from = self.state.name(), %winner, "match ended");
                self.session.close_link();
                let finished = mem::replace(&mut self.state, Box::new(MainMenu::new()));
                self.state = Box::new(WinnerState::new(winner, finished));
            }
            Transition::MainMenu => {
                info!(from = self.state.name(), "back to main menu");
                self.pause = None;
                self.session.reset();
                self.state = Box::new(MainMenu::new());
            }
            Transition::Quit => {
                info!("quitting");
                self.session.close_link();
                self.running = false;
            }
        }
    }
}
