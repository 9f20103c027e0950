//! Screens backed by the game server: connecting, playing and spectating.
//!
//! Server snapshots are applied as they come, with no interpolation or
//! prediction, so motion on screen is only as smooth as the server's tick
//! rate.

use std::future::Future;

use tokio::sync::oneshot::{self, error::TryRecvError};
use tracing::{debug, error, info, warn};

use crate::{
    ball::{Ball, NetworkBall},
    config::{SCREEN_HEIGHT, SCREEN_WIDTH},
    error::{EntityError, GameError},
    geometry::Side,
    network::{Link, NetError, NetworkEvent},
    paddle::{NetworkPaddle, Paddle},
    protocol::{GameState, PlayerInfo, PlayerInput, PlayerState, ReadyMessage},
    render::{Key, Keyboard, Surface, TextStyle, Tone},
};

use super::{
    hud::{self, MENU_SIZE},
    LinkPoll, Session, State, Transition,
};

/// Local mirror of the server's match. Player 1 is always the left paddle.
pub struct MirrorBoard {
    ball: Ball,
    player1: Paddle,
    player2: Paddle,
    score1: i8,
    score2: i8,
    ping1: i64,
    ping2: i64,
}

impl Default for MirrorBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl MirrorBoard {
    pub fn new() -> Self {
        Self {
            ball: NetworkBall::new().into(),
            player1: NetworkPaddle::new("", Side::Left, SCREEN_WIDTH, SCREEN_HEIGHT).into(),
            player2: NetworkPaddle::new("", Side::Right, SCREEN_WIDTH, SCREEN_HEIGHT).into(),
            score1: 0,
            score2: 0,
            ping1: 0,
            ping2: 0,
        }
    }

    pub fn ball(&self) -> &Ball {
        &self.ball
    }

    pub fn paddle(&self, side: Side) -> Option<&Paddle> {
        match side {
            Side::Left => Some(&self.player1),
            Side::Right => Some(&self.player2),
            Side::Undefined => None,
        }
    }

    /// Scores as (left, right).
    pub fn scores(&self) -> (i8, i8) {
        (self.score1, self.score2)
    }

    /// Pings as (left, right), in milliseconds.
    pub fn pings(&self) -> (i64, i64) {
        (self.ping1, self.ping2)
    }

    pub fn apply_ready(&mut self, ready: &ReadyMessage) -> Result<(), EntityError> {
        let opponent_side = match ready.opponent_side {
            Side::Undefined => ready.side.opposite(),
            side => side,
        };

        self.rename(ready.side, &ready.name)?;
        self.rename(opponent_side, &ready.opponent_name)
    }

    /// Overwrites ball, paddles, scores and pings with the snapshot. Players
    /// are matched to paddles by side, whatever their order on the wire.
    pub fn apply(&mut self, state: &GameState) -> Result<(), EntityError> {
        self.ball.set_position(state.ball.position);
        self.ball.set_angle(state.ball.angle)?;
        self.ball.set_bounces(state.ball.bounces)?;

        for player in state.players() {
            self.apply_player(player)?;
        }

        Ok(())
    }

    /// Name of the flagged winner, if the snapshot has one.
    pub fn winner(&self, state: &GameState) -> Option<String> {
        let winner = state.winner()?;
        if !winner.name.is_empty() {
            return Some(winner.name.clone());
        }

        self.paddle(winner.side)
            .map(|paddle| paddle.name().to_string())
            .filter(|name| !name.is_empty())
            .or_else(|| {
                let label = match winner.side {
                    Side::Left => "Left player",
                    Side::Right => "Right player",
                    Side::Undefined => "Player",
                };
                Some(label.to_string())
            })
    }

    fn apply_player(&mut self, player: &PlayerState) -> Result<(), EntityError> {
        let (paddle, score, ping) = match player.side {
            Side::Left => (&mut self.player1, &mut self.score1, &mut self.ping1),
            Side::Right => (&mut self.player2, &mut self.score2, &mut self.ping2),
            Side::Undefined => {
                warn!("player state without a side; ignoring");
                return Ok(());
            }
        };

        paddle.set_position(player.position_y);
        *score = player.score;
        *ping = player.ping;

        if !player.name.is_empty() && paddle.name() != player.name {
            paddle.set_name(player.name.clone())?;
        }

        Ok(())
    }

    fn rename(&mut self, side: Side, name: &str) -> Result<(), EntityError> {
        match side {
            Side::Left => self.player1.set_name(name),
            Side::Right => self.player2.set_name(name),
            Side::Undefined => Ok(()),
        }
    }

    fn draw(&self, surface: &mut dyn Surface) {
        hud::draw_field(surface);
        hud::draw_paddle(surface, &self.player1);
        hud::draw_paddle(surface, &self.player2);
        hud::draw_ball(surface, &self.ball);
        hud::draw_scores(surface, self.score1, self.score2);
        hud::draw_names(surface, self.player1.name(), self.player2.name());
        hud::draw_network_info(surface, self.ping1, self.ping2);
    }
}

/// Applies every queued event in arrival order. Stops at the first one that
/// ends the screen.
fn pump(
    board: &mut MirrorBoard,
    pending: &mut Option<NetworkEvent>,
    session: &mut Session,
) -> Result<Transition, GameError> {
    loop {
        let poll = match pending.take() {
            Some(event) => LinkPoll::Event(event),
            None => session.poll_link(),
        };

        match poll {
            LinkPoll::Idle => return Ok(Transition::Stay),
            LinkPoll::Lost => {
                warn!("game server connection lost");
                return Ok(Transition::MainMenu);
            }
            LinkPoll::Event(NetworkEvent::Failed(e)) => {
                error!(error = %e, "game server connection failed");
                return Ok(Transition::MainMenu);
            }
            LinkPoll::Event(NetworkEvent::Ready(ready)) => board.apply_ready(&ready)?,
            LinkPoll::Event(NetworkEvent::State(state)) => {
                board.apply(&state)?;
                if let Some(winner) = board.winner(&state) {
                    return Ok(Transition::Ended { winner });
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Player,
    Spectator,
}

enum Phase {
    Dialing(oneshot::Receiver<Result<Link, NetError>>),
    Waiting,
    Failed(String),
}

/// Runs one connection attempt until it finishes or the connecting screen
/// goes away. A link nobody takes is closed with a normal close frame.
async fn deliver(
    mut tx: oneshot::Sender<Result<Link, NetError>>,
    dial: impl Future<Output = Result<Link, NetError>>,
) {
    let result = tokio::select! {
        _ = tx.closed() => {
            debug!("connection attempt cancelled");
            return;
        }
        result = dial => result,
    };

    if let Err(Ok(mut link)) = tx.send(result) {
        debug!("connection attempt cancelled after connecting");
        link.client.close().await;
    }
}

/// Dials the server off the frame loop, then waits for the first message.
/// Leaving the screen cancels the attempt.
pub struct Connecting {
    role: Role,
    phase: Phase,
}

impl Connecting {
    pub fn multiplayer(session: &Session) -> Self {
        let config = session.config().clone();
        let info = PlayerInfo {
            player_name: session.player_name.clone(),
            level: session.level,
            screen_width: SCREEN_WIDTH as u16,
            screen_height: SCREEN_HEIGHT as u16,
            max_score: config.max_score,
        };

        let (tx, rx) = oneshot::channel();
        session.runtime().spawn(async move {
            deliver(tx, Link::multiplayer(&config, &info)).await;
        });

        Self {
            role: Role::Player,
            phase: Phase::Dialing(rx),
        }
    }

    pub fn spectator(session: &Session, session_id: String) -> Self {
        let config = session.config().clone();

        let (tx, rx) = oneshot::channel();
        session.runtime().spawn(async move {
            deliver(tx, Link::spectate(&config, &session_id)).await;
        });

        Self {
            role: Role::Spectator,
            phase: Phase::Dialing(rx),
        }
    }

    /// Message shown while connecting, or the failure.
    pub fn status(&self) -> &str {
        match &self.phase {
            Phase::Dialing(_) => "Connecting...",
            Phase::Waiting if self.role == Role::Player => "Waiting for opponent...",
            Phase::Waiting => "Waiting for match data...",
            Phase::Failed(message) => message,
        }
    }

    fn poll_dial(&mut self, session: &mut Session) {
        let Phase::Dialing(rx) = &mut self.phase else {
            return;
        };

        self.phase = match rx.try_recv() {
            Ok(Ok(link)) => {
                info!(role = ?self.role, "connected to game server");
                session.attach(link);
                Phase::Waiting
            }
            Ok(Err(e)) => {
                error!(error = %e, "failed to connect to server");
                Phase::Failed(e.to_string())
            }
            Err(TryRecvError::Empty) => return,
            Err(TryRecvError::Closed) => {
                error!("connect task stopped without an answer");
                Phase::Failed("connection attempt aborted".to_string())
            }
        };
    }

    fn poll_first_message(&mut self, session: &mut Session) -> Option<NetworkEvent> {
        match session.poll_link() {
            LinkPoll::Idle => None,
            LinkPoll::Event(NetworkEvent::Failed(e)) => {
                error!(error = %e, "connection failed before the match started");
                session.close_link();
                self.phase = Phase::Failed(e.to_string());
                None
            }
            LinkPoll::Lost => {
                session.close_link();
                self.phase = Phase::Failed(NetError::Closed.to_string());
                None
            }
            LinkPoll::Event(event) => Some(event),
        }
    }
}

impl State for Connecting {
    fn update(&mut self, session: &mut Session, keys: &dyn Keyboard) -> Result<Transition, GameError> {
        if keys.just_pressed(Key::Escape) {
            return Ok(Transition::MainMenu);
        }

        if let Phase::Failed(_) = self.phase {
            if keys.just_pressed(Key::Enter) {
                return Ok(Transition::MainMenu);
            }
            return Ok(Transition::Stay);
        }

        self.poll_dial(session);

        if let Phase::Waiting = self.phase {
            if let Some(first) = self.poll_first_message(session) {
                let next: Box<dyn State> = match self.role {
                    Role::Player => Box::new(Multiplayer::new(first)),
                    Role::Spectator => Box::new(Spectator::new(first)),
                };
                return Ok(Transition::Switch(next));
            }
        }

        Ok(Transition::Stay)
    }

    fn draw(&self, _session: &Session, surface: &mut dyn Surface) {
        hud::draw_title(surface);

        let tone = match self.phase {
            Phase::Failed(_) => Tone::Highlight,
            _ => Tone::Text,
        };
        surface.draw_centered(self.status(), 260.0, TextStyle::new(MENU_SIZE, tone));

        let hint = match self.phase {
            Phase::Failed(_) => "Press Enter to return to the menu",
            _ => "Press Esc to cancel",
        };
        surface.draw_centered(hint, 420.0, TextStyle::new(hud::SMALL_SIZE, Tone::Dim));
    }

    fn name(&self) -> &'static str {
        "connecting"
    }
}

/// This client's paddle on the server. Arrow keys are sent while held.
pub struct Multiplayer {
    board: MirrorBoard,
    pending: Option<NetworkEvent>,
}

impl Multiplayer {
    pub fn new(first: NetworkEvent) -> Self {
        Self {
            board: MirrorBoard::new(),
            pending: Some(first),
        }
    }
}

impl State for Multiplayer {
    fn update(&mut self, session: &mut Session, keys: &dyn Keyboard) -> Result<Transition, GameError> {
        if keys.just_pressed(Key::Escape) {
            info!("leaving multiplayer match");
            return Ok(Transition::MainMenu);
        }

        let input = PlayerInput {
            up: keys.is_pressed(Key::Up),
            down: keys.is_pressed(Key::Down),
        };
        if !input.is_idle() {
            if let Err(e) = session.send_input(input) {
                error!(error = %e, "failed to send player input");
                return Ok(Transition::MainMenu);
            }
        }

        pump(&mut self.board, &mut self.pending, session)
    }

    fn draw(&self, _session: &Session, surface: &mut dyn Surface) {
        self.board.draw(surface);
    }

    fn ball(&self) -> Option<&Ball> {
        Some(self.board.ball())
    }

    fn name(&self) -> &'static str {
        "multiplayer"
    }
}

/// Read-only view of someone else's match.
pub struct Spectator {
    board: MirrorBoard,
    pending: Option<NetworkEvent>,
}

impl Spectator {
    pub fn new(first: NetworkEvent) -> Self {
        Self {
            board: MirrorBoard::new(),
            pending: Some(first),
        }
    }
}

impl State for Spectator {
    fn update(&mut self, session: &mut Session, keys: &dyn Keyboard) -> Result<Transition, GameError> {
        if keys.just_pressed(Key::Escape) {
            info!("leaving spectator view");
            return Ok(Transition::MainMenu);
        }

        pump(&mut self.board, &mut self.pending, session)
    }

    fn draw(&self, _session: &Session, surface: &mut dyn Surface) {
        self.board.draw(surface);
        surface.draw_centered("SPECTATING", 440.0, TextStyle::new(hud::SMALL_SIZE, Tone::Dim));
    }

    fn ball(&self) -> Option<&Ball> {
        Some(self.board.ball())
    }

    fn name(&self) -> &'static str {
        "spectator"
    }
}
