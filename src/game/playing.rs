use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::debug;

use crate::{
    ai,
    ball::{Ball, LocalBall},
    config::{FIELD_BORDER_WIDTH, SCREEN_HEIGHT, SCREEN_WIDTH},
    error::GameError,
    geometry::Side,
    level::Level,
    paddle::{Input, LocalPaddle, Paddle, BOUNCER_HEIGHT},
    render::{Key, Keyboard, Surface},
};

use super::{hud, Session, State, Transition};

/// Side the first ball of a local match is served towards.
const FIRST_SERVE: Side = Side::Right;

/// One ball, two paddles and two scores simulated on this machine.
pub struct LocalMatch {
    ball: Ball,
    player1: Paddle,
    player2: Paddle,
    score1: i8,
    score2: i8,
    next_side: Side,
    max_score: i8,
}

impl LocalMatch {
    pub fn new(name1: &str, name2: &str, level: Level, max_score: i8, rng: StdRng) -> Self {
        let player1 = LocalPaddle::new(
            name1,
            Side::Left,
            SCREEN_WIDTH,
            SCREEN_HEIGHT,
            FIELD_BORDER_WIDTH,
        );
        let player2 = LocalPaddle::new(
            name2,
            Side::Right,
            SCREEN_WIDTH,
            SCREEN_HEIGHT,
            FIELD_BORDER_WIDTH,
        );
        let ball = LocalBall::with_rng(FIRST_SERVE, SCREEN_WIDTH, SCREEN_HEIGHT, level, rng);

        Self {
            ball: ball.into(),
            player1: player1.into(),
            player2: player2.into(),
            score1: 0,
            score2: 0,
            next_side: FIRST_SERVE,
            max_score,
        }
    }

    pub fn ball(&self) -> &Ball {
        &self.ball
    }

    pub fn player1(&self) -> &Paddle {
        &self.player1
    }

    pub fn player2(&self) -> &Paddle {
        &self.player2
    }

    pub fn scores(&self) -> (i8, i8) {
        (self.score1, self.score2)
    }

    /// Moves the ball one tick and settles goals. Returns the winner's name
    /// once a score reaches the target.
    pub fn advance(&mut self) -> Result<Option<String>, GameError> {
        self.ball
            .update(&self.player1.bounds(), &self.player2.bounds())?;

        let Some(exit) = self.ball.check_goal()? else {
            return Ok(None);
        };

        // A ball leaving on the left is a point for the right player.
        match exit {
            Side::Left => self.score2 += 1,
            Side::Right => self.score1 += 1,
            Side::Undefined => return Ok(None),
        }
        debug!(?exit, score1 = self.score1, score2 = self.score2, "goal");

        if self.score1 == self.max_score {
            return Ok(Some(self.player1.name().to_string()));
        }
        if self.score2 == self.max_score {
            return Ok(Some(self.player2.name().to_string()));
        }

        self.next_side = self.next_side.opposite();
        self.ball.reset(self.next_side)?;
        self.player1.reset()?;
        self.player2.reset()?;

        Ok(None)
    }

    fn draw(&self, surface: &mut dyn Surface) {
        hud::draw_field(surface);
        hud::draw_paddle(surface, &self.player1);
        hud::draw_paddle(surface, &self.player2);
        hud::draw_ball(surface, &self.ball);
        hud::draw_scores(surface, self.score1, self.score2);
        hud::draw_names(surface, self.player1.name(), self.player2.name());
    }
}

fn held(keys: &dyn Keyboard, up: Key, down: Key) -> Input {
    Input {
        up: keys.is_pressed(up),
        down: keys.is_pressed(down),
    }
}

fn finish(winner: Option<String>) -> Transition {
    match winner {
        Some(winner) => Transition::Ended { winner },
        None => Transition::Stay,
    }
}

/// Left paddle on the arrow keys against the CPU on the right.
pub struct OnePlayer {
    game: LocalMatch,
    cpu_rng: StdRng,
}

impl OnePlayer {
    pub fn new(session: &Session) -> Self {
        Self::with_rng(session, StdRng::from_os_rng())
    }

    pub fn with_rng(session: &Session, mut rng: StdRng) -> Self {
        let cpu_rng = StdRng::seed_from_u64(rng.random());
        Self {
            game: LocalMatch::new(
                "Player",
                "CPU",
                session.level,
                session.config().max_score,
                rng,
            ),
            cpu_rng,
        }
    }
}

impl State for OnePlayer {
    fn update(
        &mut self,
        _session: &mut Session,
        keys: &dyn Keyboard,
    ) -> Result<Transition, GameError> {
        self.game.player1.update(held(keys, Key::Up, Key::Down))?;

        let target = ai::guess_ball_position(
            &mut self.cpu_rng,
            self.game.ball.bounds().y,
            self.game.player2.position().y,
            BOUNCER_HEIGHT,
            SCREEN_HEIGHT,
            FIELD_BORDER_WIDTH,
        );
        self.game.player2.set_position(target);

        Ok(finish(self.game.advance()?))
    }

    fn draw(&self, _session: &Session, surface: &mut dyn Surface) {
        self.game.draw(surface);
    }

    fn ball(&self) -> Option<&Ball> {
        Some(self.game.ball())
    }

    fn can_pause(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "one_player"
    }
}

/// Q/A drive the left paddle, arrows the right one.
pub struct TwoPlayers {
    game: LocalMatch,
}

impl TwoPlayers {
    pub fn new(session: &Session) -> Self {
        Self::with_rng(session, StdRng::from_os_rng())
    }

    pub fn with_rng(session: &Session, rng: StdRng) -> Self {
        Self {
            game: LocalMatch::new(
                "Player 1",
                "Player 2",
                session.level,
                session.config().max_score,
                rng,
            ),
        }
    }
}

impl State for TwoPlayers {
    fn update(
        &mut self,
        _session: &mut Session,
        keys: &dyn Keyboard,
    ) -> Result<Transition, GameError> {
        self.game
            .player1
            .update(held(keys, Key::Char('q'), Key::Char('a')))?;
        self.game.player2.update(held(keys, Key::Up, Key::Down))?;

        Ok(finish(self.game.advance()?))
    }

    fn draw(&self, _session: &Session, surface: &mut dyn Surface) {
        self.game.draw(surface);
    }

    fn ball(&self) -> Option<&Ball> {
        Some(self.game.ball())
    }

    fn can_pause(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "two_players"
    }
}
