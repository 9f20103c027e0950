use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{
    error::EntityError,
    geometry::{Rect, Side, Vector},
    level::Level,
};

pub const BALL_WIDTH: f64 = 10.0;
pub const INITIAL_SPEED: f64 = 2.0;
pub const MAX_SPEED: f64 = 8.0;

// Spread of the serve cone, in whole degrees.
const SERVE_SPREAD: u32 = 90;
// Random deviation added to every paddle reflection.
const BOUNCE_DEVIATION: f64 = 20.0;

/// Ball simulated on this machine (one and two player modes).
#[derive(Debug, Clone)]
pub struct LocalBall {
    position: Vector,
    angle: f64,
    speed: f64,
    bounces: u32,
    width: f64,
    level: Level,
    screen_width: f64,
    screen_height: f64,
    rng: StdRng,
}

impl LocalBall {
    /// Centred ball served towards `next_side`.
    pub fn new(next_side: Side, screen_width: f64, screen_height: f64, level: Level) -> Self {
        Self::with_rng(
            next_side,
            screen_width,
            screen_height,
            level,
            StdRng::from_os_rng(),
        )
    }

    pub fn with_rng(
        next_side: Side,
        screen_width: f64,
        screen_height: f64,
        level: Level,
        mut rng: StdRng,
    ) -> Self {
        let angle = serve_angle(next_side, &mut rng);
        Self {
            position: Vector::new(
                (screen_width - BALL_WIDTH) / 2.0,
                (screen_height - BALL_WIDTH) / 2.0,
            ),
            angle,
            speed: INITIAL_SPEED,
            bounces: 0,
            width: BALL_WIDTH,
            level,
            screen_width,
            screen_height,
            rng,
        }
    }

    pub fn angle(&self) -> f64 {
        self.angle
    }

    pub fn bounces(&self) -> u32 {
        self.bounces
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn position(&self) -> Vector {
        self.position
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(self.position.x, self.position.y, self.width, self.width)
    }

    pub fn set_position(&mut self, position: Vector) {
        self.position = position;
    }

    /// Advances one tick, then resolves wall and paddle contacts.
    pub fn update(&mut self, p1_bounds: &Rect, p2_bounds: &Rect) {
        let radians = self.angle.to_radians();
        self.position.x += self.speed * radians.cos();
        self.position.y += self.speed * radians.sin();

        self.bounce(p1_bounds, p2_bounds);
    }

    /// `Some(Side::Left)` when the ball left through the left edge (the right
    /// player scored), `Some(Side::Right)` for the right edge. The side names
    /// where the ball exited, never who scored.
    pub fn check_goal(&self) -> Option<Side> {
        if self.position.x + self.width <= 0.0 {
            return Some(Side::Left);
        }

        if self.position.x >= self.screen_width {
            return Some(Side::Right);
        }

        None
    }

    /// Replaces this ball with a fresh one served towards `next_side`.
    /// The random source carries over.
    pub fn reset(&mut self, next_side: Side) {
        self.angle = serve_angle(next_side, &mut self.rng);
        self.position = Vector::new(
            (self.screen_width - self.width) / 2.0,
            (self.screen_height - self.width) / 2.0,
        );
        self.speed = INITIAL_SPEED;
        self.bounces = 0;
    }

    fn bounce(&mut self, p1_bounds: &Rect, p2_bounds: &Rect) {
        // top or bottom wall; the border is as thick as the ball
        if self.position.y <= BALL_WIDTH
            || self.position.y >= self.screen_height - self.width - BALL_WIDTH
        {
            self.angle = -self.angle;
            self.register_bounce();
        }

        let bounds = self.bounds();
        if p1_bounds.intersects(&bounds) || p2_bounds.intersects(&bounds) {
            self.random_bounce();
            self.register_bounce();
        }
    }

    // Horizontal reflection skewed by the ball width plus up to 20 degrees of
    // noise. The skew is part of how the game feels; keep it.
    fn random_bounce(&mut self) {
        self.angle = 180.0 - self.angle - BALL_WIDTH + BOUNCE_DEVIATION * self.rng.random::<f64>();
    }

    fn register_bounce(&mut self) {
        self.bounces += 1;
        self.increase_speed();
    }

    fn increase_speed(&mut self) {
        if self.bounces % 2 != 0 {
            return;
        }

        self.speed = (self.speed + self.level.speed_increment()).min(MAX_SPEED);
    }
}

fn serve_angle(next_side: Side, rng: &mut StdRng) -> f64 {
    let offset = rng.random_range(0..=SERVE_SPREAD) as f64;
    match next_side {
        Side::Left => -45.0 + offset,
        _ => 135.0 + offset,
    }
}

/// Passive copy of the server's ball. Only ever written from network
/// messages.
#[derive(Debug, Clone, Default)]
pub struct NetworkBall {
    position: Vector,
    angle: f64,
    bounces: u32,
    width: f64,
}

impl NetworkBall {
    pub fn new() -> Self {
        Self {
            width: BALL_WIDTH,
            ..Self::default()
        }
    }

    pub fn angle(&self) -> f64 {
        self.angle
    }

    pub fn bounces(&self) -> u32 {
        self.bounces
    }

    pub fn position(&self) -> Vector {
        self.position
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn set_position(&mut self, position: Vector) {
        self.position = position;
    }

    pub fn set_angle(&mut self, angle: f64) {
        self.angle = angle;
    }

    pub fn set_bounces(&mut self, bounces: u32) {
        self.bounces = bounces;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BallKind {
    Local,
    Network,
}

/// Either ball behind one face. Simulation calls on the network variant, and
/// mirror setters on the local one, return `EntityError`.
#[derive(Debug, Clone)]
pub enum Ball {
    Local(LocalBall),
    Network(NetworkBall),
}

impl Ball {
    pub fn kind(&self) -> BallKind {
        match self {
            Ball::Local(_) => BallKind::Local,
            Ball::Network(_) => BallKind::Network,
        }
    }

    pub fn angle(&self) -> f64 {
        match self {
            Ball::Local(b) => b.angle(),
            Ball::Network(b) => b.angle(),
        }
    }

    pub fn bounces(&self) -> u32 {
        match self {
            Ball::Local(b) => b.bounces(),
            Ball::Network(b) => b.bounces(),
        }
    }

    pub fn position(&self) -> Vector {
        match self {
            Ball::Local(b) => b.position(),
            Ball::Network(b) => b.position(),
        }
    }

    pub fn width(&self) -> f64 {
        match self {
            Ball::Local(b) => b.width(),
            Ball::Network(b) => b.width(),
        }
    }

    pub fn bounds(&self) -> Rect {
        let position = self.position();
        let width = self.width();
        Rect::new(position.x, position.y, width, width)
    }

    pub fn set_position(&mut self, position: Vector) {
        match self {
            Ball::Local(b) => b.set_position(position),
            Ball::Network(b) => b.set_position(position),
        }
    }

    pub fn update(&mut self, p1_bounds: &Rect, p2_bounds: &Rect) -> Result<(), EntityError> {
        self.local_mut("update")?.update(p1_bounds, p2_bounds);
        Ok(())
    }

    pub fn check_goal(&mut self) -> Result<Option<Side>, EntityError> {
        Ok(self.local_mut("check_goal")?.check_goal())
    }

    pub fn reset(&mut self, next_side: Side) -> Result<(), EntityError> {
        self.local_mut("reset")?.reset(next_side);
        Ok(())
    }

    pub fn set_angle(&mut self, angle: f64) -> Result<(), EntityError> {
        self.network_mut("set_angle")?.set_angle(angle);
        Ok(())
    }

    pub fn set_bounces(&mut self, bounces: u32) -> Result<(), EntityError> {
        self.network_mut("set_bounces")?.set_bounces(bounces);
        Ok(())
    }

    fn local_mut(&mut self, operation: &'static str) -> Result<&mut LocalBall, EntityError> {
        match self {
            Ball::Local(b) => Ok(b),
            Ball::Network(_) => Err(EntityError::Mirrored {
                entity: "ball",
                operation,
            }),
        }
    }

    fn network_mut(&mut self, operation: &'static str) -> Result<&mut NetworkBall, EntityError> {
        match self {
            Ball::Network(b) => Ok(b),
            Ball::Local(_) => Err(EntityError::Simulated {
                entity: "ball",
                operation,
            }),
        }
    }
}

impl From<LocalBall> for Ball {
    fn from(ball: LocalBall) -> Self {
        Ball::Local(ball)
    }
}

impl From<NetworkBall> for Ball {
    fn from(ball: NetworkBall) -> Self {
        Ball::Network(ball)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SCREEN_HEIGHT, SCREEN_WIDTH};

    fn seeded(side: Side, level: Level, seed: u64) -> LocalBall {
        LocalBall::with_rng(
            side,
            SCREEN_WIDTH,
            SCREEN_HEIGHT,
            level,
            StdRng::seed_from_u64(seed),
        )
    }

    fn standard_paddles() -> (Rect, Rect) {
        (
            Rect::new(15.0, 215.0, 10.0, 50.0),
            Rect::new(615.0, 215.0, 10.0, 50.0),
        )
    }

    #[test]
    fn serve_angles_stay_in_their_cones() {
        for seed in 0..300 {
            let left = seeded(Side::Left, Level::Easy, seed);
            assert!((-45.0..=45.0).contains(&left.angle()), "{}", left.angle());

            let right = seeded(Side::Right, Level::Easy, seed);
            assert!((135.0..=225.0).contains(&right.angle()), "{}", right.angle());
        }
    }

    #[test]
    fn starts_centred() {
        let ball = seeded(Side::Right, Level::Easy, 1);
        assert_eq!(ball.position(), Vector::new(315.0, 235.0));
        assert_eq!(ball.speed(), INITIAL_SPEED);
        assert_eq!(ball.bounces(), 0);
    }

    #[test]
    fn goal_names_the_exit_side() {
        let mut ball = seeded(Side::Left, Level::Easy, 2);

        ball.set_position(Vector::new(-BALL_WIDTH, 200.0));
        assert_eq!(ball.check_goal(), Some(Side::Left));

        ball.set_position(Vector::new(640.0, 200.0));
        assert_eq!(ball.check_goal(), Some(Side::Right));

        ball.set_position(Vector::new(320.0, 200.0));
        assert_eq!(ball.check_goal(), None);

        ball.set_position(Vector::new(-9.9, 200.0));
        assert_eq!(ball.check_goal(), None);
    }

    #[test]
    fn speed_grows_every_second_bounce() {
        let mut ball = seeded(Side::Left, Level::Medium, 3);
        ball.register_bounce();
        assert_eq!(ball.speed(), INITIAL_SPEED);
        ball.register_bounce();
        assert_eq!(ball.speed(), INITIAL_SPEED + 1.0);

        for _ in 0..20 {
            ball.register_bounce();
            assert!(ball.speed() <= MAX_SPEED);
        }
        assert_eq!(ball.speed(), MAX_SPEED);

        let mut easy = seeded(Side::Left, Level::Easy, 3);
        easy.register_bounce();
        easy.register_bounce();
        assert_eq!(easy.speed(), 2.5);

        let mut hard = seeded(Side::Left, Level::Hard, 3);
        for _ in 0..8 {
            hard.register_bounce();
        }
        assert_eq!(hard.speed(), MAX_SPEED);
    }

    #[test]
    fn first_tick_from_centre_touches_nothing() {
        let (p1, p2) = standard_paddles();
        for seed in 0..50 {
            let mut ball = seeded(Side::Right, Level::Hard, seed);
            ball.update(&p1, &p2);
            assert_eq!(ball.bounces(), 0);
        }
    }

    #[test]
    fn wall_contact_mirrors_vertical_component() {
        let mut ball = seeded(Side::Left, Level::Easy, 4);
        ball.angle = -30.0;
        ball.set_position(Vector::new(300.0, 10.5));
        ball.update(&Rect::default(), &Rect::default());

        assert_eq!(ball.angle(), 30.0);
        assert_eq!(ball.bounces(), 1);
    }

    #[test]
    fn rally_reaches_left_paddle_and_reflects() {
        let (p1, p2) = standard_paddles();
        let mut ball = seeded(Side::Right, Level::Medium, 11);
        ball.angle = 180.0;
        ball.set_position(Vector::new(320.0, 235.0));

        let mut ticks = 0;
        while ball.bounces() == 0 {
            ball.update(&p1, &p2);
            ticks += 1;
            assert!(ticks < 500, "ball never reached the paddle");
        }

        assert_eq!(ticks, 148);
        // 180 - 180 - 10 + [0, 20)
        assert!((-10.0..10.0).contains(&ball.angle()), "{}", ball.angle());
        assert!(ball.angle().to_radians().cos() > 0.0);
        assert!(p1.intersects(&ball.bounds()));
    }

    #[test]
    fn same_seed_same_rally() {
        let (p1, p2) = standard_paddles();
        let mut a = seeded(Side::Left, Level::Hard, 99);
        let mut b = seeded(Side::Left, Level::Hard, 99);
        for _ in 0..1_000 {
            a.update(&p1, &p2);
            b.update(&p1, &p2);
        }
        assert_eq!(a.position(), b.position());
        assert_eq!(a.angle(), b.angle());
    }

    #[test]
    fn reset_serves_a_fresh_ball() {
        let (p1, p2) = standard_paddles();
        let mut ball = seeded(Side::Left, Level::Hard, 5);
        for _ in 0..200 {
            ball.update(&p1, &p2);
        }
        ball.reset(Side::Right);

        assert_eq!(ball.position(), Vector::new(315.0, 235.0));
        assert_eq!(ball.speed(), INITIAL_SPEED);
        assert_eq!(ball.bounces(), 0);
        assert!((135.0..=225.0).contains(&ball.angle()));
    }

    #[test]
    fn capabilities_follow_the_variant() {
        let kinds = [BallKind::Local, BallKind::Network];
        for kind in kinds {
            let mut ball: Ball = match kind {
                BallKind::Local => seeded(Side::Left, Level::Easy, 6).into(),
                BallKind::Network => NetworkBall::new().into(),
            };
            assert_eq!(ball.kind(), kind);

            let simulated = ball.update(&Rect::default(), &Rect::default()).is_ok();
            let goal = ball.check_goal().is_ok();
            let reset = ball.reset(Side::Left).is_ok();
            let angle = ball.set_angle(12.0).is_ok();
            let bounces = ball.set_bounces(3).is_ok();

            match kind {
                BallKind::Local => {
                    assert!(simulated && goal && reset);
                    assert!(!angle && !bounces);
                }
                BallKind::Network => {
                    assert!(!simulated && !goal && !reset);
                    assert!(angle && bounces);
                    assert_eq!(ball.angle(), 12.0);
                    assert_eq!(ball.bounces(), 3);
                }
            }
        }

        let err = Ball::from(NetworkBall::new())
            .update(&Rect::default(), &Rect::default())
            .unwrap_err();
        assert_eq!(
            err,
            EntityError::Mirrored {
                entity: "ball",
                operation: "update"
            }
        );
    }
}
