use crate::{
    error::EntityError,
    geometry::{Rect, Side, Vector},
};

pub const BOUNCER_WIDTH: f64 = 10.0;
pub const BOUNCER_HEIGHT: f64 = 50.0;
pub const MOVEMENT_SPEED: f64 = 4.0;

/// Direction keys held for one paddle this tick.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Input {
    pub up: bool,
    pub down: bool,
}

fn start_position(side: Side, screen_width: f64, screen_height: f64) -> Vector {
    let x = if side == Side::Right {
        screen_width - 25.0
    } else {
        15.0
    };
    Vector::new(x, (screen_height - BOUNCER_HEIGHT) / 2.0)
}

/// Paddle moved by this machine: keyboard or CPU.
#[derive(Debug, Clone)]
pub struct LocalPaddle {
    name: String,
    side: Side,
    position: Vector,
    screen_height: f64,
    field_border_width: f64,
}

impl LocalPaddle {
    pub fn new(
        name: impl Into<String>,
        side: Side,
        screen_width: f64,
        screen_height: f64,
        field_border_width: f64,
    ) -> Self {
        Self {
            name: name.into(),
            side,
            position: start_position(side, screen_width, screen_height),
            screen_height,
            field_border_width,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn position(&self) -> Vector {
        self.position
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(
            self.position.x,
            self.position.y,
            BOUNCER_WIDTH,
            BOUNCER_HEIGHT,
        )
    }

    /// Moves one step. Up wins when both keys are held.
    pub fn update(&mut self, input: Input) {
        if input.up {
            self.position.y -= MOVEMENT_SPEED;
        } else if input.down {
            self.position.y += MOVEMENT_SPEED;
        }

        self.keep_in_bounds();
    }

    /// Sets Y directly, used by the CPU player. Not clamped here: the AI
    /// clamps its own output.
    pub fn set_position(&mut self, y: f64) {
        self.position.y = y;
    }

    pub fn reset(&mut self) {
        self.position.y = (self.screen_height - BOUNCER_HEIGHT) / 2.0;
    }

    fn keep_in_bounds(&mut self) {
        let max_y = self.screen_height - BOUNCER_HEIGHT - self.field_border_width;
        self.position.y = self.position.y.max(self.field_border_width).min(max_y);
    }
}

/// Read-only copy of a paddle the server moves.
#[derive(Debug, Clone)]
pub struct NetworkPaddle {
    name: String,
    side: Side,
    position: Vector,
}

impl NetworkPaddle {
    pub fn new(name: impl Into<String>, side: Side, screen_width: f64, screen_height: f64) -> Self {
        Self {
            name: name.into(),
            side,
            position: start_position(side, screen_width, screen_height),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn position(&self) -> Vector {
        self.position
    }

    pub fn set_position(&mut self, y: f64) {
        self.position.y = y;
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaddleKind {
    Local,
    Network,
}

#[derive(Debug, Clone)]
pub enum Paddle {
    Local(LocalPaddle),
    Network(NetworkPaddle),
}

impl Paddle {
    pub fn kind(&self) -> PaddleKind {
        match self {
            Paddle::Local(_) => PaddleKind::Local,
            Paddle::Network(_) => PaddleKind::Network,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Paddle::Local(p) => p.name(),
            Paddle::Network(p) => p.name(),
        }
    }

    pub fn side(&self) -> Side {
        match self {
            Paddle::Local(p) => p.side(),
            Paddle::Network(p) => p.side(),
        }
    }

    pub fn position(&self) -> Vector {
        match self {
            Paddle::Local(p) => p.position(),
            Paddle::Network(p) => p.position(),
        }
    }

    pub fn bounds(&self) -> Rect {
        let position = self.position();
        Rect::new(position.x, position.y, BOUNCER_WIDTH, BOUNCER_HEIGHT)
    }

    pub fn set_position(&mut self, y: f64) {
        match self {
            Paddle::Local(p) => p.set_position(y),
            Paddle::Network(p) => p.set_position(y),
        }
    }

    pub fn update(&mut self, input: Input) -> Result<(), EntityError> {
        self.local_mut("update")?.update(input);
        Ok(())
    }

    pub fn reset(&mut self) -> Result<(), EntityError> {
        self.local_mut("reset")?.reset();
        Ok(())
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> Result<(), EntityError> {
        match self {
            Paddle::Network(p) => {
                p.set_name(name);
                Ok(())
            }
            Paddle::Local(_) => Err(EntityError::Simulated {
                entity: "paddle",
                operation: "set_name",
            }),
        }
    }

    fn local_mut(&mut self, operation: &'static str) -> Result<&mut LocalPaddle, EntityError> {
        match self {
            Paddle::Local(p) => Ok(p),
            Paddle::Network(_) => Err(EntityError::Mirrored {
                entity: "paddle",
                operation,
            }),
        }
    }
}

impl From<LocalPaddle> for Paddle {
    fn from(paddle: LocalPaddle) -> Self {
        Paddle::Local(paddle)
    }
}

impl From<NetworkPaddle> for Paddle {
    fn from(paddle: NetworkPaddle) -> Self {
        Paddle::Network(paddle)
    }
}
