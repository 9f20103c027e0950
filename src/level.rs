use std::fmt;

use serde::{Deserialize, Serialize};

/// Difficulty. Selects how quickly a local ball speeds up.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Level {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl Level {
    pub const ALL: [Level; 3] = [Level::Easy, Level::Medium, Level::Hard];

    /// Speed gained on every second bounce.
    pub fn speed_increment(self) -> f64 {
        match self {
            Level::Easy => 0.5,
            Level::Medium => 1.0,
            Level::Hard => 2.0,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Level::Easy => "Easy",
            Level::Medium => "Medium",
            Level::Hard => "Hard",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<Level> for u8 {
    fn from(level: Level) -> u8 {
        match level {
            Level::Easy => 0,
            Level::Medium => 1,
            Level::Hard => 2,
        }
    }
}

impl TryFrom<u8> for Level {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Level::ALL
            .get(value as usize)
            .copied()
            .ok_or_else(|| format!("invalid level {value}"))
    }
}
