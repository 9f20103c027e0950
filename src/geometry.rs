use std::fmt;

use serde::{Deserialize, Serialize};

/// A 2D position or size in logical field units.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vector {
    #[serde(alias = "X")]
    pub x: f64,
    #[serde(alias = "Y")]
    pub y: f64,
}

impl Vector {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Vector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.0}:{:.0}", self.x, self.y)
    }
}

/// Axis-aligned box.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn max_x(&self) -> f64 {
        self.x + self.width
    }

    pub fn max_y(&self) -> f64 {
        self.y + self.height
    }

    /// Inclusive overlap test: boxes that only touch on an edge intersect.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x <= other.max_x()
            && other.x <= self.max_x()
            && self.y <= other.max_y()
            && other.y <= self.max_y()
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "x:{:.0}-y:{:.0} - w:{:.0}-h:{:.0}",
            self.x, self.y, self.width, self.height
        )
    }
}

/// Half of the field. Travels over the wire as an integer.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Side {
    #[default]
    Undefined,
    Right,
    Left,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
            Side::Undefined => Side::Undefined,
        }
    }
}

impl From<Side> for u8 {
    fn from(side: Side) -> u8 {
        match side {
            Side::Undefined => 0,
            Side::Right => 1,
            Side::Left => 2,
        }
    }
}

impl TryFrom<u8> for Side {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Side::Undefined),
            1 => Ok(Side::Right),
            2 => Ok(Side::Left),
            other => Err(format!("invalid side {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    #[test]
    fn touching_edges_intersect() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(10.0, 10.0, 5.0, 5.0);
        assert!(a.intersects(&b));

        let c = Rect::new(10.1, 0.0, 5.0, 5.0);
        assert!(!a.intersects(&c));
    }

    #[test]
    fn intersects_is_symmetric() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..2_000 {
            let a = Rect::new(
                rng.random_range(-50.0..50.0),
                rng.random_range(-50.0..50.0),
                rng.random_range(0.0..30.0),
                rng.random_range(0.0..30.0),
            );
            let b = Rect::new(
                rng.random_range(-50.0..50.0),
                rng.random_range(-50.0..50.0),
                rng.random_range(0.0..30.0),
                rng.random_range(0.0..30.0),
            );
            assert_eq!(a.intersects(&b), b.intersects(&a), "{a} vs {b}");
        }
    }

    #[test]
    fn side_wire_values() {
        assert_eq!(serde_json::to_string(&Side::Right).unwrap(), "1");
        assert_eq!(serde_json::from_str::<Side>("2").unwrap(), Side::Left);
        assert!(serde_json::from_str::<Side>("9").is_err());
        assert_eq!(Side::Left.opposite(), Side::Right);
    }

    #[test]
    fn vector_accepts_uppercase_keys() {
        let v: Vector = serde_json::from_str(r#"{"X": 3.5, "Y": 4}"#).unwrap();
        assert_eq!(v, Vector::new(3.5, 4.0));
    }
}
