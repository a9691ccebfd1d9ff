//! Cardinal directions on the 2D grid.
//!
//! Internally the solver always works with the fixed [`Direction`] enum.
//! Tilesets name their sides with strings ("up", "north", ...), so
//! [`DirectionNames`] translates configured names into the enum once, when
//! the tileset is compiled.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the four grid directions.
///
/// Order matches the edge order of a tile: up, right, down, left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    Up = 0,
    Right = 1,
    Down = 2,
    Left = 3,
}

/// Column offsets, indexed by `Direction as usize`.
pub const DX: [isize; 4] = [0, 1, 0, -1];

/// Row offsets, indexed by `Direction as usize`. Up is toward row 0.
pub const DY: [isize; 4] = [-1, 0, 1, 0];

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Right,
        Direction::Down,
        Direction::Left,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    #[inline]
    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Right => Direction::Left,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
        }
    }

    /// The direction this one points to after a clockwise quarter turn.
    #[inline]
    pub fn clockwise(self) -> Direction {
        Direction::ALL[(self.index() + 1) % 4]
    }

    /// Grid offset `(dx, dy)` of the neighbour in this direction.
    #[inline]
    pub fn offset(self) -> (isize, isize) {
        (DX[self.index()], DY[self.index()])
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Direction::Up => "up",
            Direction::Right => "right",
            Direction::Down => "down",
            Direction::Left => "left",
        };
        f.write_str(name)
    }
}

/// Configured names of the four sides, in up/right/down/left order.
///
/// Fixed for the lifetime of one solver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct DirectionNames {
    names: [String; 4],
}

impl DirectionNames {
    /// Build a mapping from names given in up, right, down, left order.
    pub fn new<S: Into<String>>(names: [S; 4]) -> Result<Self, ConfigError> {
        let names = names.map(Into::into);
        for (i, name) in names.iter().enumerate() {
            if names[..i].contains(name) {
                return Err(ConfigError::DuplicateDirection(name.clone()));
            }
        }
        Ok(Self { names })
    }

    /// Name configured for a direction.
    pub fn name(&self, direction: Direction) -> &str {
        &self.names[direction.index()]
    }

    /// Resolve a configured name back to its direction.
    pub fn lookup(&self, name: &str) -> Option<Direction> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| Direction::ALL[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = (Direction, &str)> {
        Direction::ALL
            .into_iter()
            .map(move |d| (d, self.names[d.index()].as_str()))
    }
}

impl Default for DirectionNames {
    fn default() -> Self {
        Self {
            names: ["up", "right", "down", "left"].map(String::from),
        }
    }
}

impl TryFrom<Vec<String>> for DirectionNames {
    type Error = ConfigError;

    fn try_from(names: Vec<String>) -> Result<Self, Self::Error> {
        let count = names.len();
        let names: [String; 4] = names
            .try_into()
            .map_err(|_| ConfigError::DirectionCount(count))?;
        DirectionNames::new(names)
    }
}

impl From<DirectionNames> for Vec<String> {
    fn from(names: DirectionNames) -> Self {
        names.names.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opposite_is_involution() {
        for d in Direction::ALL {
            assert_eq!(d.opposite().opposite(), d);
            assert_ne!(d.opposite(), d);
        }
    }

    #[test]
    fn test_offsets_cancel_with_opposite() {
        for d in Direction::ALL {
            let (dx, dy) = d.offset();
            let (ox, oy) = d.opposite().offset();
            assert_eq!((dx + ox, dy + oy), (0, 0));
        }
    }

    #[test]
    fn test_clockwise_cycle() {
        assert_eq!(Direction::Up.clockwise(), Direction::Right);
        assert_eq!(Direction::Left.clockwise(), Direction::Up);
    }

    #[test]
    fn test_default_names() {
        let names = DirectionNames::default();
        assert_eq!(names.name(Direction::Down), "down");
        assert_eq!(names.lookup("left"), Some(Direction::Left));
        assert_eq!(names.lookup("north"), None);
    }

    #[test]
    fn test_custom_names() {
        let names = DirectionNames::new(["n", "e", "s", "w"]).unwrap();
        assert_eq!(names.lookup("e"), Some(Direction::Right));
        assert_eq!(names.name(Direction::Left), "w");
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let err = DirectionNames::new(["a", "b", "a", "c"]).unwrap_err();
        assert_eq!(err, ConfigError::DuplicateDirection("a".into()));
    }

    #[test]
    fn test_names_from_json() {
        let names: DirectionNames =
            serde_json::from_str(r#"["top","east","bottom","west"]"#).unwrap();
        assert_eq!(names.lookup("bottom"), Some(Direction::Down));

        let err = serde_json::from_str::<DirectionNames>(r#"["a","b"]"#);
        assert!(err.is_err());
    }
}
