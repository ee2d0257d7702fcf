//! Location and travel direction: the join keys of the track graph.
//!
//! Segments, switches and stations never hold references to each other.
//! They are connected purely by sharing a `Location`, so equality here is
//! exact: two locations are equal iff both coordinates have the same bit
//! pattern. No epsilon comparison is ever applied.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// An immutable 2D coordinate.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(from = "(f64, f64)", into = "(f64, f64)")]
pub struct Location {
    x: f64,
    y: f64,
}

impl Location {
    /// Create a location.
    ///
    /// `-0.0` is folded into `0.0` so that bitwise equality agrees with
    /// what a layout author means.
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x: x + 0.0,
            y: y + 0.0,
        }
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    /// Both coordinates are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Euclidean distance, used to scale movement steps.
    pub fn distance_to(&self, other: &Location) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

impl PartialEq for Location {
    fn eq(&self, other: &Self) -> bool {
        self.x.to_bits() == other.x.to_bits() && self.y.to_bits() == other.y.to_bits()
    }
}

impl Eq for Location {}

impl Hash for Location {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.x.to_bits().hash(state);
        self.y.to_bits().hash(state);
    }
}

impl From<(f64, f64)> for Location {
    fn from((x, y): (f64, f64)) -> Self {
        Location::new(x, y)
    }
}

impl From<Location> for (f64, f64) {
    fn from(location: Location) -> Self {
        (location.x, location.y)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

/// Travel orientation along the graph.
///
/// Decides which endpoint of a segment is "ahead": `end` when travelling
/// right, `start` when travelling left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    Right,
    Left,
}

impl Direction {
    /// Direction needed to get from `from` to `to`, judged on X alone.
    pub fn towards(from: &Location, to: &Location) -> Self {
        if to.x() > from.x() {
            Direction::Right
        } else {
            Direction::Left
        }
    }

    /// `to` is not behind `from` when travelling this way. Points level
    /// with `from` count as ahead in both directions.
    pub fn is_ahead(self, from: &Location, to: &Location) -> bool {
        match self {
            Direction::Right => to.x() >= from.x(),
            Direction::Left => to.x() <= from.x(),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Right => write!(f, "Right"),
            Direction::Left => write!(f, "Left"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_equality_is_exact() {
        assert_eq!(Location::new(1.0, 2.0), Location::new(1.0, 2.0));
        assert_ne!(Location::new(0.1 + 0.2, 0.0), Location::new(0.3, 0.0));
    }

    #[test]
    fn test_negative_zero_folds() {
        let a = Location::new(-0.0, 0.0);
        let b = Location::new(0.0, -0.0);
        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn test_direction_towards() {
        let origin = Location::new(2.0, 0.0);
        assert_eq!(Direction::towards(&origin, &Location::new(5.0, 0.0)), Direction::Right);
        assert_eq!(Direction::towards(&origin, &Location::new(0.0, 3.0)), Direction::Left);
        // Equal X is not "greater", so the train heads left
        assert_eq!(Direction::towards(&origin, &Location::new(2.0, 9.0)), Direction::Left);
    }

    #[test]
    fn test_direction_is_ahead() {
        let origin = Location::new(2.0, 0.0);
        assert!(Direction::Right.is_ahead(&origin, &Location::new(4.0, -1.0)));
        assert!(!Direction::Right.is_ahead(&origin, &Location::new(0.0, 0.0)));
        assert!(Direction::Left.is_ahead(&origin, &Location::new(0.0, 0.0)));
        // Straight up is ahead either way
        assert!(Direction::Right.is_ahead(&origin, &Location::new(2.0, 3.0)));
        assert!(Direction::Left.is_ahead(&origin, &Location::new(2.0, 3.0)));
    }

    #[test]
    fn test_serde_folds_negative_zero() {
        let location: Location = serde_json::from_str("[-0.0, 4.5]").unwrap();
        assert_eq!(location, Location::new(0.0, 4.5));
        assert_eq!(serde_json::to_string(&location).unwrap(), "[0.0,4.5]");
    }

    #[test]
    fn test_display() {
        assert_eq!(Location::new(1.5, 2.0).to_string(), "(1.5,2)");
        assert_eq!(Direction::Left.to_string(), "Left");
    }
}
