use serde::{Deserialize, Serialize};

/// A heading on the grid.
///
/// The discriminant order is also the order of network outputs: output `i`
/// requests `Direction::from_index(i)`.
///
/// The y axis grows downwards, so `Up` decreases `y`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::FromStr,
)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[display("up")]
    Up,
    #[display("right")]
    Right,
    #[display("down")]
    Down,
    #[display("left")]
    Left,
}

impl Direction {
    pub const ALL: [Self; 4] = [Self::Up, Self::Right, Self::Down, Self::Left];

    #[must_use]
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Up),
            1 => Some(Self::Right),
            2 => Some(Self::Down),
            3 => Some(Self::Left),
            _ => None,
        }
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Right => Self::Left,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
        }
    }

    /// Returns the `(dx, dy)` offset of one step in this direction.
    #[must_use]
    pub const fn delta(self) -> (isize, isize) {
        match self {
            Self::Up => (0, -1),
            Self::Right => (1, 0),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
        }
    }
}

/// What happens when the head leaves the board.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::FromStr,
)]
#[serde(rename_all = "lowercase")]
pub enum EdgePolicy {
    /// Leaving the board is a wall collision.
    #[display("walled")]
    Walled,
    /// The board is a torus; the head re-enters on the opposite edge.
    #[display("wrapping")]
    Wrapping,
}
