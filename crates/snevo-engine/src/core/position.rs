use serde::{Deserialize, Serialize};

/// A cell on the board, `(0, 0)` being the top-left corner.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display,
)]
#[display("({x}, {y})")]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    #[must_use]
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// Returns the Euclidean distance between two cells, ignoring wrap-around.
    #[must_use]
    #[expect(clippy::cast_precision_loss)]
    pub fn distance(self, other: Self) -> f64 {
        let dx = self.x.abs_diff(other.x) as f64;
        let dy = self.y.abs_diff(other.y) as f64;
        dx.hypot(dy)
    }
}
