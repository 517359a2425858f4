use std::num::NonZeroUsize;

use super::{EdgePolicy, Position};

/// Smallest accepted board edge.
pub const MIN_BOARD_SIZE: usize = 2;

/// Errors raised by [`BoardConfig::new`].
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum BoardConfigError {
    #[display("board {width}x{height} is too small: both edges must be at least 2")]
    BoardTooSmall { width: usize, height: usize },
    #[display("initial length {initial_length} must be between 1 and {max}")]
    InitialLengthOutOfRange { initial_length: usize, max: usize },
}

/// Validated board geometry and episode rules.
///
/// The stalling cap is a [`NonZeroUsize`], so every episode is guaranteed to
/// terminate.
///
/// # Example
///
/// ```
/// use std::num::NonZeroUsize;
/// use snevo_engine::{BoardConfig, EdgePolicy};
///
/// let cap = NonZeroUsize::new(100).unwrap();
/// let config = BoardConfig::new(20, 20, EdgePolicy::Walled, cap, 3).unwrap();
/// assert_eq!(config.cell_count(), 400);
///
/// assert!(BoardConfig::new(1, 20, EdgePolicy::Walled, cap, 1).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardConfig {
    width: usize,
    height: usize,
    edge_policy: EdgePolicy,
    max_steps_without_food: NonZeroUsize,
    initial_length: usize,
}

impl BoardConfig {
    pub fn new(
        width: usize,
        height: usize,
        edge_policy: EdgePolicy,
        max_steps_without_food: NonZeroUsize,
        initial_length: usize,
    ) -> Result<Self, BoardConfigError> {
        if width < MIN_BOARD_SIZE || height < MIN_BOARD_SIZE {
            return Err(BoardConfigError::BoardTooSmall { width, height });
        }
        // The body trails to the left of the centred head.
        let max = width / 2 + 1;
        if !(1..=max).contains(&initial_length) {
            return Err(BoardConfigError::InitialLengthOutOfRange {
                initial_length,
                max,
            });
        }
        Ok(Self {
            width,
            height,
            edge_policy,
            max_steps_without_food,
            initial_length,
        })
    }

    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    #[must_use]
    pub const fn cell_count(&self) -> usize {
        self.width * self.height
    }

    #[must_use]
    pub const fn edge_policy(&self) -> EdgePolicy {
        self.edge_policy
    }

    #[must_use]
    pub const fn max_steps_without_food(&self) -> NonZeroUsize {
        self.max_steps_without_food
    }

    #[must_use]
    pub const fn initial_length(&self) -> usize {
        self.initial_length
    }

    /// Returns the starting head cell.
    #[must_use]
    pub const fn start(&self) -> Position {
        Position::new(self.width / 2, self.height / 2)
    }

    #[must_use]
    pub(crate) const fn index(&self, pos: Position) -> usize {
        pos.y * self.width + pos.x
    }

    /// Moves `pos` by `(dx, dy)` under the edge policy.
    ///
    /// Returns `None` when a walled board is left.
    #[must_use]
    pub fn offset(&self, pos: Position, dx: isize, dy: isize) -> Option<Position> {
        match self.edge_policy {
            EdgePolicy::Walled => {
                let x = pos.x.checked_add_signed(dx).filter(|&x| x < self.width)?;
                let y = pos.y.checked_add_signed(dy).filter(|&y| y < self.height)?;
                Some(Position::new(x, y))
            }
            EdgePolicy::Wrapping => {
                let x = wrap(pos.x, dx, self.width);
                let y = wrap(pos.y, dy, self.height);
                Some(Position::new(x, y))
            }
        }
    }
}

#[expect(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
fn wrap(value: usize, delta: isize, len: usize) -> usize {
    (value as isize + delta).rem_euclid(len as isize) as usize
}
