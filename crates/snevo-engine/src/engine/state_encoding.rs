use serde::{Deserialize, Serialize};

use crate::core::{Direction, EdgePolicy, Position};

use super::SnakeGame;

/// Ray directions cast by [`StateEncoding::Vision`], clockwise from `Up`.
const RAYS: [(isize, isize); 8] = [
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
];

/// Layout of the feature vector fed to a network.
///
/// The layout fixes the network input width, so it is chosen together with the
/// topology and never inferred.
///
/// - `Minimal`: food `dx`, `dy` (normalised by board size), then danger flags for
///   `Up`, `Right`, `Down`, `Left`.
/// - `Compact`: head `x`, `y`, food `x`, `y`, food `dx`, `dy` (all normalised),
///   four danger flags, then a one-hot heading.
/// - `Vision`: a one-hot heading, then for each of eight rays clockwise from `Up`
///   the inverse distance to a wall, the food and the body.
#[derive(
    Debug,
    Default,
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
pub enum StateEncoding {
    #[display("minimal")]
    Minimal,
    #[default]
    #[display("compact")]
    Compact,
    #[display("vision")]
    Vision,
}

impl StateEncoding {
    /// Returns the length of the vectors produced by this encoding.
    #[must_use]
    pub const fn width(self) -> usize {
        match self {
            Self::Minimal => 6,
            Self::Compact => 14,
            Self::Vision => 4 + RAYS.len() * 3,
        }
    }
}

impl SnakeGame {
    /// Extracts the feature vector for the current tick.
    #[must_use]
    pub fn state_vector(&self, encoding: StateEncoding) -> Vec<f64> {
        let mut features = Vec::with_capacity(encoding.width());
        match encoding {
            StateEncoding::Minimal => {
                self.push_food_offset(&mut features);
                self.push_dangers(&mut features);
            }
            StateEncoding::Compact => {
                let head = self.head();
                let food = self.food().unwrap_or(head);
                features.extend([
                    self.normalised_x(head.x),
                    self.normalised_y(head.y),
                    self.normalised_x(food.x),
                    self.normalised_y(food.y),
                ]);
                self.push_food_offset(&mut features);
                self.push_dangers(&mut features);
                self.push_heading(&mut features);
            }
            StateEncoding::Vision => {
                self.push_heading(&mut features);
                for (dx, dy) in RAYS {
                    features.extend(self.look(dx, dy));
                }
            }
        }
        debug_assert_eq!(features.len(), encoding.width());
        features
    }

    #[expect(clippy::cast_precision_loss)]
    fn normalised_x(&self, x: usize) -> f64 {
        x as f64 / self.config().width() as f64
    }

    #[expect(clippy::cast_precision_loss)]
    fn normalised_y(&self, y: usize) -> f64 {
        y as f64 / self.config().height() as f64
    }

    fn push_food_offset(&self, features: &mut Vec<f64>) {
        let head = self.head();
        let food = self.food().unwrap_or(head);
        features.push(self.normalised_x(food.x) - self.normalised_x(head.x));
        features.push(self.normalised_y(food.y) - self.normalised_y(head.y));
    }

    fn push_dangers(&self, features: &mut Vec<f64>) {
        let head = self.head();
        for dir in Direction::ALL {
            let (dx, dy) = dir.delta();
            let danger = match self.config().offset(head, dx, dy) {
                None => true,
                Some(pos) => pos != head && self.is_occupied(pos),
            };
            features.push(if danger { 1.0 } else { 0.0 });
        }
    }

    fn push_heading(&self, features: &mut Vec<f64>) {
        let heading = self.heading();
        features.extend(Direction::ALL.map(|d| if d == heading { 1.0 } else { 0.0 }));
    }

    /// Casts one ray from the head, returning `[wall, food, body]` inverse distances.
    fn look(&self, dx: isize, dy: isize) -> [f64; 3] {
        let config = self.config();
        let head = self.head();
        let max_distance = config.width().max(config.height());
        let mut wall = 0.0;
        let mut food = None;
        let mut body = None;

        let mut pos: Position = head;
        let mut distance = 1_usize;
        loop {
            let Some(next) = config.offset(pos, dx, dy) else {
                wall = inverse(distance);
                break;
            };
            if config.edge_policy() == EdgePolicy::Wrapping
                && (distance > max_distance || next == head)
            {
                break;
            }
            if food.is_none() && self.food() == Some(next) {
                food = Some(inverse(distance));
            }
            if body.is_none() && self.is_occupied(next) {
                body = Some(inverse(distance));
            }
            pos = next;
            distance += 1;
        }
        [wall, food.unwrap_or(0.0), body.unwrap_or(0.0)]
    }
}

#[expect(clippy::cast_precision_loss)]
fn inverse(distance: usize) -> f64 {
    1.0 / distance as f64
}
