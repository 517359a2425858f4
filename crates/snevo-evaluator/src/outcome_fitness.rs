//! Fitness functions over a single episode outcome.
//!
//! # Shaped Fitness
//!
//! ```text
//! fitness = base^score
//!         + survival_weight × sqrt(steps)
//!         + efficiency_weight × score / steps
//!         + exploration_weight × visited_cells / board_cells
//!         + proximity_weight / food_distance      (only when food_distance > 0)
//!
//! fitness × short_episode_factor                  when steps < short_episode_steps
//! ```
//!
//! The exponential score term dominates as soon as the snake eats, while the
//! continuous terms still separate genomes that never eat: a zero-score network
//! that survives and explores ranks above one that dies on the first ticks.
//!
//! The score term is capped at [`MAX_SCORE_TERM`], so fitness stays finite on
//! very large boards; scores past the cap (about 498 with the default base) are
//! no longer told apart by that term.
//!
//! # Score Fitness
//!
//! ```text
//! fitness = score_weight × score + step_weight × steps
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use snevo_engine::SimulationOutcome;

/// Upper bound of the exponential score term of [`ShapedFitness`].
pub const MAX_SCORE_TERM: f64 = 1e300;

/// Scores one episode outcome. Higher is better.
pub trait ScoreOutcome: fmt::Debug + Send + Sync {
    fn score_outcome(&self, outcome: &SimulationOutcome) -> f64;
}

/// Fitness function selector used in configuration files.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitnessKind {
    #[default]
    Shaped,
    Score,
}

/// Reward-shaped fitness with exponential score, survival, efficiency,
/// exploration and proximity terms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapedFitness {
    pub score_base: f64,
    pub survival_weight: f64,
    pub efficiency_weight: f64,
    pub exploration_weight: f64,
    pub proximity_weight: f64,
    pub short_episode_steps: usize,
    pub short_episode_factor: f64,
}

impl Default for ShapedFitness {
    fn default() -> Self {
        Self::new()
    }
}

impl ShapedFitness {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            score_base: 4.0,
            survival_weight: 0.5,
            efficiency_weight: 100.0,
            exploration_weight: 50.0,
            proximity_weight: 10.0,
            short_episode_steps: 10,
            short_episode_factor: 0.5,
        }
    }
}

impl ScoreOutcome for ShapedFitness {
    #[expect(clippy::cast_precision_loss)]
    fn score_outcome(&self, outcome: &SimulationOutcome) -> f64 {
        let score = outcome.score as f64;
        let steps = outcome.steps_survived as f64;

        let mut fitness = self.score_base.powf(score).min(MAX_SCORE_TERM);
        fitness += self.survival_weight * steps.sqrt();
        if outcome.steps_survived > 0 {
            fitness += self.efficiency_weight * score / steps;
        }
        if outcome.board_cells > 0 {
            fitness +=
                self.exploration_weight * outcome.cells_visited as f64 / outcome.board_cells as f64;
        }
        if outcome.final_food_distance > 0.0 {
            fitness += self.proximity_weight / outcome.final_food_distance;
        }
        if outcome.steps_survived < self.short_episode_steps {
            fitness *= self.short_episode_factor;
        }
        fitness
    }
}

/// Plain score-and-survival fitness.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreFitness {
    pub score_weight: f64,
    pub step_weight: f64,
}

impl Default for ScoreFitness {
    fn default() -> Self {
        Self::new()
    }
}

impl ScoreFitness {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            score_weight: 10.0,
            step_weight: 0.01,
        }
    }
}

impl ScoreOutcome for ScoreFitness {
    #[expect(clippy::cast_precision_loss)]
    fn score_outcome(&self, outcome: &SimulationOutcome) -> f64 {
        self.score_weight * outcome.score as f64 + self.step_weight * outcome.steps_survived as f64
    }
}
