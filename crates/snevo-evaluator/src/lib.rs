//! Fitness evaluation of networks by playing snake episodes.
//!
//! This crate connects the two halves of the system: networks from
//! `snevo-network` drive games from `snevo-engine`, and episode outcomes are
//! turned into a single fitness scalar for the genetic algorithm.
//!
//! # Architecture
//!
//! ```text
//! FitnessEvaluator (mean fitness over seeded episodes)
//!     ↓ plays episodes with
//! NetworkDecider (forward pass + argmax per tick)
//!     ↓ outcomes scored by
//! ScoreOutcome (ShapedFitness / ScoreFitness)
//! ```
//!
//! - [`network_decider`] - Maps network outputs to directions
//! - [`outcome_fitness`] - Fitness functions over one episode outcome
//! - [`episode_evaluator`] - Multi-episode evaluation shared by training workers
//!
//! # Example
//!
//! ```
//! use std::num::NonZeroUsize;
//! use snevo_engine::{BoardConfig, EdgePolicy, StateEncoding};
//! use snevo_evaluator::{EpisodeEvaluator, FitnessEvaluator, ShapedFitness};
//! use snevo_network::{Activation, NetworkModel};
//!
//! let cap = NonZeroUsize::new(100).unwrap();
//! let board = BoardConfig::new(20, 20, EdgePolicy::Walled, cap, 3).unwrap();
//! let evaluator = EpisodeEvaluator::new(board, StateEncoding::Compact, ShapedFitness::new());
//!
//! let network = NetworkModel::zeros(&[14, 16, 16, 4], Activation::Relu).unwrap();
//! let fitness = evaluator.evaluate(&network, &[1, 2, 3, 4, 5]).unwrap();
//! assert!(fitness > 0.0);
//! ```

pub use self::{
    episode_evaluator::{EpisodeEvaluator, FitnessEvaluator},
    network_decider::{NetworkDecider, argmax},
    outcome_fitness::{FitnessKind, ScoreFitness, ScoreOutcome, ShapedFitness},
};

pub mod episode_evaluator;
pub mod network_decider;
pub mod outcome_fitness;
