use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use snevo_engine::{EdgePolicy, StateEncoding};
use snevo_evaluator::FitnessKind;
use snevo_network::Activation;

use crate::{config::TrainingConfig, util};

/// Metadata written next to a trained network.
///
/// The network file stores only topology and parameters; this record keeps the
/// settings needed to play it again.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct NetworkSummary {
    pub name: String,
    pub trained_at: DateTime<Utc>,
    pub final_fitness: f64,
    pub generations: usize,
    pub layer_sizes: Vec<usize>,
    pub hidden_activation: Activation,
    pub state_encoding: StateEncoding,
    pub edge_policy: EdgePolicy,
    pub board_width: usize,
    pub board_height: usize,
    pub max_steps_without_food: usize,
    pub initial_length: usize,
    pub fitness: FitnessKind,
    pub seed: u64,
}

impl NetworkSummary {
    pub fn open<P>(path: P) -> anyhow::Result<Self>
    where
        P: AsRef<Path>,
    {
        util::read_json_file("network summary", path)
    }

    /// Copies the game and network settings recorded here into `config`.
    pub fn apply_to(&self, config: &mut TrainingConfig) {
        config.layer_sizes.clone_from(&self.layer_sizes);
        config.hidden_activation = self.hidden_activation;
        config.state_encoding = self.state_encoding;
        config.edge_policy = self.edge_policy;
        config.board_width = self.board_width;
        config.board_height = self.board_height;
        config.max_steps_without_food = self.max_steps_without_food;
        config.initial_length = self.initial_length;
        config.fitness = self.fitness;
    }
}
