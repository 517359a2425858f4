use std::{num::NonZeroUsize, path::{Path, PathBuf}};

use anyhow::{Context as _, bail, ensure};
use serde::{Deserialize, Serialize};
use snevo_engine::{BoardConfig, Direction, EdgePolicy, StateEncoding};
use snevo_evaluator::{
    EpisodeEvaluator, FitnessEvaluator, FitnessKind, ScoreFitness, ScoreOutcome, ShapedFitness,
};
use snevo_network::Activation;
use snevo_training::EvolutionParams;

use crate::util;

/// Settings of a training run, read from a JSON file.
///
/// Missing fields take their default values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub population_size: usize,
    pub layer_sizes: Vec<usize>,
    pub hidden_activation: Activation,
    pub mutation_rate: f64,
    pub mutation_strength: f64,
    pub crossover_rate: f64,
    pub elite_count: usize,
    pub tournament_size: usize,
    pub generations: usize,
    pub episodes_per_evaluation: usize,
    pub max_steps_without_food: usize,
    pub board_width: usize,
    pub board_height: usize,
    pub edge_policy: EdgePolicy,
    pub state_encoding: StateEncoding,
    pub initial_length: usize,
    pub fitness: FitnessKind,
    /// Seed of the training run; a random seed is drawn when absent.
    pub seed: Option<u64>,
    /// Generations between checkpoints of the best genome.
    pub save_interval: usize,
    pub output_dir: PathBuf,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        let params = EvolutionParams::default();
        Self {
            population_size: params.population_size,
            layer_sizes: params.layer_sizes,
            hidden_activation: params.hidden_activation,
            mutation_rate: params.mutation_rate,
            mutation_strength: params.mutation_strength,
            crossover_rate: params.crossover_rate,
            elite_count: params.elite_count,
            tournament_size: params.tournament_size,
            generations: 100,
            episodes_per_evaluation: params.episodes_per_evaluation,
            max_steps_without_food: 100,
            board_width: 20,
            board_height: 20,
            edge_policy: EdgePolicy::Walled,
            state_encoding: StateEncoding::Compact,
            initial_length: 3,
            fitness: FitnessKind::Shaped,
            seed: None,
            save_interval: 10,
            output_dir: PathBuf::from("output"),
        }
    }
}

impl TrainingConfig {
    /// Reads the configuration at `path`, or the defaults when no path is given.
    pub fn load_or_default(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => util::read_json_file("configuration", path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let (Some(&input), Some(&output)) = (self.layer_sizes.first(), self.layer_sizes.last())
        else {
            bail!("layer_sizes must not be empty");
        };
        ensure!(
            input == self.state_encoding.width(),
            "input layer has {input} neurons but the {} encoding produces {} values",
            self.state_encoding,
            self.state_encoding.width()
        );
        ensure!(
            output == Direction::ALL.len(),
            "output layer has {output} neurons, expected {}",
            Direction::ALL.len()
        );
        ensure!(self.save_interval > 0, "save_interval must be positive");
        self.evolution_params()
            .validate()
            .context("Invalid evolution parameters")?;
        self.board_config()?;
        Ok(())
    }

    #[must_use]
    pub fn evolution_params(&self) -> EvolutionParams {
        EvolutionParams {
            population_size: self.population_size,
            layer_sizes: self.layer_sizes.clone(),
            hidden_activation: self.hidden_activation,
            mutation_rate: self.mutation_rate,
            mutation_strength: self.mutation_strength,
            crossover_rate: self.crossover_rate,
            elite_count: self.elite_count,
            tournament_size: self.tournament_size,
            episodes_per_evaluation: self.episodes_per_evaluation,
            ..EvolutionParams::default()
        }
    }

    pub fn board_config(&self) -> anyhow::Result<BoardConfig> {
        let cap = NonZeroUsize::new(self.max_steps_without_food)
            .context("max_steps_without_food must be positive")?;
        let board = BoardConfig::new(
            self.board_width,
            self.board_height,
            self.edge_policy,
            cap,
            self.initial_length,
        )
        .context("Invalid board configuration")?;
        Ok(board)
    }

    #[must_use]
    pub fn scorer(&self) -> Box<dyn ScoreOutcome> {
        match self.fitness {
            FitnessKind::Shaped => Box::new(ShapedFitness::new()),
            FitnessKind::Score => Box::new(ScoreFitness::new()),
        }
    }

    pub fn evaluator(&self) -> anyhow::Result<Box<dyn FitnessEvaluator>> {
        let board = self.board_config()?;
        let encoding = self.state_encoding;
        let evaluator: Box<dyn FitnessEvaluator> = match self.fitness {
            FitnessKind::Shaped => Box::new(EpisodeEvaluator::new(
                board,
                encoding,
                ShapedFitness::new(),
            )),
            FitnessKind::Score => {
                Box::new(EpisodeEvaluator::new(board, encoding, ScoreFitness::new()))
            }
        };
        Ok(evaluator)
    }
}
