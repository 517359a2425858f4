//! Generational genetic algorithm over fixed-topology networks.
//!
//! # Generation Cycle
//!
//! 1. **Evaluating** - Every genome plays the same freshly drawn episode seeds in
//!    parallel and receives the mean fitness
//! 2. **Selecting** - The population is sorted by fitness and its diversity is
//!    estimated from randomly sampled genome pairs
//! 3. **Recombining / Mutating** - Elites are copied unchanged; the rest of the next
//!    generation is bred from tournament-selected parents
//! 4. **Replaced** - The next generation, built in a separate container, becomes the
//!    current population
//!
//! # Adaptive Reproduction
//!
//! For every pair of parents:
//!
//! ```text
//! crossover_probability = min(crossover_rate × (1 + parent_distance), max_crossover_probability)
//! ```
//!
//! - With crossover, both children are mutated at `mutation_rate`, doubled when the
//!   population diversity is below `low_diversity_threshold`.
//! - Without crossover, both parents are cloned and mutated at 1.5 × `mutation_rate`.
//!
//! Surplus second children are discarded once the population is full.
//!
//! # Determinism
//!
//! The engine owns a seeded [`Pcg64`]. Episode seeds are drawn from it before the
//! parallel phase and every worker writes only its own genomes, so a run is
//! reproducible regardless of thread scheduling.

use log::{debug, info};
use rand::{Rng, SeedableRng as _};
use rand_pcg::Pcg64;
use snevo_evaluator::FitnessEvaluator;
use snevo_network::{Activation, NetworkError};

use crate::{FitnessStats, Genome, Population};

/// Mutation rate multiplier for clones produced without crossover.
const CLONE_MUTATION_FACTOR: f64 = 1.5;
/// Mutation rate multiplier applied to crossover children when diversity is low.
const LOW_DIVERSITY_MUTATION_FACTOR: f64 = 2.0;

/// Invalid evolution configuration, detected before any generation runs.
#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum ConfigError {
    #[display("population size must be positive")]
    EmptyPopulation,
    #[display("elite count {elite_count} must be smaller than population size {population_size}")]
    EliteCountTooLarge {
        elite_count: usize,
        population_size: usize,
    },
    #[display("invalid topology {layer_sizes:?}: need at least two layers of positive width")]
    InvalidTopology { layer_sizes: Vec<usize> },
    #[display("population has {actual} genomes, expected {expected}")]
    PopulationSizeMismatch { expected: usize, actual: usize },
    #[display("tournament size must be positive")]
    ZeroTournamentSize,
    #[display("episodes per evaluation must be positive")]
    ZeroEpisodes,
    #[display("mutation strength must be finite and non-negative, got {value}")]
    InvalidMutationStrength { value: f64 },
    #[display("{name} must be within [0, 1], got {value}")]
    RateOutOfRange { name: &'static str, value: f64 },
}

/// Errors raised while running the genetic algorithm.
#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum TrainingError {
    #[display("invalid configuration: {_0}")]
    Config(ConfigError),
    #[display("network error: {_0}")]
    Network(NetworkError),
    #[display("population must be evaluated before it can evolve")]
    NotEvaluated,
}

impl From<ConfigError> for TrainingError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

impl From<NetworkError> for TrainingError {
    fn from(err: NetworkError) -> Self {
        Self::Network(err)
    }
}

/// Parameters of the genetic algorithm.
#[derive(Debug, Clone, PartialEq)]
pub struct EvolutionParams {
    pub population_size: usize,
    pub layer_sizes: Vec<usize>,
    pub hidden_activation: Activation,
    /// Per-scalar mutation probability.
    pub mutation_rate: f64,
    /// Scale of the normal perturbation added by mutation.
    pub mutation_strength: f64,
    pub crossover_rate: f64,
    /// Number of best genomes copied unchanged into the next generation.
    pub elite_count: usize,
    pub tournament_size: usize,
    pub diversity_sample_pairs: usize,
    pub low_diversity_threshold: f64,
    pub max_crossover_probability: f64,
    pub episodes_per_evaluation: usize,
}

impl Default for EvolutionParams {
    fn default() -> Self {
        Self {
            population_size: 100,
            layer_sizes: vec![14, 16, 16, 4],
            hidden_activation: Activation::Relu,
            mutation_rate: 0.1,
            mutation_strength: 1.0,
            crossover_rate: 0.7,
            elite_count: 5,
            tournament_size: 3,
            diversity_sample_pairs: 1000,
            low_diversity_threshold: 0.1,
            max_crossover_probability: 0.95,
            episodes_per_evaluation: 5,
        }
    }
}

impl EvolutionParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.population_size == 0 {
            return Err(ConfigError::EmptyPopulation);
        }
        if self.elite_count >= self.population_size {
            return Err(ConfigError::EliteCountTooLarge {
                elite_count: self.elite_count,
                population_size: self.population_size,
            });
        }
        if self.layer_sizes.len() < 2 || self.layer_sizes.contains(&0) {
            return Err(ConfigError::InvalidTopology {
                layer_sizes: self.layer_sizes.clone(),
            });
        }
        if self.tournament_size == 0 {
            return Err(ConfigError::ZeroTournamentSize);
        }
        if self.episodes_per_evaluation == 0 {
            return Err(ConfigError::ZeroEpisodes);
        }
        if !self.mutation_strength.is_finite() || self.mutation_strength < 0.0 {
            return Err(ConfigError::InvalidMutationStrength {
                value: self.mutation_strength,
            });
        }
        for (name, value) in [
            ("mutation_rate", self.mutation_rate),
            ("crossover_rate", self.crossover_rate),
            ("max_crossover_probability", self.max_crossover_probability),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::RateOutOfRange { name, value });
            }
        }
        Ok(())
    }

    /// Returns the probability of recombining two parents `distance` apart.
    ///
    /// Distant parents are recombined more often, up to
    /// `max_crossover_probability`.
    #[must_use]
    pub fn crossover_probability(&self, distance: f64) -> f64 {
        (self.crossover_rate * (1.0 + distance)).min(self.max_crossover_probability)
    }

    /// Returns the mutation rates of crossover children and of cloned parents,
    /// in that order, for a population with the given diversity.
    #[must_use]
    pub fn child_mutation_rates(&self, diversity: f64) -> (f64, f64) {
        let mut crossover = self.mutation_rate;
        if diversity < self.low_diversity_threshold {
            crossover *= LOW_DIVERSITY_MUTATION_FACTOR;
        }
        (crossover, self.mutation_rate * CLONE_MUTATION_FACTOR)
    }
}

/// Summary of one evaluated generation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationReport {
    pub generation: usize,
    pub fitness: FitnessStats,
    pub diversity: f64,
    /// Highest fitness observed in any generation so far.
    pub best_so_far: f64,
}

/// Drives the evaluate/evolve cycle of a population.
///
/// # Example
///
/// ```
/// use std::num::NonZeroUsize;
/// use snevo_engine::{BoardConfig, EdgePolicy, StateEncoding};
/// use snevo_evaluator::{EpisodeEvaluator, ShapedFitness};
/// use snevo_training::{EvolutionEngine, EvolutionParams};
///
/// let params = EvolutionParams {
///     population_size: 10,
///     layer_sizes: vec![6, 8, 4],
///     elite_count: 1,
///     episodes_per_evaluation: 2,
///     ..EvolutionParams::default()
/// };
/// let cap = NonZeroUsize::new(50).unwrap();
/// let board = BoardConfig::new(10, 10, EdgePolicy::Walled, cap, 3).unwrap();
/// let evaluator = EpisodeEvaluator::new(board, StateEncoding::Minimal, ShapedFitness::new());
///
/// let mut engine = EvolutionEngine::new(params, 42).unwrap();
/// for _ in 0..3 {
///     let report = engine.step(&evaluator).unwrap();
///     assert!(report.best_so_far >= report.fitness.best);
/// }
/// assert_eq!(engine.generation(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct EvolutionEngine {
    params: EvolutionParams,
    rng: Pcg64,
    population: Population,
    generation: usize,
    diversity: Option<f64>,
    best: Option<Genome>,
}

impl EvolutionEngine {
    /// Creates an engine with a random initial population.
    pub fn new(params: EvolutionParams, seed: u64) -> Result<Self, TrainingError> {
        params.validate()?;
        let mut rng = Pcg64::seed_from_u64(seed);
        let population = Population::random(
            params.population_size,
            &params.layer_sizes,
            params.hidden_activation,
            &mut rng,
        )?;
        Ok(Self::from_parts(params, rng, population))
    }

    /// Creates an engine starting from an existing population.
    ///
    /// The population must match the configured size and topology.
    pub fn with_population(
        params: EvolutionParams,
        population: Population,
        seed: u64,
    ) -> Result<Self, TrainingError> {
        params.validate()?;
        if population.len() != params.population_size {
            return Err(ConfigError::PopulationSizeMismatch {
                expected: params.population_size,
                actual: population.len(),
            }
            .into());
        }
        if let Some(genome) = population.genomes().first() {
            let found = genome.network().layer_sizes();
            if found != params.layer_sizes {
                return Err(NetworkError::ArchitectureMismatch {
                    expected: params.layer_sizes.clone(),
                    found: found.to_vec(),
                }
                .into());
            }
        }
        Ok(Self::from_parts(
            params,
            Pcg64::seed_from_u64(seed),
            population,
        ))
    }

    fn from_parts(params: EvolutionParams, rng: Pcg64, population: Population) -> Self {
        Self {
            params,
            rng,
            population,
            generation: 0,
            diversity: None,
            best: None,
        }
    }

    #[must_use]
    pub fn params(&self) -> &EvolutionParams {
        &self.params
    }

    #[must_use]
    pub fn population(&self) -> &Population {
        &self.population
    }

    /// Returns the number of completed generations.
    #[must_use]
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Returns the best genome observed in any evaluated generation.
    #[must_use]
    pub fn best(&self) -> Option<&Genome> {
        self.best.as_ref()
    }

    /// Evaluates the current population and measures its diversity.
    pub fn evaluate<E>(&mut self, evaluator: &E) -> Result<GenerationReport, TrainingError>
    where
        E: FitnessEvaluator + ?Sized,
    {
        debug!("generation {}: evaluating", self.generation);
        let seeds = (0..self.params.episodes_per_evaluation)
            .map(|_| self.rng.random::<u64>())
            .collect::<Vec<_>>();
        self.population.evaluate_parallel(evaluator, &seeds)?;

        debug!("generation {}: selecting", self.generation);
        self.population.sort_by_fitness();
        let diversity = self
            .population
            .diversity(self.params.diversity_sample_pairs, &mut self.rng)?;
        self.diversity = Some(diversity);

        if let Some(current) = self.population.best()
            && self
                .best
                .as_ref()
                .is_none_or(|best| current.fitness() > best.fitness())
        {
            self.best = Some(current.clone());
        }

        let fitness = self
            .population
            .fitness_stats()
            .ok_or(ConfigError::EmptyPopulation)?;
        let best_so_far = self
            .best
            .as_ref()
            .map_or(fitness.best, Genome::fitness)
            .max(fitness.best);
        let report = GenerationReport {
            generation: self.generation,
            fitness,
            diversity,
            best_so_far,
        };
        info!(
            "generation {}: best {:.4}, mean {:.4}, diversity {:.4}, best so far {:.4}",
            report.generation, fitness.best, fitness.mean, diversity, best_so_far
        );
        Ok(report)
    }

    /// Replaces the evaluated population with the next generation.
    pub fn evolve(&mut self) -> Result<(), TrainingError> {
        let Some(diversity) = self.diversity.take() else {
            return Err(TrainingError::NotEvaluated);
        };
        let params = &self.params;
        let current = self.population.genomes();
        let size = params.population_size;

        debug!(
            "generation {}: recombining (diversity {diversity:.4})",
            self.generation
        );
        let mut next = Vec::with_capacity(size);
        next.extend(current[..params.elite_count].iter().cloned());

        let (crossover_mutation_rate, clone_mutation_rate) =
            params.child_mutation_rates(diversity);

        while next.len() < size {
            let p1 = tournament_select(current, params.tournament_size, &mut self.rng);
            let p2 = tournament_select(current, params.tournament_size, &mut self.rng);

            let distance = p1.network().parameter_distance(p2.network())?;
            let crossover_probability = params.crossover_probability(distance);

            let (mut c1, mut c2, rate) = if self.rng.random_bool(crossover_probability) {
                let (c1, c2) = p1.network().crossover(p2.network(), &mut self.rng)?;
                (c1, c2, crossover_mutation_rate)
            } else {
                (
                    p1.network().clone(),
                    p2.network().clone(),
                    clone_mutation_rate,
                )
            };
            c1.mutate(rate, params.mutation_strength, &mut self.rng);
            c2.mutate(rate, params.mutation_strength, &mut self.rng);

            next.push(Genome::new(c1));
            if next.len() < size {
                next.push(Genome::new(c2));
            }
        }

        self.population = Population::from_genomes(next)?;
        self.generation += 1;
        debug!("generation {}: replaced", self.generation);
        Ok(())
    }

    /// Runs [`evaluate`](Self::evaluate) followed by [`evolve`](Self::evolve).
    pub fn step<E>(&mut self, evaluator: &E) -> Result<GenerationReport, TrainingError>
    where
        E: FitnessEvaluator + ?Sized,
    {
        let report = self.evaluate(evaluator)?;
        self.evolve()?;
        Ok(report)
    }
}

/// Selects a parent by tournament.
///
/// Draws `tournament_size` indices uniformly with replacement and returns the
/// candidate with the highest fitness; the earliest drawn wins ties.
fn tournament_select<'a, R>(genomes: &'a [Genome], tournament_size: usize, rng: &mut R) -> &'a Genome
where
    R: Rng + ?Sized,
{
    assert!(tournament_size > 0 && !genomes.is_empty());
    let mut best = &genomes[rng.random_range(0..genomes.len())];
    for _ in 1..tournament_size {
        let candidate = &genomes[rng.random_range(0..genomes.len())];
        if candidate.fitness() > best.fitness() {
            best = candidate;
        }
    }
    best
}
