//! Neuroevolution of snake-playing networks using a genetic algorithm.
//!
//! Networks are never trained by gradient descent. A population of fixed-topology
//! networks plays seeded episodes, the fitter ones are selected, and the next
//! generation is bred from them through crossover and mutation.
//!
//! # How Training Works
//!
//! 1. **Population** - Create random networks sharing one topology, or mutated copies of
//!    a previously saved network when resuming
//! 2. **Evaluation** - Every genome plays the same seeded episodes in parallel
//! 3. **Fitness** - The evaluator averages a per-episode fitness over the episodes
//! 4. **Selection** - Elites survive unchanged, parents are picked by tournament
//! 5. **Reproduction** - Crossover and mutation adapt to parent distance and population
//!    diversity
//! 6. **Repeat** - Continue for the configured number of generations
//!
//! # Architecture
//!
//! ```text
//! EvolutionEngine
//!     ↓ evolves
//! Population (Genome = NetworkModel + fitness)
//!     ↓ evaluated in parallel by
//! FitnessEvaluator (snevo-evaluator)
//!     ↓ produces
//! GenerationReport (FitnessStats, diversity, best so far)
//! ```
//!
//! See the [`genetic`] module for the generation cycle and its parameters.
//!
//! # Current Limitations
//!
//! - **Fixed topology**: Networks never grow or lose neurons during evolution
//! - **Single process**: Parallelism is limited to the threads of one machine
//! - **Noisy fitness**: A handful of episodes per generation gives a noisy estimate, so
//!   the current best genome may score lower than an earlier one

pub use self::{
    genetic::{
        ConfigError, EvolutionEngine, EvolutionParams, GenerationReport, TrainingError,
    },
    genome::Genome,
    population::{Population, worker_count},
    stats::FitnessStats,
};

pub mod genetic;
mod genome;
mod population;
mod stats;
