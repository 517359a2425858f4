use std::{num::NonZeroUsize, panic, thread};

use log::debug;
use rand::Rng;
use snevo_evaluator::FitnessEvaluator;
use snevo_network::{Activation, NetworkError, NetworkModel};

use crate::{FitnessStats, Genome};

/// Worker count used when the hardware concurrency cannot be queried.
const FALLBACK_WORKERS: usize = 4;

/// Returns the number of evaluation workers.
#[must_use]
pub fn worker_count() -> usize {
    thread::available_parallelism().map_or(FALLBACK_WORKERS, NonZeroUsize::get)
}

/// The set of genomes evaluated and evolved together.
///
/// All genomes share one topology.
#[derive(Debug, Clone)]
pub struct Population {
    genomes: Vec<Genome>,
}

impl Population {
    /// Creates `size` genomes with randomly initialised networks.
    pub fn random<R>(
        size: usize,
        layer_sizes: &[usize],
        hidden_activation: Activation,
        rng: &mut R,
    ) -> Result<Self, NetworkError>
    where
        R: Rng + ?Sized,
    {
        let genomes = (0..size)
            .map(|_| Genome::random(layer_sizes, hidden_activation, rng))
            .collect::<Result<_, _>>()?;
        Ok(Self { genomes })
    }

    /// Builds a population around a previously trained network.
    ///
    /// The first genome is `seed` itself; the others are copies of it mutated
    /// with `mutation_rate` and `mutation_strength`.
    pub fn from_seed_network<R>(
        seed: NetworkModel,
        size: usize,
        mutation_rate: f64,
        mutation_strength: f64,
        rng: &mut R,
    ) -> Self
    where
        R: Rng + ?Sized,
    {
        let mut genomes = Vec::with_capacity(size);
        for _ in 1..size {
            let mut network = seed.clone();
            network.mutate(mutation_rate, mutation_strength, rng);
            genomes.push(Genome::new(network));
        }
        if size > 0 {
            genomes.insert(0, Genome::new(seed));
        }
        Self { genomes }
    }

    /// Wraps existing genomes, which must share one topology.
    pub fn from_genomes(genomes: Vec<Genome>) -> Result<Self, NetworkError> {
        if let Some((first, rest)) = genomes.split_first() {
            let expected = first.network().layer_sizes();
            if let Some(other) = rest
                .iter()
                .find(|g| g.network().layer_sizes() != expected)
            {
                return Err(NetworkError::ArchitectureMismatch {
                    expected: expected.to_vec(),
                    found: other.network().layer_sizes().to_vec(),
                });
            }
        }
        Ok(Self { genomes })
    }

    #[must_use]
    pub fn genomes(&self) -> &[Genome] {
        &self.genomes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.genomes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.genomes.is_empty()
    }

    /// Returns the genome with the highest fitness, ignoring `NaN` fitness.
    #[must_use]
    pub fn best(&self) -> Option<&Genome> {
        self.genomes
            .iter()
            .filter(|g| !g.fitness().is_nan())
            .max_by(|a, b| a.fitness().total_cmp(&b.fitness()))
    }

    /// Sorts genomes by fitness, best first; `NaN` fitness sorts last.
    pub fn sort_by_fitness(&mut self) {
        self.genomes.sort_by(|a, b| {
            match (a.fitness().is_nan(), b.fitness().is_nan()) {
                (false, false) => b.fitness().total_cmp(&a.fitness()),
                (a_nan, b_nan) => a_nan.cmp(&b_nan),
            }
        });
    }

    #[must_use]
    pub fn fitness_stats(&self) -> Option<FitnessStats> {
        FitnessStats::new(self.genomes.iter().map(Genome::fitness))
    }

    /// Estimates population diversity from `sample_pairs` random genome pairs.
    ///
    /// Each pair contributes the mean absolute difference of its parameters. Pairs
    /// that draw the same genome twice are skipped, so fewer than `sample_pairs`
    /// distances may be averaged. Populations with fewer than two genomes have a
    /// diversity of zero.
    pub fn diversity<R>(&self, sample_pairs: usize, rng: &mut R) -> Result<f64, NetworkError>
    where
        R: Rng + ?Sized,
    {
        let n = self.genomes.len();
        if n < 2 {
            return Ok(0.0);
        }
        let mut total_distance = 0.0;
        let mut count = 0_usize;
        for _ in 0..sample_pairs {
            let i = rng.random_range(0..n);
            let j = rng.random_range(0..n);
            if i == j {
                continue;
            }
            total_distance += self.genomes[i]
                .network()
                .parameter_distance(self.genomes[j].network())?;
            count += 1;
        }
        if count == 0 {
            return Ok(0.0);
        }
        #[expect(clippy::cast_precision_loss)]
        let count = count as f64;
        Ok(total_distance / count)
    }

    /// Evaluates the fitness of every genome in parallel.
    ///
    /// The genomes are split into at most [`worker_count`] disjoint chunks, one
    /// scoped thread each. Every genome plays one episode per seed.
    pub fn evaluate_parallel<E>(&mut self, evaluator: &E, seeds: &[u64]) -> Result<(), NetworkError>
    where
        E: FitnessEvaluator + ?Sized,
    {
        if self.genomes.is_empty() {
            return Ok(());
        }
        let workers = worker_count().min(self.genomes.len());
        let chunk_size = self.genomes.len().div_ceil(workers);
        debug!(
            "evaluating {} genomes on {workers} workers ({chunk_size} per worker, {} episodes each)",
            self.genomes.len(),
            seeds.len()
        );

        thread::scope(|s| {
            let handles = self
                .genomes
                .chunks_mut(chunk_size)
                .map(|chunk| {
                    s.spawn(move || -> Result<(), NetworkError> {
                        for genome in chunk {
                            let fitness = evaluator.evaluate(genome.network(), seeds)?;
                            genome.set_fitness(fitness);
                        }
                        Ok(())
                    })
                })
                .collect::<Vec<_>>();
            handles.into_iter().try_for_each(|handle| {
                handle
                    .join()
                    .unwrap_or_else(|payload| panic::resume_unwind(payload))
            })
        })
    }
}
