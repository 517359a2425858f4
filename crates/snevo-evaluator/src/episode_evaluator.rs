//! Multi-episode fitness evaluation of a network.

use std::fmt;

use snevo_engine::{BoardConfig, SimulationOutcome, SnakeGame, StateEncoding, run_episode};
use snevo_network::{NetworkError, NetworkModel};

use crate::{NetworkDecider, ScoreOutcome};

/// Computes the fitness of a network over a set of seeded episodes.
///
/// Used by the genetic algorithm; implementations must be shareable across
/// evaluation workers.
pub trait FitnessEvaluator: fmt::Debug + Send + Sync {
    /// Plays one episode per seed and returns the mean fitness.
    ///
    /// An empty seed list yields a fitness of zero.
    fn evaluate(&self, network: &NetworkModel, seeds: &[u64]) -> Result<f64, NetworkError>;
}

/// Plays episodes on a fixed board and scores them with `S`.
#[derive(Debug, Clone)]
pub struct EpisodeEvaluator<S> {
    board: BoardConfig,
    encoding: StateEncoding,
    scorer: S,
}

impl<S> EpisodeEvaluator<S> {
    pub fn new(board: BoardConfig, encoding: StateEncoding, scorer: S) -> Self {
        Self {
            board,
            encoding,
            scorer,
        }
    }

    #[must_use]
    pub fn board(&self) -> &BoardConfig {
        &self.board
    }

    #[must_use]
    pub fn encoding(&self) -> StateEncoding {
        self.encoding
    }

    #[must_use]
    pub fn scorer(&self) -> &S {
        &self.scorer
    }

    /// Plays a single episode with `network` on a board seeded by `seed`.
    pub fn play(
        &self,
        network: &NetworkModel,
        seed: u64,
    ) -> Result<SimulationOutcome, NetworkError> {
        let mut decider = NetworkDecider::new(network)?;
        let mut game = SnakeGame::new(self.board, seed);
        run_episode(&mut game, self.encoding, &mut decider)
    }
}

impl<S> FitnessEvaluator for EpisodeEvaluator<S>
where
    S: ScoreOutcome,
{
    #[expect(clippy::cast_precision_loss)]
    fn evaluate(&self, network: &NetworkModel, seeds: &[u64]) -> Result<f64, NetworkError> {
        if seeds.is_empty() {
            return Ok(0.0);
        }
        let mut total_fitness = 0.0;
        for &seed in seeds {
            let outcome = self.play(network, seed)?;
            total_fitness += self.scorer.score_outcome(&outcome);
        }
        Ok(total_fitness / seeds.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroUsize;

    use rand::SeedableRng as _;
    use rand_pcg::Pcg64;
    use snevo_engine::EdgePolicy;
    use snevo_network::Activation;

    use super::*;
    use crate::{ScoreFitness, ShapedFitness};

    fn board() -> BoardConfig {
        let cap = NonZeroUsize::new(50).unwrap();
        BoardConfig::new(10, 10, EdgePolicy::Walled, cap, 3).unwrap()
    }

    #[test]
    fn test_zero_network_goes_up_into_the_wall() {
        let evaluator = EpisodeEvaluator::new(board(), StateEncoding::Minimal, ScoreFitness::new());
        let network = NetworkModel::zeros(&[6, 8, 4], Activation::Relu).unwrap();
        let outcome = evaluator.play(&network, 3).unwrap();
        // Every output ties, so the decider always answers `Up`: y = 5 -> 0, then the wall.
        assert_eq!(outcome.steps_survived, 6);
        assert_eq!(
            outcome.cause,
            Some(snevo_engine::TerminationCause::WallCollision)
        );
    }

    #[test]
    fn test_mean_over_episodes() {
        let evaluator =
            EpisodeEvaluator::new(board(), StateEncoding::Compact, ShapedFitness::new());
        let network =
            NetworkModel::random(&[14, 8, 4], Activation::Relu, &mut Pcg64::seed_from_u64(8))
                .unwrap();
        let seeds = [1, 2, 3];
        let mean = evaluator.evaluate(&network, &seeds).unwrap();
        let expected = seeds
            .iter()
            .map(|&s| {
                let outcome = evaluator.play(&network, s).unwrap();
                ShapedFitness::new().score_outcome(&outcome)
            })
            .sum::<f64>()
            / 3.0;
        assert!((mean - expected).abs() < 1e-9);
    }

    #[test]
    fn test_evaluation_is_deterministic() {
        let evaluator = EpisodeEvaluator::new(board(), StateEncoding::Vision, ShapedFitness::new());
        let network =
            NetworkModel::random(&[28, 8, 4], Activation::Tanh, &mut Pcg64::seed_from_u64(1))
                .unwrap();
        let a = evaluator.evaluate(&network, &[10, 20, 30, 40]).unwrap();
        let b = evaluator.evaluate(&network, &[10, 20, 30, 40]).unwrap();
        assert_eq!(a.to_bits(), b.to_bits());
        assert_eq!(evaluator.evaluate(&network, &[]).unwrap(), 0.0);
    }

    #[test]
    fn test_mismatched_encoding_is_an_error() {
        let evaluator = EpisodeEvaluator::new(board(), StateEncoding::Compact, ScoreFitness::new());
        let network = NetworkModel::zeros(&[6, 8, 4], Activation::Relu).unwrap();
        assert!(matches!(
            evaluator.evaluate(&network, &[1]),
            Err(NetworkError::DimensionMismatch { .. })
        ));
    }
}
