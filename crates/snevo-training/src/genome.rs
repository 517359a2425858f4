use rand::Rng;
use snevo_network::{Activation, NetworkError, NetworkModel};

/// A network together with its most recently computed fitness.
///
/// Every genome exclusively owns its network; recombination always produces
/// fresh networks.
#[derive(Debug, Clone, PartialEq)]
pub struct Genome {
    network: NetworkModel,
    fitness: f64,
}

impl Genome {
    /// Wraps `network` with a fitness of zero.
    #[must_use]
    pub fn new(network: NetworkModel) -> Self {
        Self {
            network,
            fitness: 0.0,
        }
    }

    /// Creates a genome with a randomly initialised network.
    pub fn random<R>(
        layer_sizes: &[usize],
        hidden_activation: Activation,
        rng: &mut R,
    ) -> Result<Self, NetworkError>
    where
        R: Rng + ?Sized,
    {
        NetworkModel::random(layer_sizes, hidden_activation, rng).map(Self::new)
    }

    #[must_use]
    pub fn network(&self) -> &NetworkModel {
        &self.network
    }

    #[must_use]
    pub fn into_network(self) -> NetworkModel {
        self.network
    }

    /// Returns the fitness from the last evaluation. Higher is better.
    #[must_use]
    pub fn fitness(&self) -> f64 {
        self.fitness
    }

    pub fn set_fitness(&mut self, fitness: f64) {
        self.fitness = fitness;
    }
}
