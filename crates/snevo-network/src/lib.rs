//! Fixed-topology feedforward networks for neuro-evolution.
//!
//! This crate owns the "brain" of an evolved snake: a fully connected feedforward
//! network whose architecture never changes after construction. Only the values of
//! weights and biases move, driven by the genetic operators defined here.
//!
//! - [`NetworkModel`] - Topology, parameters and forward evaluation
//! - [`Activation`] - Hidden-layer activation, selectable per network
//! - [`CrossoverStrategy`] - Per-layer recombination operator
//! - [`persist`] - Fixed binary genome file format
//!
//! # Parameter Layout
//!
//! Each weight layer is stored as one contiguous row-major buffer
//! (`outputs × inputs`) plus a bias buffer, so cloning a network (elitism,
//! crossover parents) is a flat memory copy instead of a walk over nested vectors.
//!
//! The flat parameter order used by [`NetworkModel::to_flat`], the distance metric
//! and the genome file is: every weight (layer-major, neuron-major, input-minor),
//! followed by every bias (layer-major, neuron-minor).
//!
//! # Example
//!
//! ```
//! use rand::SeedableRng as _;
//! use snevo_network::{Activation, NetworkModel};
//!
//! let mut rng = rand::rngs::StdRng::seed_from_u64(7);
//! let network = NetworkModel::random(&[6, 8, 4], Activation::Relu, &mut rng).unwrap();
//!
//! let outputs = network.forward(&[0.0; 6]).unwrap();
//! assert_eq!(outputs.len(), 4);
//! assert!(outputs.iter().all(|o| (0.0..=1.0).contains(o)));
//! ```

pub use self::{
    activation::{Activation, OUTPUT_ACTIVATION},
    crossover::CrossoverStrategy,
    layer::Layer,
    network::NetworkModel,
    persist::{PersistError, read_topology},
};

mod activation;
pub mod crossover;
mod layer;
mod network;
pub mod persist;

/// Errors raised by network construction and genetic operators.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum NetworkError {
    #[display("expected {expected} values, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[display("network topology {found:?} does not match expected topology {expected:?}")]
    ArchitectureMismatch {
        expected: Vec<usize>,
        found: Vec<usize>,
    },
    #[display("invalid topology {layer_sizes:?}: need at least two layers of positive width")]
    InvalidTopology { layer_sizes: Vec<usize> },
}
