use std::{iter, mem};

use rand::Rng;
use rand_distr::StandardNormal;

use crate::{Activation, Layer, NetworkError, OUTPUT_ACTIVATION};

/// Scale applied to standard-normal samples when initialising biases.
const BIAS_INIT_SCALE: f64 = 0.1;

/// A feedforward network with an immutable architecture.
///
/// `layer_sizes[0]` is the input width and the last entry is the output width.
/// There is one [`Layer`] per adjacent pair of sizes.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkModel {
    layer_sizes: Vec<usize>,
    layers: Vec<Layer>,
    hidden_activation: Activation,
}

/// Returns the number of weights and biases of a topology, or `None` if it
/// does not fit in `usize`.
pub(crate) fn checked_parameter_count(layer_sizes: &[usize]) -> Option<usize> {
    layer_sizes.windows(2).try_fold(0_usize, |total, pair| {
        let weights = pair[0].checked_mul(pair[1])?;
        total.checked_add(weights)?.checked_add(pair[1])
    })
}

fn validate_topology(layer_sizes: &[usize]) -> Result<(), NetworkError> {
    if layer_sizes.len() < 2
        || layer_sizes.contains(&0)
        || checked_parameter_count(layer_sizes).is_none()
    {
        return Err(NetworkError::InvalidTopology {
            layer_sizes: layer_sizes.to_vec(),
        });
    }
    Ok(())
}

impl NetworkModel {
    /// Creates a network with every weight and bias set to zero.
    pub fn zeros(layer_sizes: &[usize], hidden_activation: Activation) -> Result<Self, NetworkError> {
        validate_topology(layer_sizes)?;
        let layers = layer_sizes
            .windows(2)
            .map(|pair| Layer::zeros(pair[0], pair[1]))
            .collect();
        Ok(Self {
            layer_sizes: layer_sizes.to_vec(),
            layers,
            hidden_activation,
        })
    }

    /// Creates a network with Xavier/Glorot-scaled normal weights.
    ///
    /// Weights of a layer are drawn from `N(0, 1) · sqrt(2 / (fan_in + fan_out))`,
    /// biases from `N(0, 1) · 0.1`.
    pub fn random<R>(
        layer_sizes: &[usize],
        hidden_activation: Activation,
        rng: &mut R,
    ) -> Result<Self, NetworkError>
    where
        R: Rng + ?Sized,
    {
        let mut network = Self::zeros(layer_sizes, hidden_activation)?;
        network.randomize(rng);
        Ok(network)
    }

    /// Re-draws every parameter with the Xavier/Glorot scheme used by [`random`](Self::random).
    pub fn randomize<R>(&mut self, rng: &mut R)
    where
        R: Rng + ?Sized,
    {
        for layer in &mut self.layers {
            #[expect(clippy::cast_precision_loss)]
            let std_dev = (2.0 / (layer.inputs() + layer.outputs()) as f64).sqrt();
            for w in layer.weights_mut() {
                let z: f64 = rng.sample(StandardNormal);
                *w = z * std_dev;
            }
            for b in layer.biases_mut() {
                let z: f64 = rng.sample(StandardNormal);
                *b = z * BIAS_INIT_SCALE;
            }
        }
    }

    #[must_use]
    pub fn layer_sizes(&self) -> &[usize] {
        &self.layer_sizes
    }

    #[must_use]
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub(crate) fn layers_mut(&mut self) -> &mut [Layer] {
        &mut self.layers
    }

    #[must_use]
    pub fn hidden_activation(&self) -> Activation {
        self.hidden_activation
    }

    /// Returns the width of the input layer.
    #[must_use]
    pub fn input_width(&self) -> usize {
        self.layer_sizes[0]
    }

    /// Returns the width of the output layer.
    #[must_use]
    pub fn output_width(&self) -> usize {
        self.layer_sizes[self.layer_sizes.len() - 1]
    }

    /// Returns the total number of weights and biases.
    #[must_use]
    pub fn parameter_count(&self) -> usize {
        self.layers
            .iter()
            .map(|l| l.weights().len() + l.biases().len())
            .sum()
    }

    /// Returns the weight from `input` to `neuron` in weight layer `layer`.
    ///
    /// # Panics
    ///
    /// Panics if any index is out of range.
    #[must_use]
    pub fn weight(&self, layer: usize, neuron: usize, input: usize) -> f64 {
        self.layers[layer].row(neuron)[input]
    }

    /// Returns the bias of `neuron` in weight layer `layer`.
    ///
    /// # Panics
    ///
    /// Panics if any index is out of range.
    #[must_use]
    pub fn bias(&self, layer: usize, neuron: usize) -> f64 {
        self.layers[layer].biases()[neuron]
    }

    /// Evaluates the network on `inputs`.
    ///
    /// Hidden layers use the network's hidden activation; the output layer uses
    /// [`OUTPUT_ACTIVATION`].
    pub fn forward(&self, inputs: &[f64]) -> Result<Vec<f64>, NetworkError> {
        let expected = self.input_width();
        if inputs.len() != expected {
            return Err(NetworkError::DimensionMismatch {
                expected,
                actual: inputs.len(),
            });
        }

        let last = self.layers.len() - 1;
        let mut current = inputs.to_vec();
        let mut next = Vec::new();
        for (index, layer) in self.layers.iter().enumerate() {
            let activation = if index == last {
                OUTPUT_ACTIVATION
            } else {
                self.hidden_activation
            };
            layer.forward_into(&current, activation, &mut next);
            mem::swap(&mut current, &mut next);
        }
        Ok(current)
    }

    /// Perturbs parameters in place.
    ///
    /// Every weight and bias independently, with probability `rate`, receives
    /// `N(0, 1) · strength`. Rates outside `[0, 1]` are clamped.
    pub fn mutate<R>(&mut self, rate: f64, strength: f64, rng: &mut R)
    where
        R: Rng + ?Sized,
    {
        let rate = rate.clamp(0.0, 1.0);
        for layer in &mut self.layers {
            for value in layer.parameters_mut() {
                if rng.random_bool(rate) {
                    let z: f64 = rng.sample(StandardNormal);
                    *value += z * strength;
                }
            }
        }
    }

    /// Iterates over all parameters in flat order (weights first, then biases).
    pub fn parameters(&self) -> impl Iterator<Item = f64> + '_ {
        let weights = self.layers.iter().flat_map(|l| l.weights().iter().copied());
        let biases = self.layers.iter().flat_map(|l| l.biases().iter().copied());
        weights.chain(biases)
    }

    /// Returns all parameters as one flat vector.
    #[must_use]
    pub fn to_flat(&self) -> Vec<f64> {
        self.parameters().collect()
    }

    /// Overwrites all parameters from a flat vector produced by [`to_flat`](Self::to_flat).
    pub fn set_flat(&mut self, values: &[f64]) -> Result<(), NetworkError> {
        let expected = self.parameter_count();
        if values.len() != expected {
            return Err(NetworkError::DimensionMismatch {
                expected,
                actual: values.len(),
            });
        }
        self.assign_flat(values);
        Ok(())
    }

    /// Writes `values` into the parameters; the caller guarantees the length.
    pub(crate) fn assign_flat(&mut self, values: &[f64]) {
        debug_assert_eq!(values.len(), self.parameter_count());
        let mut values = values.iter().copied();
        for layer in &mut self.layers {
            for (slot, value) in iter::zip(layer.weights_mut(), values.by_ref()) {
                *slot = value;
            }
        }
        for layer in &mut self.layers {
            for (slot, value) in iter::zip(layer.biases_mut(), values.by_ref()) {
                *slot = value;
            }
        }
    }

    /// Returns the mean absolute difference between corresponding parameters.
    ///
    /// This is the building block of the population diversity metric.
    pub fn parameter_distance(&self, other: &Self) -> Result<f64, NetworkError> {
        self.ensure_same_topology(other)?;
        let (sum, count) = iter::zip(self.parameters(), other.parameters())
            .fold((0.0, 0_usize), |(sum, count), (a, b)| {
                (sum + (a - b).abs(), count + 1)
            });
        if count == 0 {
            return Ok(0.0);
        }
        #[expect(clippy::cast_precision_loss)]
        let count = count as f64;
        Ok(sum / count)
    }

    pub(crate) fn ensure_same_topology(&self, other: &Self) -> Result<(), NetworkError> {
        if self.layer_sizes != other.layer_sizes {
            return Err(NetworkError::ArchitectureMismatch {
                expected: self.layer_sizes.clone(),
                found: other.layer_sizes.clone(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg64;

    use super::*;

    fn counting_network(layer_sizes: &[usize]) -> NetworkModel {
        let mut network = NetworkModel::zeros(layer_sizes, Activation::Relu).unwrap();
        #[expect(clippy::cast_precision_loss)]
        let values = (0..network.parameter_count())
            .map(|i| i as f64)
            .collect::<Vec<_>>();
        network.set_flat(&values).unwrap();
        network
    }

    #[test]
    fn test_zero_network_outputs_sigmoid_midpoint() {
        let network = NetworkModel::zeros(&[6, 8, 4], Activation::Relu).unwrap();
        let outputs = network.forward(&[0.0; 6]).unwrap();
        assert_eq!(outputs, vec![0.5; 4]);
    }

    #[test]
    fn test_zero_network_ignores_hidden_activation() {
        for activation in [
            Activation::Relu,
            Activation::LeakyRelu,
            Activation::Sigmoid,
            Activation::Tanh,
        ] {
            let network = NetworkModel::zeros(&[3, 5, 5, 2], activation).unwrap();
            assert_eq!(network.forward(&[0.0; 3]).unwrap(), vec![0.5; 2]);
        }
    }

    #[test]
    fn test_forward_rejects_wrong_width() {
        let network = NetworkModel::zeros(&[6, 8, 4], Activation::Relu).unwrap();
        assert_eq!(
            network.forward(&[0.0; 5]),
            Err(NetworkError::DimensionMismatch {
                expected: 6,
                actual: 5
            })
        );
    }

    #[test]
    fn test_invalid_topologies() {
        assert!(NetworkModel::zeros(&[], Activation::Relu).is_err());
        assert!(NetworkModel::zeros(&[4], Activation::Relu).is_err());
        assert!(NetworkModel::zeros(&[4, 0, 4], Activation::Relu).is_err());

        let huge = usize::MAX / 2;
        assert_eq!(
            NetworkModel::zeros(&[huge, 3], Activation::Relu),
            Err(NetworkError::InvalidTopology {
                layer_sizes: vec![huge, 3]
            })
        );
        assert_eq!(checked_parameter_count(&[huge, 3]), None);
        assert_eq!(checked_parameter_count(&[6, 8, 4]), Some(48 + 8 + 32 + 4));
    }

    #[test]
    fn test_layer_shapes_follow_topology() {
        let network = NetworkModel::zeros(&[6, 8, 4], Activation::Relu).unwrap();
        let layers = network.layers();
        assert_eq!(layers.len(), 2);
        assert_eq!((layers[0].inputs(), layers[0].outputs()), (6, 8));
        assert_eq!(layers[0].weights().len(), 48);
        assert_eq!(layers[0].biases().len(), 8);
        assert_eq!((layers[1].inputs(), layers[1].outputs()), (8, 4));
        assert_eq!(network.parameter_count(), 48 + 8 + 32 + 4);
    }

    #[test]
    fn test_forward_hand_computed() {
        // 2 -> 1 (relu) -> 1 (sigmoid)
        let mut network = NetworkModel::zeros(&[2, 1, 1], Activation::Relu).unwrap();
        // weights: [w00, w01], [v]; biases: [b0], [c]
        network.set_flat(&[1.0, -2.0, 3.0, 0.5, -1.0]).unwrap();
        let hidden = (0.5_f64 + 1.0 * 2.0 - 2.0 * 0.25).max(0.0);
        let expected = 1.0 / (1.0 + (-(3.0 * hidden - 1.0_f64)).exp());
        let outputs = network.forward(&[2.0, 0.25]).unwrap();
        assert!((outputs[0] - expected).abs() < 1e-12);
    }

    #[test]
    fn test_flat_order_is_weights_then_biases() {
        let network = counting_network(&[2, 3, 1]);
        assert_eq!(network.weight(0, 0, 0), 0.0);
        assert_eq!(network.weight(0, 0, 1), 1.0);
        assert_eq!(network.weight(0, 2, 1), 5.0);
        assert_eq!(network.weight(1, 0, 2), 8.0);
        assert_eq!(network.bias(0, 0), 9.0);
        assert_eq!(network.bias(1, 0), 12.0);
        assert_eq!(network.to_flat().len(), 13);
    }

    #[test]
    fn test_set_flat_rejects_wrong_length() {
        let mut network = NetworkModel::zeros(&[2, 2], Activation::Relu).unwrap();
        assert!(matches!(
            network.set_flat(&[1.0; 5]),
            Err(NetworkError::DimensionMismatch {
                expected: 6,
                actual: 5
            })
        ));
    }

    #[test]
    fn test_random_is_seed_deterministic() {
        let a = NetworkModel::random(&[6, 8, 4], Activation::Tanh, &mut Pcg64::seed_from_u64(3))
            .unwrap();
        let b = NetworkModel::random(&[6, 8, 4], Activation::Tanh, &mut Pcg64::seed_from_u64(3))
            .unwrap();
        assert_eq!(a, b);
        assert!(a.parameters().any(|p| p != 0.0));
    }

    #[test]
    fn test_mutate_rate_bounds() {
        let mut rng = Pcg64::seed_from_u64(11);
        let original = NetworkModel::random(&[4, 6, 4], Activation::Relu, &mut rng).unwrap();

        let mut untouched = original.clone();
        untouched.mutate(0.0, 1.0, &mut rng);
        assert_eq!(untouched, original);

        let mut all = original.clone();
        all.mutate(1.0, 1.0, &mut rng);
        let changed = iter::zip(all.parameters(), original.parameters())
            .filter(|(a, b)| a != b)
            .count();
        assert_eq!(changed, original.parameter_count());
    }

    #[test]
    fn test_mutate_clamps_rates_above_one() {
        let mut rng = Pcg64::seed_from_u64(5);
        let mut network = NetworkModel::zeros(&[2, 2], Activation::Relu).unwrap();
        network.mutate(1.8, 0.5, &mut rng);
        assert!(network.parameters().all(|p| p != 0.0));
    }

    #[test]
    fn test_parameter_distance() {
        let a = NetworkModel::zeros(&[2, 2], Activation::Relu).unwrap();
        let mut b = a.clone();
        b.set_flat(&[1.0, -1.0, 2.0, -2.0, 0.0, 0.0]).unwrap();
        assert_eq!(a.parameter_distance(&a).unwrap(), 0.0);
        assert_eq!(a.parameter_distance(&b).unwrap(), 1.0);
        assert_eq!(b.parameter_distance(&a).unwrap(), 1.0);

        let c = NetworkModel::zeros(&[2, 3], Activation::Relu).unwrap();
        assert!(matches!(
            a.parameter_distance(&c),
            Err(NetworkError::ArchitectureMismatch { .. })
        ));
    }
}
