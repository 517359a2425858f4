use std::iter;

use crate::Activation;

/// One fully connected weight layer.
///
/// Weights are stored row-major: row `n` holds the `inputs` incoming weights of
/// output neuron `n`.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    inputs: usize,
    outputs: usize,
    weights: Vec<f64>,
    biases: Vec<f64>,
}

impl Layer {
    pub(crate) fn zeros(inputs: usize, outputs: usize) -> Self {
        Self {
            inputs,
            outputs,
            weights: vec![0.0; inputs * outputs],
            biases: vec![0.0; outputs],
        }
    }

    /// Returns the number of inputs feeding each neuron.
    #[must_use]
    pub fn inputs(&self) -> usize {
        self.inputs
    }

    /// Returns the number of neurons in this layer.
    #[must_use]
    pub fn outputs(&self) -> usize {
        self.outputs
    }

    /// Returns all weights in row-major order.
    #[must_use]
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Returns one bias per neuron.
    #[must_use]
    pub fn biases(&self) -> &[f64] {
        &self.biases
    }

    /// Returns the incoming weights of `neuron`.
    #[must_use]
    pub fn row(&self, neuron: usize) -> &[f64] {
        let start = neuron * self.inputs;
        &self.weights[start..start + self.inputs]
    }

    pub(crate) fn row_mut(&mut self, neuron: usize) -> &mut [f64] {
        let start = neuron * self.inputs;
        &mut self.weights[start..start + self.inputs]
    }

    pub(crate) fn weights_mut(&mut self) -> &mut [f64] {
        &mut self.weights
    }

    pub(crate) fn biases_mut(&mut self) -> &mut [f64] {
        &mut self.biases
    }

    pub(crate) fn parameters_mut(&mut self) -> impl Iterator<Item = &mut f64> {
        self.weights.iter_mut().chain(self.biases.iter_mut())
    }

    /// Computes `activation(bias + Σ weight·input)` for every neuron into `out`.
    pub(crate) fn forward_into(&self, input: &[f64], activation: Activation, out: &mut Vec<f64>) {
        debug_assert_eq!(input.len(), self.inputs);
        out.clear();
        out.extend(
            iter::zip(self.weights.chunks_exact(self.inputs), &self.biases).map(|(row, bias)| {
                let sum = iter::zip(row, input).map(|(w, x)| w * x).sum::<f64>();
                activation.apply(bias + sum)
            }),
        );
    }
}
