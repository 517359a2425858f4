//! Recombination of two architecture-matching networks.
//!
//! Each weight layer is recombined by one [`CrossoverStrategy`], chosen by cycling
//! through the strategies by layer index. Biases are always coin-flipped per neuron,
//! whatever the layer's weight strategy is.

use std::iter;

use rand::Rng;

use crate::{Layer, NetworkError, NetworkModel};

/// Weight recombination operator applied to one layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum CrossoverStrategy {
    /// One cut point per neuron row; inputs before the cut come from one parent.
    #[display("single-point")]
    SinglePoint,
    /// Every weight independently comes from a coin-flipped parent.
    #[display("uniform")]
    Uniform,
    /// Per-neuron convex combination of both parents.
    #[display("blend")]
    Blend,
}

impl CrossoverStrategy {
    /// Returns the strategy used for weight layer `index`.
    ///
    /// ```
    /// use snevo_network::CrossoverStrategy;
    ///
    /// assert_eq!(CrossoverStrategy::for_layer(0), CrossoverStrategy::SinglePoint);
    /// assert_eq!(CrossoverStrategy::for_layer(4), CrossoverStrategy::Uniform);
    /// assert_eq!(CrossoverStrategy::for_layer(5), CrossoverStrategy::Blend);
    /// ```
    #[must_use]
    pub const fn for_layer(index: usize) -> Self {
        match index % 3 {
            0 => Self::SinglePoint,
            1 => Self::Uniform,
            _ => Self::Blend,
        }
    }
}

impl NetworkModel {
    /// Produces two fresh children from `self` (parent A) and `other` (parent B).
    ///
    /// Children inherit the topology and hidden activation of parent A.
    pub fn crossover<R>(&self, other: &Self, rng: &mut R) -> Result<(Self, Self), NetworkError>
    where
        R: Rng + ?Sized,
    {
        self.ensure_same_topology(other)?;
        let mut child1 = self.clone();
        let mut child2 = self.clone();
        cross_networks(self, other, &mut child1, &mut child2, rng);
        Ok((child1, child2))
    }

    /// Writes the two children of `self` and `other` into existing networks.
    ///
    /// Both children must already share the parents' topology; their previous
    /// parameters are fully overwritten.
    pub fn crossover_into<R>(
        &self,
        other: &Self,
        child1: &mut Self,
        child2: &mut Self,
        rng: &mut R,
    ) -> Result<(), NetworkError>
    where
        R: Rng + ?Sized,
    {
        self.ensure_same_topology(other)?;
        self.ensure_same_topology(child1)?;
        self.ensure_same_topology(child2)?;
        cross_networks(self, other, child1, child2, rng);
        Ok(())
    }
}

fn cross_networks<R>(
    a: &NetworkModel,
    b: &NetworkModel,
    child1: &mut NetworkModel,
    child2: &mut NetworkModel,
    rng: &mut R,
) where
    R: Rng + ?Sized,
{
    let layers = iter::zip(a.layers(), b.layers())
        .zip(iter::zip(child1.layers_mut(), child2.layers_mut()))
        .enumerate();
    for (index, ((la, lb), (c1, c2))) in layers {
        cross_layer(CrossoverStrategy::for_layer(index), la, lb, c1, c2, rng);
    }
}

fn cross_layer<R>(
    strategy: CrossoverStrategy,
    a: &Layer,
    b: &Layer,
    c1: &mut Layer,
    c2: &mut Layer,
    rng: &mut R,
) where
    R: Rng + ?Sized,
{
    let inputs = a.inputs();
    for neuron in 0..a.outputs() {
        let (ra, rb) = (a.row(neuron), b.row(neuron));
        let (r1, r2) = (c1.row_mut(neuron), c2.row_mut(neuron));
        match strategy {
            CrossoverStrategy::SinglePoint => {
                let cut = rng.random_range(0..=inputs);
                for i in 0..inputs {
                    let (x, y) = if i < cut { (ra[i], rb[i]) } else { (rb[i], ra[i]) };
                    r1[i] = x;
                    r2[i] = y;
                }
            }
            CrossoverStrategy::Uniform => {
                for i in 0..inputs {
                    let (x, y) = if rng.random_bool(0.5) {
                        (ra[i], rb[i])
                    } else {
                        (rb[i], ra[i])
                    };
                    r1[i] = x;
                    r2[i] = y;
                }
            }
            CrossoverStrategy::Blend => {
                let alpha: f64 = rng.random();
                for i in 0..inputs {
                    r1[i] = alpha * ra[i] + (1.0 - alpha) * rb[i];
                    r2[i] = (1.0 - alpha) * ra[i] + alpha * rb[i];
                }
            }
        }
    }

    let (ba, bb) = (a.biases(), b.biases());
    let (b1, b2) = (c1.biases_mut(), c2.biases_mut());
    for n in 0..ba.len() {
        if rng.random_bool(0.5) {
            b1[n] = ba[n];
            b2[n] = bb[n];
        } else {
            b1[n] = bb[n];
            b2[n] = ba[n];
        }
    }
}
