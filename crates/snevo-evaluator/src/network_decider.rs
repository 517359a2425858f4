//! Network-backed direction choice.

use snevo_engine::{Decider, Direction};
use snevo_network::{NetworkError, NetworkModel};

/// Returns the index of the largest value, preferring the lowest index on ties.
///
/// `NaN` values never win. Returns `None` for an empty slice or when every
/// value is `NaN`.
///
/// ```
/// use snevo_evaluator::argmax;
///
/// assert_eq!(argmax(&[0.2, 0.9, 0.9, 0.1]), Some(1));
/// assert_eq!(argmax(&[0.5; 4]), Some(0));
/// assert_eq!(argmax(&[]), None);
/// ```
#[must_use]
pub fn argmax(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        if best.is_none_or(|(_, b)| v > b) {
            best = Some((i, v));
        }
    }
    best.map(|(i, _)| i)
}

/// Picks the direction whose network output is largest.
///
/// Output `i` requests [`Direction::from_index(i)`](Direction::from_index).
#[derive(Debug, Clone, Copy)]
pub struct NetworkDecider<'a> {
    network: &'a NetworkModel,
}

impl<'a> NetworkDecider<'a> {
    /// Wraps `network`, whose output width must be 4.
    pub fn new(network: &'a NetworkModel) -> Result<Self, NetworkError> {
        let actual = network.output_width();
        if actual != Direction::ALL.len() {
            return Err(NetworkError::DimensionMismatch {
                expected: Direction::ALL.len(),
                actual,
            });
        }
        Ok(Self { network })
    }
}

impl Decider for NetworkDecider<'_> {
    type Error = NetworkError;

    fn decide(&mut self, state: &[f64]) -> Result<Direction, Self::Error> {
        let outputs = self.network.forward(state)?;
        // All-NaN outputs fall back to `Up`.
        let index = argmax(&outputs).unwrap_or(0);
        Ok(Direction::from_index(index).unwrap_or(Direction::Up))
    }
}

#[cfg(test)]
mod tests {
    use snevo_network::Activation;

    use super::*;

    fn network_preferring(index: usize) -> NetworkModel {
        // Zero weights; a positive output bias makes `index` the largest score.
        let mut network = NetworkModel::zeros(&[6, 4], Activation::Relu).unwrap();
        let mut flat = vec![0.0; network.parameter_count()];
        let bias_start = 6 * 4;
        flat[bias_start + index] = 1.0;
        network.set_flat(&flat).unwrap();
        network
    }

    #[test]
    fn test_argmax_ties_and_nan() {
        assert_eq!(argmax(&[1.0, 3.0, 3.0]), Some(1));
        assert_eq!(argmax(&[f64::NAN, 0.1, 0.0]), Some(1));
        assert_eq!(argmax(&[f64::NAN]), None);
        assert_eq!(argmax(&[-1.0, -0.5]), Some(1));
    }

    #[test]
    fn test_decides_largest_output() {
        for dir in Direction::ALL {
            let network = network_preferring(dir.index());
            let mut decider = NetworkDecider::new(&network).unwrap();
            assert_eq!(decider.decide(&[0.0; 6]).unwrap(), dir);
        }
    }

    #[test]
    fn test_zero_network_ties_to_up() {
        let network = NetworkModel::zeros(&[6, 8, 4], Activation::Relu).unwrap();
        let mut decider = NetworkDecider::new(&network).unwrap();
        assert_eq!(decider.decide(&[0.3; 6]).unwrap(), Direction::Up);
    }

    #[test]
    fn test_rejects_wrong_widths() {
        let network = NetworkModel::zeros(&[6, 3], Activation::Relu).unwrap();
        assert!(NetworkDecider::new(&network).is_err());

        let network = network_preferring(0);
        let mut decider = NetworkDecider::new(&network).unwrap();
        assert!(matches!(
            decider.decide(&[0.0; 14]),
            Err(NetworkError::DimensionMismatch {
                expected: 6,
                actual: 14
            })
        ));
    }
}
