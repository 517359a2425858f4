use serde::{Deserialize, Serialize};

/// Slope applied to negative inputs by [`Activation::LeakyRelu`].
const LEAKY_RELU_SLOPE: f64 = 0.01;

/// Activation applied by the output layer of every network.
///
/// Sigmoid keeps action scores bounded in `(0, 1)`, so an all-zero network
/// scores every action at exactly `0.5`.
pub const OUTPUT_ACTIVATION: Activation = Activation::Sigmoid;

/// Activation function applied by hidden layers.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_more::FromStr,
)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    #[default]
    Relu,
    LeakyRelu,
    Sigmoid,
    Tanh,
}

impl Activation {
    /// Applies the activation to a single pre-activation sum.
    #[must_use]
    pub fn apply(self, x: f64) -> f64 {
        match self {
            Self::Relu => x.max(0.0),
            Self::LeakyRelu => {
                if x > 0.0 {
                    x
                } else {
                    LEAKY_RELU_SLOPE * x
                }
            }
            Self::Sigmoid => 1.0 / (1.0 + (-x).exp()),
            Self::Tanh => x.tanh(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_at_zero() {
        assert_eq!(Activation::Relu.apply(0.0), 0.0);
        assert_eq!(Activation::LeakyRelu.apply(0.0), 0.0);
        assert_eq!(Activation::Sigmoid.apply(0.0), 0.5);
        assert_eq!(Activation::Tanh.apply(0.0), 0.0);
    }

    #[test]
    fn test_negative_inputs() {
        assert_eq!(Activation::Relu.apply(-2.0), 0.0);
        assert!((Activation::LeakyRelu.apply(-2.0) + 0.02).abs() < 1e-12);
        assert!(Activation::Sigmoid.apply(-50.0) > 0.0);
        assert!(Activation::Tanh.apply(-50.0) >= -1.0);
    }

    #[test]
    fn test_parse_and_serde_names() {
        assert_eq!("relu".parse::<Activation>().unwrap(), Activation::Relu);
        assert_eq!("tanh".parse::<Activation>().unwrap(), Activation::Tanh);
        assert_eq!(
            serde_json::to_string(&Activation::LeakyRelu).unwrap(),
            "\"leakyrelu\""
        );
        let parsed: Activation = serde_json::from_str("\"sigmoid\"").unwrap();
        assert_eq!(parsed, Activation::Sigmoid);
    }
}
