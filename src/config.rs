//! Construction parameters for a `Network`.

use serde_derive::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Output tolerance used when none is given.
pub const DEFAULT_ACCEPTABLE_ERROR: f64 = 1e-3;

fn default_acceptable_error() -> f64 {
    DEFAULT_ACCEPTABLE_ERROR
}

/// Describes the shape and learning parameters of a network.
///
/// # Example
///
/// ```
/// # use learners::config::NetworkConfig;
/// let config = NetworkConfig::new(&[2, 3, 1], 0.1).seed(7);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Neurons per layer, excluding bias neurons. The first entry is the input
    /// width and the last the output width.
    pub layers: Vec<usize>,
    /// Gradient descent step size (eta).
    pub learning_rate: f64,
    /// An output within this distance of its target counts as converged.
    #[serde(default = "default_acceptable_error")]
    pub acceptable_error: f64,
    /// Seed for weight initialization. Drawn from entropy when absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl NetworkConfig {
    /// Creates an unseeded config using `DEFAULT_ACCEPTABLE_ERROR`.
    pub fn new(layers: &[usize], learning_rate: f64) -> Self {
        NetworkConfig {
            layers: layers.into(),
            learning_rate,
            acceptable_error: DEFAULT_ACCEPTABLE_ERROR,
            seed: None,
        }
    }

    /// Sets the convergence tolerance.
    pub fn acceptable_error(mut self, ok: f64) -> Self {
        self.acceptable_error = ok;
        self
    }

    /// Sets the weight initialization seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Verifies the topology and learning parameters, returning an error if
    /// something is wrong.
    pub fn validate(&self) -> Result<()> {
        if self.layers.len() < 3 {
            return Err(Error::TooFewLayers {
                layers: self.layers.len(),
            });
        }
        if let Some(layer) = self.layers.iter().position(|&size| size == 0) {
            return Err(Error::EmptyLayer { layer });
        }
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err(Error::InvalidParameter {
                name: "learning_rate",
                reason: format!("must be positive and finite, got {}", self.learning_rate),
            });
        }
        if self.acceptable_error.is_nan() || self.acceptable_error < 0.0 {
            return Err(Error::InvalidParameter {
                name: "acceptable_error",
                reason: format!("must be non-negative, got {}", self.acceptable_error),
            });
        }
        Ok(())
    }
}
