//! A [Feedforward neural network]
//! (https://en.wikipedia.org/wiki/Feedforward_neural_network) stored as an
//! explicit graph of neurons and keyed edges.
//!
//! # Example
//!
//! Let's train a simple neural network to compute the XOR function:
//!
//! ```
//! # use learners::config::NetworkConfig;
//! # use learners::feed_forward::Network;
//! # use learners::trainer::{Logging, Trainer};
//! // Create examples of the XOR function
//! let inputs = [[0.0, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 1.0]];
//! let targets = [[0.0], [1.0], [1.0], [0.0]];
//!
//! // Train a network using those examples
//! let mut network = Network::new(&NetworkConfig::new(&[2, 3, 1], 0.5).seed(1)).unwrap();
//! let stats = Trainer::new()
//!     .epochs(100)
//!     .logging(Logging::Silent)
//!     .train(&mut network, &inputs, &targets)
//!     .unwrap();
//! assert_eq!(stats.epochs, 100);
//!
//! // Every prediction is a single sigmoid output
//! let out = network.calculate(&[1.0, 0.0]).unwrap();
//! assert!(out[0] > 0.0 && out[0] < 1.0);
//! ```

use std::collections::BTreeMap;

use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::activator::{sigmoid, sigmoid_prime};
use crate::config::NetworkConfig;
use crate::edge::{EdgeKey, WeightTable};
use crate::error::{check_len, Error, Result};
use crate::neuron::Neuron;
use crate::trainer::Trainable;

/// Lower bound (inclusive) of the uniform initial weight distribution.
pub const WEIGHT_LOW: f64 = 0.1;
/// Upper bound (exclusive) of the uniform initial weight distribution.
pub const WEIGHT_HIGH: f64 = 1.0;

/// A Feedforward neural network
///
/// Every layer but the last ends with a bias neuron. Adjacent layers are fully
/// connected, except that no edge ever enters a bias neuron.
#[derive(Clone, Debug)]
pub struct Network {
    layers: Vec<Vec<Neuron>>,
    weights: WeightTable,
    learning_rate: f64,
    acceptable_error: f64,
}

impl Network {
    /// Creates a new, untrained neural network, seeding weight initialization
    /// from `config.seed` when present.
    pub fn new(config: &NetworkConfig) -> Result<Self> {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Network::with_rng(config, &mut rng)
    }

    /// Creates a new, untrained neural network drawing its initial weights
    /// from `rng`. `config.seed` is ignored.
    pub fn with_rng<R: Rng + ?Sized>(config: &NetworkConfig, rng: &mut R) -> Result<Self> {
        config.validate()?;
        let output_layer = config.layers.len() - 1;
        let layers = config
            .layers
            .iter()
            .enumerate()
            .map(|(i, &size)| {
                let mut layer: Vec<Neuron> = (0..size).map(|_| Neuron::new()).collect();
                if i != output_layer {
                    layer.push(Neuron::bias());
                }
                layer
            })
            .collect();
        let mut network = Network {
            layers,
            weights: WeightTable::new(),
            learning_rate: config.learning_rate,
            acceptable_error: config.acceptable_error,
        };
        network.build(rng);
        debug!(
            layers = ?config.layers,
            edges = network.weights.len(),
            "built network"
        );
        Ok(network)
    }

    /// Connects every neuron to every non-bias neuron of the next layer.
    fn build<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let distribution = Uniform::new(WEIGHT_LOW, WEIGHT_HIGH);
        for i in 1..self.layers.len() {
            let (before, after) = self.layers.split_at_mut(i);
            for (j, source) in before[i - 1].iter_mut().enumerate() {
                for (k, dest) in after[0].iter_mut().enumerate() {
                    if dest.is_bias() {
                        continue;
                    }
                    let key = EdgeKey::new(i - 1, j, k);
                    self.weights.set(key, distribution.sample(rng));
                    source.add_out_edge(key);
                    dest.add_in_edge(key);
                }
            }
        }
    }

    /// Returns the number of inputs to the network.
    pub fn input_len(&self) -> usize {
        self.layers[0].len() - 1
    }

    /// Returns the number of outputs from the network.
    pub fn output_len(&self) -> usize {
        self.output_layer().len()
    }

    /// Returns the number of layers, including input and output.
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Returns the neurons of `layer`, bias included.
    pub fn layer(&self, layer: usize) -> Option<&[Neuron]> {
        self.layers.get(layer).map(Vec::as_slice)
    }

    /// Returns true if neuron `index` of `layer` exists and is a bias neuron.
    pub fn is_bias(&self, layer: usize, index: usize) -> bool {
        self.layers
            .get(layer)
            .and_then(|l| l.get(index))
            .map_or(false, Neuron::is_bias)
    }

    /// Gradient descent step size (eta).
    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    /// Distance from a target under which an output counts as converged.
    pub fn acceptable_error(&self) -> f64 {
        self.acceptable_error
    }

    /// Every edge weight in the network.
    pub fn weights(&self) -> &WeightTable {
        &self.weights
    }

    /// Returns the weight of the edge `key`, if it exists.
    pub fn weight(&self, key: &EdgeKey) -> Option<f64> {
        self.weights.get(key)
    }

    /// Overwrites the weight of an existing edge.
    pub fn set_weight(&mut self, key: EdgeKey, weight: f64) -> Result<()> {
        if !self.weights.contains(&key) {
            return Err(Error::InvalidParameter {
                name: "key",
                reason: format!("no edge {:?}", key),
            });
        }
        self.weights.set(key, weight);
        Ok(())
    }

    /// Counts the edges between `layer` and `layer + 1`.
    pub fn edge_count(&self, layer: usize) -> usize {
        self.weights.count_from_layer(layer)
    }

    /// Feeds the provided `input` through the network, returning the output
    /// layer.
    pub fn calculate(&mut self, input: &[f64]) -> Result<Vec<f64>> {
        self.load_input(input)?;
        self.calculate_outputs();
        Ok(self.outputs())
    }

    /// Sets the outputs of the input layer's non-bias neurons.
    pub fn load_input(&mut self, input: &[f64]) -> Result<()> {
        check_len("input", self.input_len(), input.len())?;
        for (neuron, &x) in self.layers[0].iter_mut().zip(input) {
            neuron.set_out(x);
        }
        Ok(())
    }

    /// Recomputes every non-input, non-bias neuron from the current input
    /// layer, one layer at a time.
    pub fn calculate_outputs(&mut self) {
        let weights = &self.weights;
        for i in 1..self.layers.len() {
            let (inputs, outputs) = io_layers(&mut self.layers, i);
            for neuron in outputs.iter_mut().filter(|n| !n.is_bias()) {
                let net: f64 = neuron
                    .in_edges()
                    .iter()
                    .map(|key| inputs[key.source].out() * weights[key])
                    .sum();
                neuron.set_out(sigmoid(net));
            }
        }
    }

    /// Returns the current outputs of the output layer.
    pub fn outputs(&self) -> Vec<f64> {
        self.output_layer().iter().map(Neuron::out).collect()
    }

    /// Propagates the error against `targets` back through the network and
    /// takes one gradient descent step on every edge.
    ///
    /// Returns true if every output from the preceding forward pass was
    /// already within `acceptable_error` of its target. The check happens
    /// before any weight changes.
    pub fn back_propagation(&mut self, targets: &[f64]) -> Result<bool> {
        check_len("target", self.output_len(), targets.len())?;
        let ok = self.acceptable_error;
        let converged = self
            .output_layer()
            .iter()
            .zip(targets)
            .all(|(n, &t)| (n.out() - t).abs() < ok);

        let eta = self.learning_rate;
        let layers = &self.layers;
        let weights = &mut self.weights;
        let mut step = Step::default();

        let last = layers.len() - 1;
        for (neuron, &target) in layers[last].iter().zip(targets) {
            let out = neuron.out();
            let sigma = -(target - out) * sigmoid_prime(out);
            step.descend(layers, weights, eta, neuron, sigma);
        }
        for i in (1..last).rev() {
            for neuron in layers[i].iter().filter(|n| !n.is_bias()) {
                let downstream: f64 = neuron
                    .out_edges()
                    .iter()
                    .map(|key| step.sigmas[key] * step.old_weights[key])
                    .sum();
                let sigma = sigmoid_prime(neuron.out()) * downstream;
                step.descend(layers, weights, eta, neuron, sigma);
            }
        }
        Ok(converged)
    }

    fn output_layer(&self) -> &[Neuron] {
        &self.layers[self.layers.len() - 1]
    }
}

/// Error signals and pre-update weights of the edges already visited during
/// one backpropagation pass.
#[derive(Default)]
struct Step {
    sigmas: BTreeMap<EdgeKey, f64>,
    old_weights: BTreeMap<EdgeKey, f64>,
}

impl Step {
    /// Assigns `sigma` to every incoming edge of `neuron` and moves each edge
    /// weight against its gradient.
    fn descend(
        &mut self,
        layers: &[Vec<Neuron>],
        weights: &mut WeightTable,
        eta: f64,
        neuron: &Neuron,
        sigma: f64,
    ) {
        for &key in neuron.in_edges() {
            let source = layers[key.layer][key.source].out();
            let old = weights[&key];
            self.sigmas.insert(key, sigma);
            self.old_weights.insert(key, old);
            weights.set(key, old - sigma * eta * source);
        }
    }
}

impl Trainable for Network {
    fn input_len(&self) -> usize {
        Network::input_len(self)
    }

    fn output_len(&self) -> usize {
        Network::output_len(self)
    }

    fn forward(&mut self, input: &[f64]) -> Result<Vec<f64>> {
        self.calculate(input)
    }

    fn backward(&mut self, target: &[f64]) -> Result<bool> {
        self.back_propagation(target)
    }
}

/// Gets the layer before `layer` and a mutable `layer`.
fn io_layers(layers: &mut [Vec<Neuron>], layer: usize) -> (&[Neuron], &mut [Neuron]) {
    let (before, after) = layers.split_at_mut(layer);
    (&before[layer - 1], &mut after[0])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::neuron::BIAS_OUTPUT;
    use approx::assert_abs_diff_eq;

    fn network(layers: &[usize], rate: f64) -> Network {
        Network::new(&NetworkConfig::new(layers, rate).seed(42)).unwrap()
    }

    #[test]
    fn too_few_layers() {
        let err = Network::new(&NetworkConfig::new(&[2, 1], 0.1)).unwrap_err();
        assert_eq!(err, Error::TooFewLayers { layers: 2 });
    }

    #[test]
    fn layer_shapes() {
        let n = network(&[3, 4, 2], 0.1);
        assert_eq!(n.layer_count(), 3);
        assert_eq!(n.input_len(), 3);
        assert_eq!(n.output_len(), 2);
        assert_eq!(n.layer(0).unwrap().len(), 4);
        assert_eq!(n.layer(1).unwrap().len(), 5);
        assert_eq!(n.layer(2).unwrap().len(), 2);
        assert!(n.is_bias(0, 3));
        assert!(n.is_bias(1, 4));
        assert!(!n.is_bias(2, 1));
        assert!(n.layer(3).is_none());
    }

    #[test]
    fn edge_counts() {
        let n = network(&[3, 4, 5, 2], 0.1);
        assert_eq!(n.edge_count(0), 4 * 4);
        assert_eq!(n.edge_count(1), 5 * 5);
        assert_eq!(n.edge_count(2), 6 * 2);
        assert_eq!(n.weights().len(), 16 + 25 + 12);
    }

    #[test]
    fn initial_weights_in_range() {
        let n = network(&[4, 6, 3], 0.1);
        for (_, &w) in n.weights().iter() {
            assert!(w >= WEIGHT_LOW && w < WEIGHT_HIGH, "weight {} out of range", w);
        }
    }

    #[test]
    fn edges_connect_adjacent_layers_only() {
        let n = network(&[2, 3, 3, 1], 0.1);
        for layer in 0..n.layer_count() {
            for neuron in n.layer(layer).unwrap() {
                assert!(neuron.in_edges().iter().all(|k| k.dest_layer() == layer));
                assert!(neuron.out_edges().iter().all(|k| k.layer == layer));
            }
        }
    }

    #[test]
    fn bias_neurons_are_never_destinations() {
        let n = network(&[2, 3, 1], 0.1);
        for (key, _) in n.weights().iter() {
            assert!(!n.is_bias(key.dest_layer(), key.dest));
        }
        for layer in 0..2 {
            let bias = n.layer(layer).unwrap().last().unwrap();
            assert!(bias.is_bias());
            assert!(bias.in_edges().is_empty());
            assert!(!bias.out_edges().is_empty());
        }
    }

    #[test]
    fn same_seed_same_weights() {
        let a = network(&[2, 3, 1], 0.1);
        let b = network(&[2, 3, 1], 0.1);
        assert!(a.weights().iter().eq(b.weights().iter()));
    }

    #[test]
    fn explicit_rng() {
        let config = NetworkConfig::new(&[2, 3, 1], 0.1);
        let a = Network::with_rng(&config, &mut StdRng::seed_from_u64(3)).unwrap();
        let b = Network::with_rng(&config, &mut StdRng::seed_from_u64(3)).unwrap();
        assert!(a.weights().iter().eq(b.weights().iter()));
    }

    #[test]
    fn wrong_input_size() {
        let mut n = network(&[2, 3, 1], 0.1);
        assert_eq!(
            n.calculate(&[1.0]).unwrap_err(),
            Error::mismatch("input", 2, 1)
        );
    }

    #[test]
    fn wrong_target_size() {
        let mut n = network(&[2, 3, 1], 0.1);
        n.calculate(&[1.0, 0.0]).unwrap();
        assert!(n.back_propagation(&[1.0, 0.0]).is_err());
    }

    #[test]
    fn forward_is_deterministic() {
        let mut n = network(&[2, 4, 3], 0.1);
        let first = n.calculate(&[0.3, 0.7]).unwrap();
        n.calculate(&[0.9, 0.1]).unwrap();
        let second = n.calculate(&[0.3, 0.7]).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
        assert!(first.iter().all(|&y| y > 0.0 && y < 1.0));
    }

    #[test]
    fn bias_output_is_constant() {
        let mut n = network(&[2, 3, 2, 1], 0.5);
        for i in 0..50 {
            let x = i as f64 / 50.0;
            n.calculate(&[x, 1.0 - x]).unwrap();
            n.back_propagation(&[x]).unwrap();
            for layer in 0..3 {
                assert_eq!(n.layer(layer).unwrap().last().unwrap().out(), BIAS_OUTPUT);
            }
        }
    }

    #[test]
    fn set_weight_requires_existing_edge() {
        let mut n = network(&[1, 1, 1], 0.1);
        assert!(n.set_weight(EdgeKey::new(0, 0, 0), 0.2).is_ok());
        assert_eq!(n.weight(&EdgeKey::new(0, 0, 0)), Some(0.2));
        assert!(n.set_weight(EdgeKey::new(0, 0, 1), 0.2).is_err());
        assert_eq!(n.weight(&EdgeKey::new(0, 0, 1)), None);
    }

    #[test]
    fn backprop_changes_weights() {
        let mut n = network(&[2, 3, 1], 0.3);
        let before = n.weights().clone();
        n.calculate(&[1.0, 0.0]).unwrap();
        n.back_propagation(&[0.0]).unwrap();
        assert!(n
            .weights()
            .iter()
            .zip(before.iter())
            .any(|((_, a), (_, b))| a != b));
    }

    #[test]
    fn single_step_by_hand() {
        let eta = 0.5;
        let mut n = network(&[1, 1, 1], eta);
        let keys = [
            EdgeKey::new(0, 0, 0),
            EdgeKey::new(0, 1, 0),
            EdgeKey::new(1, 0, 0),
            EdgeKey::new(1, 1, 0),
        ];
        for &key in &keys {
            n.set_weight(key, 0.5).unwrap();
        }
        let out = n.calculate(&[1.0]).unwrap()[0];
        let h = sigmoid(1.0);
        assert_abs_diff_eq!(out, sigmoid(0.5 * h + 0.5), epsilon = 1e-12);

        assert!(!n.back_propagation(&[0.0]).unwrap());

        let sigma_out = -(0.0 - out) * out * (1.0 - out);
        // hidden sigma uses the output edge weight from before this step
        let sigma_hidden = h * (1.0 - h) * sigma_out * 0.5;
        let expected = [
            0.5 - sigma_hidden * eta * 1.0,
            0.5 - sigma_hidden * eta * BIAS_OUTPUT,
            0.5 - sigma_out * eta * h,
            0.5 - sigma_out * eta * BIAS_OUTPUT,
        ];
        for (key, want) in keys.iter().zip(&expected) {
            assert_abs_diff_eq!(n.weight(key).unwrap(), *want, epsilon = 1e-12);
        }
    }

    #[test]
    fn convergence_check_uses_previous_outputs() {
        let config = NetworkConfig::new(&[1, 2, 1], 0.1).acceptable_error(1.0).seed(5);
        let mut n = Network::new(&config).unwrap();
        n.calculate(&[0.5]).unwrap();
        assert!(n.back_propagation(&[0.5]).unwrap());

        let config = NetworkConfig::new(&[1, 2, 1], 0.1).acceptable_error(1e-9).seed(5);
        let mut n = Network::new(&config).unwrap();
        n.calculate(&[0.5]).unwrap();
        let before = n.weights().clone();
        assert!(!n.back_propagation(&[0.0]).unwrap());
        assert!(n
            .weights()
            .iter()
            .zip(before.iter())
            .any(|((_, a), (_, b))| a != b));
    }

    #[test]
    fn converged_step_still_updates() {
        let config = NetworkConfig::new(&[1, 2, 1], 0.5).acceptable_error(0.9).seed(9);
        let mut n = Network::new(&config).unwrap();
        let out = n.calculate(&[1.0]).unwrap()[0];
        let before = n.weights().clone();
        let target = (out - 0.5).max(0.0);
        assert!(n.back_propagation(&[target]).unwrap());
        assert!(n
            .weights()
            .iter()
            .zip(before.iter())
            .any(|((_, a), (_, b))| a != b));
    }
}
