use crate::edge::EdgeKey;

/// Output of every bias neuron.
pub const BIAS_OUTPUT: f64 = 1.0;

/// A single node of the network graph.
///
/// Weights live in the network's `WeightTable`; a neuron only records the keys
/// of the edges that enter and leave it.
#[derive(Clone, Debug)]
pub struct Neuron {
    out: f64,
    bias: bool,
    in_edges: Vec<EdgeKey>,
    out_edges: Vec<EdgeKey>,
}

impl Neuron {
    /// A computed neuron with no edges yet.
    pub fn new() -> Self {
        Neuron {
            out: 0.0,
            bias: false,
            in_edges: Vec::new(),
            out_edges: Vec::new(),
        }
    }

    /// A neuron whose output is pinned to `BIAS_OUTPUT`.
    pub fn bias() -> Self {
        Neuron {
            out: BIAS_OUTPUT,
            bias: true,
            ..Neuron::new()
        }
    }

    /// Returns true for a bias neuron.
    pub fn is_bias(&self) -> bool {
        self.bias
    }

    /// The output from the latest forward pass.
    pub fn out(&self) -> f64 {
        self.out
    }

    /// Sets the output. Bias outputs never change.
    pub fn set_out(&mut self, out: f64) {
        if !self.bias {
            self.out = out;
        }
    }

    /// Keys of the edges entering this neuron.
    pub fn in_edges(&self) -> &[EdgeKey] {
        &self.in_edges
    }

    /// Keys of the edges leaving this neuron.
    pub fn out_edges(&self) -> &[EdgeKey] {
        &self.out_edges
    }

    pub(crate) fn add_in_edge(&mut self, key: EdgeKey) {
        self.in_edges.push(key);
    }

    pub(crate) fn add_out_edge(&mut self, key: EdgeKey) {
        self.out_edges.push(key);
    }
}

impl Default for Neuron {
    fn default() -> Self {
        Neuron::new()
    }
}
