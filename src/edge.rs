//! Directed, weighted connections between neurons in adjacent layers.

use std::collections::btree_map::{self, BTreeMap};
use std::ops::Index;

use serde_derive::{Deserialize, Serialize};

/// Identifies the connection from neuron `source` of layer `layer` to neuron
/// `dest` of layer `layer + 1`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EdgeKey {
    pub layer: usize,
    pub source: usize,
    pub dest: usize,
}

impl EdgeKey {
    /// Creates the key of the edge from `source` in `layer` to `dest` in the
    /// next layer.
    pub fn new(layer: usize, source: usize, dest: usize) -> Self {
        EdgeKey {
            layer,
            source,
            dest,
        }
    }

    /// The layer holding the destination neuron.
    pub fn dest_layer(&self) -> usize {
        self.layer + 1
    }
}

/// Every edge weight in the network, keyed by its `EdgeKey`.
///
/// Neurons only remember which keys touch them, so each weight has exactly one
/// stored copy and both endpoints always observe the same value.
#[derive(Clone, Debug, Default)]
pub struct WeightTable {
    weights: BTreeMap<EdgeKey, f64>,
}

impl WeightTable {
    /// Creates a table with no edges.
    pub fn new() -> Self {
        WeightTable::default()
    }

    /// Returns the weight of `key`, if the edge exists.
    pub fn get(&self, key: &EdgeKey) -> Option<f64> {
        self.weights.get(key).copied()
    }

    /// Sets the weight of `key`, returning the previous value if the edge
    /// already existed.
    pub fn set(&mut self, key: EdgeKey, weight: f64) -> Option<f64> {
        self.weights.insert(key, weight)
    }

    /// Returns true if the edge `key` exists.
    pub fn contains(&self, key: &EdgeKey) -> bool {
        self.weights.contains_key(key)
    }

    /// Number of edges.
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    /// Returns true if there are no edges.
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Counts the edges leaving layer `layer`.
    pub fn count_from_layer(&self, layer: usize) -> usize {
        self.layer_range(layer).count()
    }

    /// Iterates the edges leaving layer `layer` in key order.
    pub fn layer_range(&self, layer: usize) -> btree_map::Range<'_, EdgeKey, f64> {
        self.weights
            .range(EdgeKey::new(layer, 0, 0)..EdgeKey::new(layer + 1, 0, 0))
    }

    /// Iterates every edge in key order.
    pub fn iter(&self) -> btree_map::Iter<'_, EdgeKey, f64> {
        self.weights.iter()
    }
}

/// Reads the weight of an existing edge.
///
/// # Panics
///
/// Panics if the edge does not exist.
impl Index<&EdgeKey> for WeightTable {
    type Output = f64;

    fn index(&self, key: &EdgeKey) -> &f64 {
        &self.weights[key]
    }
}
