//! [k-nearest neighbours](https://en.wikipedia.org/wiki/K-nearest_neighbors_algorithm)
//! over normalized vectors.

use itertools::Itertools;
use serde_derive::{Deserialize, Serialize};

use crate::error::{check_len, Error, Result};

/// Queries this close to a stored point return that point's output directly.
pub const TOLERANCE: f64 = 1e-10;

/// How far apart two points are.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Distance {
    Euclidean,
    Manhattan,
}

impl Distance {
    /// Measures the distance between two points of equal width.
    pub fn between(&self, a: &[f64], b: &[f64]) -> f64 {
        let pairs = a.iter().zip(b);
        match self {
            Distance::Euclidean => pairs.map(|(x, y)| (x - y) * (x - y)).sum::<f64>().sqrt(),
            Distance::Manhattan => pairs.map(|(x, y)| (x - y).abs()).sum(),
        }
    }
}

/// A lazy learner that remembers every example it was given.
#[derive(Clone, Debug)]
pub struct Knn {
    k: usize,
    distance: Distance,
    vote: bool,
    inputs: Vec<Vec<f64>>,
    outputs: Vec<Vec<f64>>,
}

impl Knn {
    /// Creates an empty model.
    ///
    /// Arguments:
    ///  * `k` - how many neighbours contribute to a prediction.
    ///  * `distance` - the metric used to rank neighbours.
    ///  * `vote` - return the most common neighbour output instead of the
    ///             mean of all neighbour outputs.
    pub fn new(k: usize, distance: Distance, vote: bool) -> Result<Self> {
        if k == 0 {
            return Err(Error::InvalidParameter {
                name: "k",
                reason: "must be at least 1".into(),
            });
        }
        Ok(Knn {
            k,
            distance,
            vote,
            inputs: Vec::new(),
            outputs: Vec::new(),
        })
    }

    /// How many neighbours contribute to a prediction.
    pub fn k(&self) -> usize {
        self.k
    }

    /// Number of stored examples.
    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    /// Returns true if no examples are stored.
    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    /// Replaces the stored examples with parallel `inputs` and `outputs`.
    pub fn fit(&mut self, inputs: Vec<Vec<f64>>, outputs: Vec<Vec<f64>>) -> Result<()> {
        check_len("outputs", inputs.len(), outputs.len())?;
        if let Some(first) = inputs.first() {
            for input in &inputs {
                check_len("input", first.len(), input.len())?;
            }
        }
        if let Some(first) = outputs.first() {
            for output in &outputs {
                check_len("output", first.len(), output.len())?;
            }
        }
        self.inputs = inputs;
        self.outputs = outputs;
        Ok(())
    }

    /// Predicts the output for `query`.
    pub fn predict(&self, query: &[f64]) -> Result<Vec<f64>> {
        let width = self.inputs.first().ok_or(Error::NotTrained)?.len();
        check_len("query", width, query.len())?;

        let nearest = self.nearest(query);
        if let Some(&(distance, index)) = nearest.first() {
            if distance < TOLERANCE {
                return Ok(self.outputs[index].clone());
            }
        }
        let neighbours = &nearest[..self.k.min(nearest.len())];
        if self.vote {
            Ok(self.most_common(neighbours))
        } else {
            Ok(self.average(neighbours))
        }
    }

    /// Ranks every stored point by distance from `query`, nearest first.
    fn nearest(&self, query: &[f64]) -> Vec<(f64, usize)> {
        self.inputs
            .iter()
            .map(|input| self.distance.between(input, query))
            .enumerate()
            .map(|(i, d)| (d, i))
            .sorted_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)))
            .collect()
    }

    fn average(&self, neighbours: &[(f64, usize)]) -> Vec<f64> {
        let mut sum = vec![0.0; self.outputs[0].len()];
        for &(_, i) in neighbours {
            for (s, y) in sum.iter_mut().zip(&self.outputs[i]) {
                *s += y;
            }
        }
        let n = neighbours.len() as f64;
        sum.into_iter().map(|s| s / n).collect()
    }

    /// Returns the output shared by the most neighbours. Ties go to the output
    /// of the nearer neighbour.
    fn most_common(&self, neighbours: &[(f64, usize)]) -> Vec<f64> {
        let mut best = neighbours[0].1;
        let mut best_count = 0;
        for &(_, i) in neighbours {
            let count = neighbours
                .iter()
                .filter(|&&(_, j)| self.outputs[j] == self.outputs[i])
                .count();
            if count > best_count {
                best = i;
                best_count = count;
            }
        }
        self.outputs[best].clone()
    }
}
