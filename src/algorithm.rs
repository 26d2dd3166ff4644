//! The interface shared by every learner, so callers can swap algorithms over
//! the same tables.

use serde_derive::{Deserialize, Serialize};

use crate::config::{NetworkConfig, DEFAULT_ACCEPTABLE_ERROR};
use crate::dataset::{DataSource, Table, Usage, Value};
use crate::error::{check_len, Error, Result};
use crate::feed_forward::Network;
use crate::id3::{DecisionNode, Id3};
use crate::knn::{Distance, Knn};
use crate::trainer::{Logging, Trainer};

/// Settings for one of the learners.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Parameters {
    NeuralNetwork {
        /// Widths of the hidden layers. Input and output widths come from the
        /// table.
        hidden: Vec<usize>,
        learning_rate: f64,
        acceptable_error: f64,
        epochs: usize,
        seed: Option<u64>,
    },
    Knn {
        k: usize,
        distance: Distance,
        vote: bool,
    },
    Id3,
}

impl Parameters {
    /// A single hidden layer of `hidden` neurons trained for 1000 epochs.
    pub fn neural_network(hidden: usize, learning_rate: f64) -> Self {
        Parameters::NeuralNetwork {
            hidden: vec![hidden],
            learning_rate,
            acceptable_error: DEFAULT_ACCEPTABLE_ERROR,
            epochs: 1000,
            seed: None,
        }
    }
}

/// A supervised learner over `Table`s.
pub trait Algorithm {
    /// Applies `parameters`, which must be this learner's variant.
    fn setup(&mut self, parameters: &Parameters) -> Result<()>;

    /// Learns from every record of `data`.
    fn learn(&mut self, data: &Table) -> Result<()>;

    /// Predicts the output attribute values of `record`, in catalog order.
    fn classify(&mut self, record: &[Value]) -> Result<Vec<Value>>;
}

/// Builds the learner matching `parameters`.
pub fn from_parameters(parameters: &Parameters) -> Result<Box<dyn Algorithm>> {
    let mut algorithm: Box<dyn Algorithm> = match parameters {
        Parameters::NeuralNetwork { .. } => Box::new(NeuralNetworkLearner::default()),
        Parameters::Knn { .. } => Box::new(KnnLearner::default()),
        Parameters::Id3 => Box::new(Id3Learner::default()),
    };
    algorithm.setup(parameters)?;
    Ok(algorithm)
}

/// Returns the fraction of output values in `test` that `algorithm` predicts
/// exactly.
pub fn accuracy<A>(algorithm: &mut A, test: &Table) -> Result<f64>
where
    A: Algorithm + ?Sized,
{
    let outputs = test.columns_of(Usage::Output);
    if test.is_empty() || outputs.is_empty() {
        return Err(Error::EmptyDataset);
    }
    let mut correct = 0;
    for record in test.records() {
        let predicted = algorithm.classify(record)?;
        check_len("predictions", outputs.len(), predicted.len())?;
        correct += outputs
            .iter()
            .zip(&predicted)
            .filter(|&(&column, value)| record[column] == *value)
            .count();
    }
    Ok(correct as f64 / (test.len() * outputs.len()) as f64)
}

/// Keeps only the attribute catalog of `data`.
fn catalog(data: &Table) -> Table {
    Table::new(data.attributes().to_vec())
}

/// A feed-forward network trained on a table's normalized records.
#[derive(Debug)]
pub struct NeuralNetworkLearner {
    parameters: Parameters,
    model: Option<(Network, Table)>,
}

impl Default for NeuralNetworkLearner {
    fn default() -> Self {
        NeuralNetworkLearner {
            parameters: Parameters::neural_network(3, 0.1),
            model: None,
        }
    }
}

impl NeuralNetworkLearner {
    /// The trained network, once `learn` has run.
    pub fn network(&self) -> Option<&Network> {
        self.model.as_ref().map(|(network, _)| network)
    }
}

impl Algorithm for NeuralNetworkLearner {
    fn setup(&mut self, parameters: &Parameters) -> Result<()> {
        match parameters {
            Parameters::NeuralNetwork { .. } => {
                self.parameters = parameters.clone();
                self.model = None;
                Ok(())
            }
            _ => Err(Error::ParameterMismatch {
                expected: "neural network",
            }),
        }
    }

    fn learn(&mut self, data: &Table) -> Result<()> {
        let (hidden, learning_rate, acceptable_error, epochs, seed) = match &self.parameters {
            Parameters::NeuralNetwork {
                hidden,
                learning_rate,
                acceptable_error,
                epochs,
                seed,
            } => (hidden, *learning_rate, *acceptable_error, *epochs, *seed),
            _ => {
                return Err(Error::ParameterMismatch {
                    expected: "neural network",
                })
            }
        };
        let mut layers = vec![data.count_by_usage(Usage::Input)];
        layers.extend(hidden);
        layers.push(data.count_by_usage(Usage::Output));
        let mut config =
            NetworkConfig::new(&layers, learning_rate).acceptable_error(acceptable_error);
        config.seed = seed;

        let mut network = Network::new(&config)?;
        Trainer::new()
            .epochs(epochs)
            .logging(Logging::Completion)
            .train_dataset(&mut network, data)?;
        self.model = Some((network, catalog(data)));
        Ok(())
    }

    fn classify(&mut self, record: &[Value]) -> Result<Vec<Value>> {
        let (network, catalog) = self.model.as_mut().ok_or(Error::NotTrained)?;
        let input = catalog.encode(record, Usage::Input)?;
        let output = network.calculate(&input)?;
        catalog.decode_outputs(&output)
    }
}

/// k-nearest neighbours over a table's normalized records.
#[derive(Debug)]
pub struct KnnLearner {
    k: usize,
    distance: Distance,
    vote: bool,
    model: Option<(Knn, Table)>,
}

impl Default for KnnLearner {
    fn default() -> Self {
        KnnLearner {
            k: 3,
            distance: Distance::Euclidean,
            vote: true,
            model: None,
        }
    }
}

impl Algorithm for KnnLearner {
    fn setup(&mut self, parameters: &Parameters) -> Result<()> {
        match *parameters {
            Parameters::Knn { k, distance, vote } => {
                Knn::new(k, distance, vote)?;
                self.k = k;
                self.distance = distance;
                self.vote = vote;
                self.model = None;
                Ok(())
            }
            _ => Err(Error::ParameterMismatch { expected: "knn" }),
        }
    }

    fn learn(&mut self, data: &Table) -> Result<()> {
        let (inputs, outputs) = data.normalized_data()?;
        let mut knn = Knn::new(self.k, self.distance, self.vote)?;
        knn.fit(inputs, outputs)?;
        self.model = Some((knn, catalog(data)));
        Ok(())
    }

    fn classify(&mut self, record: &[Value]) -> Result<Vec<Value>> {
        let (knn, catalog) = self.model.as_ref().ok_or(Error::NotTrained)?;
        let query = catalog.encode(record, Usage::Input)?;
        catalog.decode_outputs(&knn.predict(&query)?)
    }
}

/// An ID3 tree predicting a table's single nominal output attribute.
#[derive(Debug, Default)]
pub struct Id3Learner {
    tree: Option<DecisionNode>,
}

impl Id3Learner {
    /// The learned tree, once `learn` has run.
    pub fn tree(&self) -> Option<&DecisionNode> {
        self.tree.as_ref()
    }
}

impl Algorithm for Id3Learner {
    fn setup(&mut self, parameters: &Parameters) -> Result<()> {
        match parameters {
            Parameters::Id3 => {
                self.tree = None;
                Ok(())
            }
            _ => Err(Error::ParameterMismatch { expected: "id3" }),
        }
    }

    fn learn(&mut self, data: &Table) -> Result<()> {
        let outputs = data.columns_of(Usage::Output);
        check_len("output attributes", 1, outputs.len())?;
        let class = &data.attributes()[outputs[0]].name;
        self.tree = Some(Id3::new(class).build(data)?);
        Ok(())
    }

    fn classify(&mut self, record: &[Value]) -> Result<Vec<Value>> {
        let tree = self.tree.as_ref().ok_or(Error::NotTrained)?;
        Ok(vec![Value::Nominal(tree.classify(record)?)])
    }
}
