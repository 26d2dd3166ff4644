//! Utilities for training neural networks.

use std::time::{Duration, Instant};

use tracing::info;

use crate::dataset::DataSource;
use crate::error::{check_len, Error, Result};

/// Makes a model trainable by online gradient descent.
///
/// Training alternates one `forward` and one `backward` call per example;
/// `backward` relies on the state left behind by the preceding `forward`.
pub trait Trainable {
    /// Width of every input vector.
    fn input_len(&self) -> usize;

    /// Width of every target vector.
    fn output_len(&self) -> usize;

    /// Feeds `input` through the model, returning its outputs.
    fn forward(&mut self, input: &[f64]) -> Result<Vec<f64>>;

    /// Corrects the model towards `target`. Returns true if the outputs of the
    /// last forward pass were already acceptable.
    fn backward(&mut self, target: &[f64]) -> Result<bool>;
}

/// A builder for training runs.
#[derive(Copy, Clone, Debug)]
pub struct Trainer {
    logging: Logging,
    stop_condition: StopCondition,
}

impl Trainer {
    /// Creates a new Trainer instance.
    ///
    /// The trainer is initialized with some default values. These defaults are:
    ///
    /// * Runs exactly 1000 epochs.
    /// * Logs on training completion.
    pub fn new() -> Self {
        Trainer {
            logging: Logging::Completion,
            stop_condition: StopCondition::Epochs(1000),
        }
    }

    /// Runs exactly `epochs` passes over the data.
    pub fn epochs(self, epochs: usize) -> Self {
        self.stop_condition(StopCondition::Epochs(epochs))
    }

    /// Sets the type of logging to be emitted during training.
    pub fn logging(mut self, logging: Logging) -> Self {
        self.logging = logging;
        self
    }

    /// Sets the condition to finish training.
    pub fn stop_condition(mut self, condition: StopCondition) -> Self {
        self.stop_condition = condition;
        self
    }

    /// Trains `model` in place on parallel `inputs` and `targets`, visiting
    /// the examples in order once per epoch.
    pub fn train<T, I, O>(
        &self,
        model: &mut T,
        inputs: &[I],
        targets: &[O],
    ) -> Result<TrainingStats>
    where
        T: Trainable,
        I: AsRef<[f64]>,
        O: AsRef<[f64]>,
    {
        validate(model, inputs, targets)?;

        let start_time = Instant::now();
        let mut stats = TrainingStats::default();
        while stats.epochs < self.stop_condition.max_epochs() {
            let mut training_error = 0.0;
            let mut converged = true;
            for (input, target) in inputs.iter().zip(targets) {
                let target = target.as_ref();
                let start = Instant::now();
                let outputs = model.forward(input.as_ref())?;
                let end = Instant::now();
                stats.forward_time += end - start;

                converged &= model.backward(target)?;
                stats.backprop_time += end.elapsed();
                training_error += mean_square_error(&outputs, target);
            }
            stats.epochs += 1;
            stats.converged = converged;
            stats.training_error = training_error / (2.0 * inputs.len() as f64);

            self.logging.epoch(stats.epochs, stats.training_error);
            if self.stop_condition.should_stop(stats.epochs, converged) {
                break;
            }
        }
        stats.total_time = start_time.elapsed();
        self.logging.completion(&stats);
        Ok(stats)
    }

    /// Trains `model` on the normalized examples of a dataset.
    pub fn train_dataset<T, D>(&self, model: &mut T, data: &D) -> Result<TrainingStats>
    where
        T: Trainable,
        D: DataSource + ?Sized,
    {
        let (inputs, outputs) = data.normalized_data()?;
        self.train(model, &inputs, &outputs)
    }
}

impl Default for Trainer {
    fn default() -> Self {
        Trainer::new()
    }
}

/// Verifies that the training data matches the model, returning an error if
/// something is wrong.
fn validate<T, I, O>(model: &T, inputs: &[I], targets: &[O]) -> Result<()>
where
    T: Trainable,
    I: AsRef<[f64]>,
    O: AsRef<[f64]>,
{
    if inputs.is_empty() {
        return Err(Error::EmptyDataset);
    }
    check_len("targets", inputs.len(), targets.len())?;
    for (input, target) in inputs.iter().zip(targets) {
        check_len("input", model.input_len(), input.as_ref().len())?;
        check_len("target", model.output_len(), target.as_ref().len())?;
    }
    Ok(())
}

/// Timing and error figures from a finished training run.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct TrainingStats {
    /// Number of epochs run.
    pub epochs: usize,
    /// Whether every example of the final epoch was already within the
    /// acceptable error before its update.
    pub converged: bool,
    /// Half the mean squared error of the final epoch.
    pub training_error: f64,
    pub forward_time: Duration,
    pub backprop_time: Duration,
    pub total_time: Duration,
}

impl TrainingStats {
    fn share(&self, part: Duration) -> f64 {
        let total = self.total_time.as_secs_f64();
        if total > 0.0 {
            100.0 * part.as_secs_f64() / total
        } else {
            0.0
        }
    }
}

/// Logging frequency to use during training
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Logging {
    /// No logs will be emitted
    Silent,
    /// A summary will be emitted at completion
    Completion,
    /// A summary will be emitted after every `n` epochs
    Epochs(usize),
}

impl Logging {
    /// Performs logging at the current `epoch` of training.
    fn epoch(&self, epoch: usize, training_error: f64) {
        if let Logging::Epochs(freq) = *self {
            if freq > 0 && epoch % freq == 0 {
                info!(epoch, mse = training_error, "training");
            }
        }
    }

    /// Performs logging at the end of training.
    fn completion(&self, stats: &TrainingStats) {
        if let Logging::Silent = self {
            return;
        }
        info!(
            epochs = stats.epochs,
            converged = stats.converged,
            mse = stats.training_error,
            "training finished in {:.3}s (forward {:.3}s, {:.1}%; backprop {:.3}s, {:.1}%)",
            stats.total_time.as_secs_f64(),
            stats.forward_time.as_secs_f64(),
            stats.share(stats.forward_time),
            stats.backprop_time.as_secs_f64(),
            stats.share(stats.backprop_time)
        );
    }
}

/// When to stop training
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum StopCondition {
    /// Stops after exactly the provided number of epochs
    Epochs(usize),
    /// Stops after the first epoch in which every example was already within
    /// the acceptable error, or after `max_epochs`
    Converged { max_epochs: usize },
}

impl StopCondition {
    fn max_epochs(&self) -> usize {
        match *self {
            StopCondition::Epochs(epochs) => epochs,
            StopCondition::Converged { max_epochs } => max_epochs,
        }
    }

    /// Returns true if training is complete.
    fn should_stop(&self, epoch: usize, converged: bool) -> bool {
        match *self {
            StopCondition::Epochs(epochs) => epoch >= epochs,
            StopCondition::Converged { max_epochs } => converged || epoch >= max_epochs,
        }
    }
}

/// Computes the mean squared error between `actual` and `expected`.
fn mean_square_error(actual: &[f64], expected: &[f64]) -> f64 {
    let error: f64 = actual
        .iter()
        .zip(expected)
        .map(|(a, e)| (a - e) * (a - e))
        .sum();
    error / actual.len() as f64
}
