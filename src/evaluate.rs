//! Measuring how well a trained network reproduces known examples.
//!
//! Evaluation only runs forward passes. Edge weights are never modified.

use itertools::izip;
use tracing::{debug, info};

use crate::dataset::{DataSource, Normalizer};
use crate::error::{check_len, Error, Result};
use crate::feed_forward::Network;

/// The outcome of testing a single example.
#[derive(Clone, Debug, PartialEq)]
pub struct ExampleReport {
    pub outputs: Vec<f64>,
    /// Absolute error of each output.
    pub errors: Vec<f64>,
    pub mean_error: f64,
}

/// Runs `input` through `network` and compares the outputs with `target`.
pub fn test_example(network: &mut Network, input: &[f64], target: &[f64]) -> Result<ExampleReport> {
    check_len("target", network.output_len(), target.len())?;
    let outputs = network.calculate(input)?;
    let errors: Vec<f64> = outputs
        .iter()
        .zip(target)
        .map(|(y, t)| (t - y).abs())
        .collect();
    let mean_error = mean(&errors);
    for (i, (y, t, e)) in izip!(&outputs, target, &errors).enumerate() {
        debug!(output = i, value = y, expected = t, error = e, "tested example");
    }
    Ok(ExampleReport {
        outputs,
        errors,
        mean_error,
    })
}

/// Error spread over a sequence of single-example tests.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CurveReport {
    pub mean_error: f64,
    pub min_error: f64,
    pub max_error: f64,
}

impl CurveReport {
    /// Half the distance between the best and worst example.
    pub fn span(&self) -> f64 {
        (self.max_error - self.min_error) / 2.0
    }
}

/// Tests every `(inputs[i], targets[i])` pair and summarizes their mean errors.
pub fn test_curve<I, O>(network: &mut Network, inputs: &[I], targets: &[O]) -> Result<CurveReport>
where
    I: AsRef<[f64]>,
    O: AsRef<[f64]>,
{
    if inputs.is_empty() {
        return Err(Error::EmptyDataset);
    }
    check_len("targets", inputs.len(), targets.len())?;
    let mut total = 0.0;
    let mut min_error = f64::INFINITY;
    let mut max_error = f64::NEG_INFINITY;
    for (input, target) in inputs.iter().zip(targets) {
        let error = test_example(network, input.as_ref(), target.as_ref())?.mean_error;
        total += error;
        min_error = min_error.min(error);
        max_error = max_error.max(error);
    }
    let report = CurveReport {
        mean_error: total / inputs.len() as f64,
        min_error,
        max_error,
    };
    info!(
        total = report.mean_error,
        min = report.min_error,
        max = report.max_error,
        span = report.span(),
        "tested curve"
    );
    Ok(report)
}

/// The outcome of testing a whole labelled dataset.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DatasetReport {
    pub examples: usize,
    /// Mean over examples of each example's mean absolute output error.
    pub total_error: f64,
    /// Outputs whose predicted label differs from the target label.
    pub mislabel_count: usize,
    /// `mislabel_count` per example.
    pub mislabel_rate: f64,
    /// Confidence of the wrongly predicted labels, per example.
    pub mislabel_error: f64,
}

/// Tests `network` against every example of `data`, translating outputs back
/// into labels through the dataset's normalizer.
pub fn test_dataset<D>(network: &mut Network, data: &D) -> Result<DatasetReport>
where
    D: DataSource + ?Sized,
{
    let (inputs, targets) = data.normalized_data()?;
    if inputs.is_empty() {
        return Err(Error::EmptyDataset);
    }
    let normalizer = data.normalizer();
    let attributes = data.output_attributes();

    let mut total_error = 0.0;
    let mut mislabel_count = 0;
    let mut mislabel_error = 0.0;
    for (input, target) in inputs.iter().zip(&targets) {
        let report = test_example(network, input, target)?;
        let predicted = normalizer.undo_normalize(&attributes, &report.outputs)?;
        let expected = normalizer.undo_normalize(&attributes, target)?;
        for (y, (confidence, label), (_, wanted)) in izip!(&report.outputs, &predicted, &expected) {
            if label != wanted {
                mislabel_count += 1;
                mislabel_error += confidence;
            }
            debug!(
                value = y,
                label = %label,
                confidence,
                expected = %wanted,
                "labelled output"
            );
        }
        total_error += report.mean_error;
    }

    let examples = inputs.len();
    let report = DatasetReport {
        examples,
        total_error: total_error / examples as f64,
        mislabel_count,
        mislabel_rate: mislabel_count as f64 / examples as f64,
        mislabel_error: mislabel_error / examples as f64,
    };
    info!(
        total_error = report.total_error,
        mislabel_count = report.mislabel_count,
        mislabel_rate = report.mislabel_rate,
        mislabel_error = report.mislabel_error,
        "tested dataset"
    );
    Ok(report)
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}
