use std::f64::consts::PI;

use learners::evaluate;
use learners::{Logging, Network, NetworkConfig, Trainer};
use tracing::info;
use tracing_subscriber::EnvFilter;

type Examples = (Vec<Vec<f64>>, Vec<Vec<f64>>);

/// Samples one period of a sine wave, rescaled so that both the inputs and the
/// outputs lie in `[0, 1]`.
fn generate_sine(num_samples: usize) -> Examples {
    (0..num_samples)
        .map(|i| {
            let x = i as f64 * 2.0 * PI / num_samples as f64;
            (vec![x / (2.0 * PI)], vec![0.5 + 0.5 * x.sin()])
        })
        .unzip()
}

fn xor() -> learners::Result<()> {
    let inputs = [[0.0, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 1.0]];
    let targets = [[0.0], [1.0], [1.0], [0.0]];

    let mut network = Network::new(&NetworkConfig::new(&[2, 3, 1], 0.1))?;
    Trainer::new()
        .epochs(100_000)
        .logging(Logging::Epochs(10_000))
        .train(&mut network, &inputs, &targets)?;

    for (input, target) in inputs.iter().zip(&targets) {
        let report = evaluate::test_example(&mut network, input, target)?;
        info!(?input, output = report.outputs[0], error = report.mean_error, "xor");
    }
    Ok(())
}

fn sine() -> learners::Result<()> {
    let (inputs, targets) = generate_sine(50);
    let mut network = Network::new(&NetworkConfig::new(&[1, 3, 1], 0.6))?;
    Trainer::new()
        .epochs(1_000)
        .logging(Logging::Epochs(100))
        .train(&mut network, &inputs, &targets)?;

    let (test_inputs, test_targets) = generate_sine(200);
    evaluate::test_curve(&mut network, &test_inputs, &test_targets)?;
    Ok(())
}

fn main() -> learners::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    xor()?;
    sine()
}
