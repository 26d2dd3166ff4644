//! The [sigmoid](https://en.wikipedia.org/wiki/Sigmoid_function) activation
//! function used by every computed neuron.

/// Evaluates `f(x) = 1 / (1 + e^-x)`.
pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Evaluates the derivative `f'(x)`, where `x = f^{-1}(y)`.
///
/// Note that this function takes in the *output* of the activation function,
/// rather than the input, so the weighted sums never have to be kept around
/// after the forward pass.
pub fn sigmoid_prime(y: f64) -> f64 {
    y * (1.0 - y)
}
