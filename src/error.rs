//! Error types shared by every learner in the crate.

use thiserror::Error;

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while building, training or querying a learner.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// A network needs an input layer, at least one hidden layer, and an
    /// output layer.
    #[error("a network needs at least 3 layers, got {layers}")]
    TooFewLayers { layers: usize },

    #[error("layer {layer} has no neurons")]
    EmptyLayer { layer: usize },

    /// A vector or collection does not have the width the model expects.
    #[error("{what}: expected length {expected}, got {actual}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("dataset is empty")]
    EmptyDataset,

    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("unknown attribute `{0}`")]
    UnknownAttribute(String),

    #[error("attribute `{0}` is not nominal")]
    NotNominal(String),

    #[error("value `{value}` is not valid for attribute `{attribute}`")]
    InvalidValue { attribute: String, value: String },

    /// `classify` was called before `learn`.
    #[error("model has not been trained")]
    NotTrained,

    #[error("expected {expected} parameters")]
    ParameterMismatch { expected: &'static str },
}

impl Error {
    pub(crate) fn mismatch(what: &'static str, expected: usize, actual: usize) -> Self {
        Error::DimensionMismatch {
            what,
            expected,
            actual,
        }
    }
}

/// Returns a `DimensionMismatch` error unless `actual == expected`.
pub(crate) fn check_len(what: &'static str, expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(Error::mismatch(what, expected, actual))
    }
}
