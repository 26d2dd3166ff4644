//! Classical learners for small in-memory tables: a feed-forward neural
//! network trained by backpropagation, k-nearest neighbours, and ID3 decision
//! trees.

pub mod activator;
pub mod algorithm;
pub mod config;
pub mod dataset;
pub mod edge;
pub mod error;
pub mod evaluate;
pub mod feed_forward;
pub mod id3;
pub mod knn;
pub mod neuron;
pub mod trainer;

pub use crate::config::NetworkConfig;
pub use crate::error::{Error, Result};
pub use crate::feed_forward::Network;
pub use crate::trainer::{Logging, StopCondition, Trainer};
