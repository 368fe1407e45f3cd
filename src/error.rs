use std::io;

use thiserror::Error;

use crate::concurrency::pool::TaskFailure;

/// The result type used across the crate.
pub type Result<T> = std::result::Result<T, NetError>;

/// Everything that can go wrong while building, running, training or persisting a network.
#[derive(Debug, Error)]
pub enum NetError {
    /// Opening, reading or writing a model or config file failed.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    /// The persisted stream ended before the declared topology was filled.
    #[error("model stream holds {read} scalars, topology requires {expected}")]
    FormatMismatch { expected: usize, read: usize },

    /// The topology configuration was rejected before anything was allocated.
    #[error("invalid topology: {0}")]
    InvalidTopology(String),

    #[error("sample has {got} values, expected {expected}")]
    SampleSize { got: usize, expected: usize },

    #[error("sample value at position {index} is not finite")]
    NonFiniteSample { index: usize },

    #[error("class index {class} is out of range for {classes} outputs")]
    ClassOutOfRange { class: usize, classes: usize },

    /// A neuron's weighted sum diverged; raised from inside a worker task.
    #[error("neuron {index} of layer {layer} produced a non-finite energy")]
    NonFiniteEnergy { layer: usize, index: usize },

    /// The backward pass was requested before output `index` received a teaching signal.
    #[error("output {index} has no teaching signal")]
    Untaught { index: usize },

    #[error(transparent)]
    Task(#[from] TaskFailure),

    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),
}
