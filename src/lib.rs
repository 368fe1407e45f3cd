//! A layered neural graph for classifying glyph images.
//!
//! Input grid → dense hidden layers → one output per class, evaluated lazily
//! with per-neuron memoized energies and errors, trained one sample at a time,
//! and parallelized inside each layer on a bounded-queue worker pool.

pub mod activation;
pub mod concurrency;
pub mod error;
pub mod layers;
pub mod loss;
pub mod network;
pub mod optim;
pub mod persist;
pub mod train;

// Convenience re-exports
pub use activation::activation::ActivationFunction;
pub use concurrency::{BoundedQueue, PoolConfig, TaskFailure, TaskHandle, WorkerPool};
pub use error::{NetError, Result};
pub use layers::{NeuronRef, NodeRef};
pub use network::network::Network;
pub use network::spec::TopologySpec;
pub use train::{TrainConfig, TrainReport, TrainingLoop};
