pub mod pool;
pub mod queue;

pub use pool::{PoolConfig, TaskFailure, TaskHandle, WorkerPool};
pub use queue::BoundedQueue;
