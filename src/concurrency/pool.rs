use std::any::Any;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{mpsc, Arc};
use std::thread::{self, JoinHandle};

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::concurrency::queue::BoundedQueue;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// A task that did not produce its value, either because it panicked or
/// because it was dropped before a worker picked it up.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("task failed: {message}")]
pub struct TaskFailure {
    message: String,
}

impl TaskFailure {
    pub fn new(message: impl Into<String>) -> Self {
        TaskFailure { message: message.into() }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let reason = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic payload".to_string()
        };
        TaskFailure::new(format!("panicked: {reason}"))
    }
}

/// Completion handle for one submitted task.
pub struct TaskHandle<R> {
    rx: mpsc::Receiver<Result<R, TaskFailure>>,
}

impl<R> TaskHandle<R> {
    /// Blocks until the task has run and returns its value or its failure.
    pub fn wait(self) -> Result<R, TaskFailure> {
        self.rx
            .recv()
            .unwrap_or_else(|_| Err(TaskFailure::new("task was dropped before it ran")))
    }
}

/// Sizing of a [`WorkerPool`].
///
/// - `workers`        — number of OS threads draining the queue
/// - `queue_capacity` — how many tasks may wait before `submit` blocks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    pub workers: usize,
    pub queue_capacity: usize,
}

impl PoolConfig {
    pub fn new(workers: usize, queue_capacity: usize) -> Self {
        PoolConfig { workers, queue_capacity }
    }

    /// `workers` threads with a queue twice as deep.
    pub fn with_workers(workers: usize) -> Self {
        PoolConfig::new(workers, workers.max(1) * 2)
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        let workers = thread::available_parallelism().map(|n| n.get()).unwrap_or(4);
        PoolConfig::with_workers(workers)
    }
}

/// A fixed set of worker threads draining one [`BoundedQueue`].
///
/// The pool lives as long as its owner. Dropping it closes the queue, lets the
/// workers finish every task already queued, and joins all of them.
pub struct WorkerPool {
    queue: Arc<BoundedQueue<Job>>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawns `config.workers` threads sharing a queue of `config.queue_capacity` slots.
    ///
    /// # Errors
    /// `InvalidInput` if either size is zero; otherwise any failure to spawn a thread.
    pub fn new(config: PoolConfig) -> io::Result<WorkerPool> {
        if config.workers == 0 || config.queue_capacity == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "worker pool needs at least one worker and one queue slot, got {} and {}",
                    config.workers, config.queue_capacity
                ),
            ));
        }
        let queue = Arc::new(BoundedQueue::new(config.queue_capacity));

        let mut workers = Vec::with_capacity(config.workers);
        for id in 0..config.workers {
            let queue = Arc::clone(&queue);
            let handle = thread::Builder::new()
                .name(format!("glyph-worker-{id}"))
                .spawn(move || worker_loop(id, &queue))?;
            workers.push(handle);
        }
        debug!(
            "worker pool started: {} workers, queue capacity {}",
            config.workers, config.queue_capacity
        );

        Ok(WorkerPool { queue, workers })
    }

    pub fn workers(&self) -> usize {
        self.workers.len()
    }

    /// Queues `task`, blocking while the queue is full.
    pub fn submit<F, R>(&self, task: F) -> TaskHandle<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let (job, handle) = package(task);
        // A rejected job is dropped here, which the handle reports as a failure.
        let _ = self.queue.push(job);
        handle
    }

    /// Queues `task` only if a slot is free right now.
    pub fn try_submit<F, R>(&self, task: F) -> Option<TaskHandle<R>>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let (job, handle) = package(task);
        self.queue.try_push(job).ok().map(|()| handle)
    }

    /// Queues `task` without a completion handle. A panic is logged and swallowed.
    pub fn execute<F>(&self, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let job: Job = Box::new(move || {
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(task)) {
                warn!("{}", TaskFailure::from_panic(payload));
            }
        });
        let _ = self.queue.push(job);
    }

    /// Runs every task on the pool and blocks until all of them have finished.
    ///
    /// Results come back in submission order. Must not be called from inside a
    /// task running on this same pool.
    pub fn join_all<I, F, R>(&self, tasks: I) -> Vec<Result<R, TaskFailure>>
    where
        I: IntoIterator<Item = F>,
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let handles: Vec<TaskHandle<R>> = tasks.into_iter().map(|task| self.submit(task)).collect();
        handles.into_iter().map(TaskHandle::wait).collect()
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.queue.shutdown();
        for (id, worker) in self.workers.drain(..).enumerate() {
            if worker.join().is_err() && !thread::panicking() {
                panic!("worker {id} terminated abnormally and could not be joined");
            }
        }
        debug!("worker pool joined");
    }
}

fn worker_loop(id: usize, queue: &BoundedQueue<Job>) {
    while let Some(job) = queue.pop() {
        job();
    }
    debug!("worker {id} exiting");
}

fn package<F, R>(task: F) -> (Job, TaskHandle<R>)
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    let (tx, rx) = mpsc::sync_channel(1);
    let job: Job = Box::new(move || {
        let outcome = panic::catch_unwind(AssertUnwindSafe(task)).map_err(TaskFailure::from_panic);
        let _ = tx.send(outcome);
    });
    (job, TaskHandle { rx })
}
