//! Error types for the queue, configuration, task processing, and the pool.

use thiserror::Error;

use crate::types::{TaskId, WorkerId};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueueError {
    /// The queue no longer accepts work; the rejected task is handed back.
    #[error("task queue is closed (rejected task {0})")]
    Closed(TaskId),
    #[error("task queue is full (rejected task {0})")]
    Full(TaskId),
    #[error("task queue was already closed")]
    AlreadyClosed,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("worker count must be greater than 0")]
    NoWorkers,
    #[error("queue capacity ({capacity}) must be at least the task count ({tasks})")]
    QueueTooSmall { capacity: usize, tasks: u64 },
    #[error("failure interval must be greater than 0")]
    ZeroFailInterval,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TaskError {
    #[error("injected failure for task {task}")]
    Injected { task: TaskId },
}

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("failed to seed task queue: {0}")]
    Queue(#[from] QueueError),
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("worker {worker} panicked")]
    WorkerPanicked { worker: WorkerId },
    #[error("results aggregator panicked")]
    AggregatorPanicked,
}
