//! The unit of work a worker performs for each task.

use std::thread;
use std::time::Duration;

use crate::error::TaskError;
use crate::types::{TaskId, TaskResult, WorkerId};

/// Processes one task on behalf of a worker.
///
/// Implementations run on worker threads and must not touch the results
/// collection themselves; the worker records whatever they return.
pub trait TaskProcessor: Send + Sync {
    fn process(&self, worker: WorkerId, task: TaskId) -> Result<TaskResult, TaskError>;
}

impl<F> TaskProcessor for F
where
    F: Fn(WorkerId, TaskId) -> Result<TaskResult, TaskError> + Send + Sync,
{
    fn process(&self, worker: WorkerId, task: TaskId) -> Result<TaskResult, TaskError> {
        self(worker, task)
    }
}

/// Sleeps for a fixed delay, then reports the task as completed.
///
/// With `fail_every = Some(n)`, every task whose id is a multiple of `n`
/// fails after the delay instead.
#[derive(Clone, Debug)]
pub struct SimulatedWork {
    delay: Duration,
    fail_every: Option<u64>,
}

impl SimulatedWork {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            fail_every: None,
        }
    }

    pub fn failing_every(mut self, interval: Option<u64>) -> Self {
        self.fail_every = interval.filter(|&n| n > 0);
        self
    }
}

impl TaskProcessor for SimulatedWork {
    fn process(&self, worker: WorkerId, task: TaskId) -> Result<TaskResult, TaskError> {
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
        match self.fail_every {
            Some(n) if task % n == 0 => Err(TaskError::Injected { task }),
            _ => Ok(TaskResult::new(worker, task)),
        }
    }
}
