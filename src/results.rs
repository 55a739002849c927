//! Result sinks that collect worker outcomes into a single collection.
//!
//! Two strategies are provided. [`SharedResults`] keeps one `Vec` behind a
//! single mutex that every worker appends to. [`ResultChannel`] fans outcomes
//! in over a channel to an aggregator thread that owns the collection
//! outright, so no lock is taken on the results at all.

use std::sync::Mutex;
use std::thread;

use crossbeam::channel::{self, Receiver, Sender};

use crate::error::PoolError;
use crate::types::{TaskFailure, TaskId, TaskOutcome, TaskResult};

/// Destination for worker outcomes. Shared by every worker for a whole run.
pub trait ResultSink: Send + Sync {
    fn record(&self, outcome: TaskOutcome);
}

/// The final, single-owner collection read by the reporter.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Results {
    /// Completed tasks in the order they were recorded.
    pub completed: Vec<TaskResult>,
    pub failed: Vec<TaskFailure>,
}

impl Results {
    fn push(&mut self, outcome: TaskOutcome) {
        match outcome {
            TaskOutcome::Completed(result) => self.completed.push(result),
            TaskOutcome::Failed(failure) => self.failed.push(failure),
        }
    }

    /// Number of tasks accounted for, successful or not.
    pub fn len(&self) -> usize {
        self.completed.len() + self.failed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every task id seen, sorted ascending.
    pub fn task_ids(&self) -> Vec<TaskId> {
        let mut ids: Vec<TaskId> = self
            .completed
            .iter()
            .map(|r| r.task)
            .chain(self.failed.iter().map(|f| f.task))
            .collect();
        ids.sort_unstable();
        ids
    }
}

/// Lock-protected shared collection; one global mutex serializes appends.
#[derive(Default)]
pub struct SharedResults {
    inner: Mutex<Results>,
}

impl SharedResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the collection out, leaving it empty. Called after the barrier,
    /// when no writer can still be appending.
    pub fn take(&self) -> Results {
        std::mem::take(&mut *self.inner.lock().expect("results mutex poisoned"))
    }
}

impl ResultSink for SharedResults {
    fn record(&self, outcome: TaskOutcome) {
        // Guard drops at the end of this statement on every path.
        self.inner
            .lock()
            .expect("results mutex poisoned")
            .push(outcome);
    }
}

/// Sending half of the fan-in pipeline; cloned into the pool.
pub struct ResultChannel {
    tx: Sender<TaskOutcome>,
}

impl ResultSink for ResultChannel {
    fn record(&self, outcome: TaskOutcome) {
        // The aggregator only stops once every sender is gone, so this
        // cannot fail while `self` is alive.
        let _ = self.tx.send(outcome);
    }
}

/// Aggregator thread that owns the collection while workers run.
pub struct Aggregator {
    handle: thread::JoinHandle<Results>,
}

impl Aggregator {
    /// Spawn the aggregator and return the sink workers should write to.
    pub fn spawn() -> Result<(ResultChannel, Aggregator), PoolError> {
        let (tx, rx) = channel::unbounded();
        let handle = thread::Builder::new()
            .name("aggregator".to_string())
            .spawn(move || collect(rx))?;
        Ok((ResultChannel { tx }, Aggregator { handle }))
    }

    /// Wait for the collection. The matching [`ResultChannel`] must already
    /// be dropped, or this blocks forever.
    pub fn finish(self) -> Result<Results, PoolError> {
        self.handle
            .join()
            .map_err(|_| PoolError::AggregatorPanicked)
    }
}

fn collect(rx: Receiver<TaskOutcome>) -> Results {
    let mut results = Results::default();
    for outcome in rx {
        results.push(outcome);
    }
    tracing::debug!(count = results.len(), "aggregator drained");
    results
}
