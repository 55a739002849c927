//! Worker loop: pull a task, process it, record the outcome.

use std::sync::Arc;

use crate::cancel::CancelToken;
use crate::processor::TaskProcessor;
use crate::results::ResultSink;
use crate::task_queue::TaskQueue;
use crate::types::{TaskFailure, TaskOutcome, WorkerId};

/// Why a worker left its consume loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExitReason {
    /// The queue was closed and empty.
    Drained,
    Cancelled,
}

/// What one worker did over its lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorkerSummary {
    pub worker: WorkerId,
    pub processed: usize,
    pub exit: ExitReason,
}

/// Everything a worker thread needs, bundled so the pool can move it in.
pub struct Worker {
    id: WorkerId,
    queue: Arc<TaskQueue>,
    processor: Arc<dyn TaskProcessor>,
    sink: Arc<dyn ResultSink>,
    cancel: CancelToken,
}

impl Worker {
    pub fn new(
        id: WorkerId,
        queue: Arc<TaskQueue>,
        processor: Arc<dyn TaskProcessor>,
        sink: Arc<dyn ResultSink>,
        cancel: CancelToken,
    ) -> Self {
        Self {
            id,
            queue,
            processor,
            sink,
            cancel,
        }
    }

    /// Consume tasks until the queue is exhausted or the run is cancelled.
    pub fn run(self) -> WorkerSummary {
        let id = self.id;
        tracing::debug!(worker = id, "worker started");
        let mut processed = 0usize;

        let exit = loop {
            if self.cancel.is_cancelled() {
                break ExitReason::Cancelled;
            }
            let Some(task) = self.queue.pop_blocking_or_closed() else {
                break ExitReason::Drained;
            };

            tracing::info!("Worker {id} started task {task}");
            let outcome = match self.processor.process(id, task) {
                Ok(result) => TaskOutcome::Completed(result),
                Err(err) => TaskOutcome::Failed(TaskFailure {
                    worker: id,
                    task,
                    reason: err.to_string(),
                }),
            };
            let line = outcome.to_string();
            let failed = matches!(outcome, TaskOutcome::Failed(_));
            self.sink.record(outcome);
            if failed {
                tracing::warn!("{line}");
            } else {
                tracing::info!("{line}");
            }
            processed += 1;
        };

        tracing::debug!(worker = id, processed, ?exit, "worker exited");
        WorkerSummary {
            worker: id,
            processed,
            exit,
        }
    }
}
