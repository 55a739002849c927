//! Shared identifiers and result records used across the pool.

use std::fmt;

/// Identifier of a task in the queue (1-based, assigned in ascending order).
pub type TaskId = u64;
/// Identifier of a worker thread (1-based).
pub type WorkerId = usize;

/// Completion record for one task, produced by the worker that processed it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaskResult {
    pub worker: WorkerId,
    pub task: TaskId,
}

impl TaskResult {
    pub fn new(worker: WorkerId, task: TaskId) -> Self {
        Self { worker, task }
    }
}

impl fmt::Display for TaskResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Worker {} completed task {}", self.worker, self.task)
    }
}

/// Record of a task whose processing returned an error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaskFailure {
    pub worker: WorkerId,
    pub task: TaskId,
    pub reason: String,
}

impl fmt::Display for TaskFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Worker {} failed task {}: {}",
            self.worker, self.task, self.reason
        )
    }
}

/// What a worker hands to the results sink after processing one task.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TaskOutcome {
    Completed(TaskResult),
    Failed(TaskFailure),
}

impl fmt::Display for TaskOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskOutcome::Completed(result) => result.fmt(f),
            TaskOutcome::Failed(failure) => failure.fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_text_matches_progress_line() {
        let result = TaskResult::new(3, 17);
        assert_eq!(result.to_string(), "Worker 3 completed task 17");
    }

    #[test]
    fn failure_text_includes_reason() {
        let failure = TaskFailure {
            worker: 2,
            task: 4,
            reason: "boom".to_string(),
        };
        assert_eq!(
            TaskOutcome::Failed(failure).to_string(),
            "Worker 2 failed task 4: boom"
        );
    }
}
