//! Bounded, closable FIFO task queue shared by every worker.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard};

use crate::error::QueueError;
use crate::types::TaskId;

// Upper bound on slots reserved up front; `capacity` is only a limit.
const PREALLOC_LIMIT: usize = 1024;

/// A synchronized FIFO of task ids holding at most `capacity` pending tasks.
///
/// Consumers block in [`TaskQueue::pop_blocking_or_closed`] until a task is
/// available, and get `None` once the queue is both closed and empty.
pub struct TaskQueue {
    inner: Mutex<TaskQueueState>,
    available: Condvar,
    space: Condvar,
    capacity: usize,
}

struct TaskQueueState {
    queue: VecDeque<TaskId>,
    closed: bool,
}

impl TaskQueue {
    /// Create an empty queue. A capacity of zero is treated as one.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Mutex::new(TaskQueueState {
                queue: VecDeque::with_capacity(capacity.min(PREALLOC_LIMIT)),
                closed: false,
            }),
            available: Condvar::new(),
            space: Condvar::new(),
            capacity,
        }
    }

    fn state(&self) -> MutexGuard<'_, TaskQueueState> {
        self.inner.lock().expect("task queue mutex poisoned")
    }

    /// Push a task, blocking while the queue is full.
    ///
    /// The pool seeds with [`TaskQueue::try_push`] before any consumer
    /// exists, so only concurrent producers in tests block here.
    #[cfg(test)]
    pub fn push(&self, task: TaskId) -> Result<(), QueueError> {
        let mut guard = self.state();
        loop {
            if guard.closed {
                return Err(QueueError::Closed(task));
            }
            if guard.queue.len() < self.capacity {
                break;
            }
            guard = self.space.wait(guard).expect("condvar wait failed");
        }
        guard.queue.push_back(task);
        self.available.notify_one();
        Ok(())
    }

    /// Push without blocking; fails with [`QueueError::Full`] at capacity.
    pub fn try_push(&self, task: TaskId) -> Result<(), QueueError> {
        let mut guard = self.state();
        if guard.closed {
            return Err(QueueError::Closed(task));
        }
        if guard.queue.len() >= self.capacity {
            return Err(QueueError::Full(task));
        }
        guard.queue.push_back(task);
        self.available.notify_one();
        Ok(())
    }

    /// Try to pop immediately without blocking.
    pub fn try_pop(&self) -> Option<TaskId> {
        let mut guard = self.state();
        let task = guard.queue.pop_front();
        if task.is_some() {
            self.space.notify_one();
        }
        task
    }

    /// Block until a task is available or the queue is closed and drained.
    pub fn pop_blocking_or_closed(&self) -> Option<TaskId> {
        let mut guard = self.state();
        loop {
            if let Some(task) = guard.queue.pop_front() {
                self.space.notify_one();
                return Some(task);
            }
            if guard.closed {
                return None;
            }
            // Wait releases the lock and re-acquires it before returning.
            guard = self.available.wait(guard).expect("condvar wait failed");
        }
    }

    /// Close the queue and wake every blocked consumer and producer.
    ///
    /// Tasks already queued stay poppable. Closing twice is an error.
    pub fn close(&self) -> Result<(), QueueError> {
        let mut guard = self.state();
        if guard.closed {
            return Err(QueueError::AlreadyClosed);
        }
        guard.closed = true;
        self.available.notify_all();
        self.space.notify_all();
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.state().closed
    }

    /// Current number of queued tasks.
    pub fn len(&self) -> usize {
        self.state().queue.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
