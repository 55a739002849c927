use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::error::ConfigError;

/// How worker outcomes reach the final results collection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum Aggregation {
    /// Workers send outcomes to an aggregator thread that owns the collection.
    #[default]
    Channel,
    /// Workers append to one shared collection behind a mutex.
    Mutex,
}

/// Command-line and environment settings. Every option defaults to the
/// classic demo: 20 tasks, 5 workers, one second of simulated work each.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "task_pool_demo",
    version,
    about = "A fixed worker pool draining a bounded task queue"
)]
pub struct CliArgs {
    /// Total number of tasks to enqueue (ids 1..=tasks).
    #[arg(long, env = "TASKPOOL_TASKS", default_value_t = 20)]
    pub tasks: u64,

    /// Number of worker threads in the pool.
    #[arg(long, env = "TASKPOOL_WORKERS", default_value_t = 5)]
    pub workers: usize,

    /// Simulated processing time per task, in milliseconds.
    #[arg(long, env = "TASKPOOL_DELAY_MS", default_value_t = 1000)]
    pub delay_ms: u64,

    /// Queue capacity. Defaults to the task count; must not be smaller.
    #[arg(long, env = "TASKPOOL_QUEUE_CAP")]
    pub queue_capacity: Option<usize>,

    /// Results aggregation strategy.
    #[arg(long, env = "TASKPOOL_AGGREGATION", value_enum, default_value_t = Aggregation::Channel)]
    pub aggregation: Aggregation,

    /// Fail every n-th task (by id) to exercise the failure path.
    #[arg(long, env = "TASKPOOL_FAIL_EVERY")]
    pub fail_every: Option<u64>,
}

/// Validated runtime configuration for one pool run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolConfig {
    pub tasks: u64,
    pub workers: usize,
    pub delay: Duration,
    pub queue_capacity: usize,
    pub aggregation: Aggregation,
    pub fail_every: Option<u64>,
}

#[cfg(test)]
impl PoolConfig {
    /// A config with the given sizes, no delay, and a queue that fits every
    /// task.
    pub fn new(tasks: u64, workers: usize) -> Result<Self, ConfigError> {
        Self::try_from(CliArgs {
            tasks,
            workers,
            delay_ms: 0,
            queue_capacity: None,
            aggregation: Aggregation::default(),
            fail_every: None,
        })
    }

    pub fn with_aggregation(mut self, aggregation: Aggregation) -> Self {
        self.aggregation = aggregation;
        self
    }
}

impl TryFrom<CliArgs> for PoolConfig {
    type Error = ConfigError;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.workers == 0 {
            return Err(ConfigError::NoWorkers);
        }
        if args.fail_every == Some(0) {
            return Err(ConfigError::ZeroFailInterval);
        }

        let needed = usize::try_from(args.tasks).unwrap_or(usize::MAX);
        let queue_capacity = args.queue_capacity.unwrap_or(needed).max(1);
        if queue_capacity < needed {
            return Err(ConfigError::QueueTooSmall {
                capacity: queue_capacity,
                tasks: args.tasks,
            });
        }

        Ok(Self {
            tasks: args.tasks,
            workers: args.workers,
            delay: Duration::from_millis(args.delay_ms),
            queue_capacity,
            aggregation: args.aggregation,
            fail_every: args.fail_every,
        })
    }
}
