//! Pool runner: seed the queue, start the workers, wait for all of them.

use std::sync::Arc;
use std::thread;

use crossbeam::sync::WaitGroup;

use crate::cancel::CancelToken;
use crate::config::{Aggregation, PoolConfig};
use crate::error::PoolError;
use crate::processor::TaskProcessor;
use crate::results::{Aggregator, ResultSink, Results, SharedResults};
use crate::stats::{RunStats, StatsClock};
use crate::task_queue::TaskQueue;
use crate::worker::{Worker, WorkerSummary};

/// Everything a finished run produced.
#[derive(Debug)]
pub struct RunReport {
    pub results: Results,
    pub stats: RunStats,
}

/// Fill the queue with ids `1..=tasks`, then close it exactly once.
fn seed_queue(queue: &TaskQueue, tasks: u64) -> Result<(), PoolError> {
    for id in 1..=tasks {
        // Capacity was validated against the task count, so this never
        // reports Full; blocking here would deadlock before workers exist.
        queue.try_push(id)?;
    }
    queue.close()?;
    tracing::debug!(tasks, capacity = queue.capacity(), "queue seeded and closed");
    Ok(())
}

/// Spawn `config.workers` threads and block until every one has exited.
///
/// The wait group is the barrier: each worker owns one clone and drops it
/// exactly once when its thread finishes, even if it unwinds.
fn run_workers(
    config: &PoolConfig,
    queue: &Arc<TaskQueue>,
    processor: &Arc<dyn TaskProcessor>,
    sink: Arc<dyn ResultSink>,
    cancel: &CancelToken,
) -> Result<Vec<WorkerSummary>, PoolError> {
    let barrier = WaitGroup::new();
    let mut handles = Vec::with_capacity(config.workers);

    for id in 1..=config.workers {
        let worker = Worker::new(
            id,
            Arc::clone(queue),
            Arc::clone(processor),
            Arc::clone(&sink),
            cancel.clone(),
        );
        let done = barrier.clone();
        let spawned = thread::Builder::new()
            .name(format!("worker-{id}"))
            .spawn(move || {
                let summary = worker.run();
                drop(done);
                summary
            });
        match spawned {
            Ok(handle) => handles.push((id, handle)),
            Err(err) => {
                // Stop the workers already running before reporting.
                cancel.cancel();
                drop(sink);
                barrier.wait();
                return Err(PoolError::Spawn(err));
            }
        }
    }
    drop(sink);

    barrier.wait();

    let mut summaries = Vec::with_capacity(handles.len());
    for (id, handle) in handles {
        let summary = handle
            .join()
            .map_err(|_| PoolError::WorkerPanicked { worker: id })?;
        summaries.push(summary);
    }
    Ok(summaries)
}

/// Run one full pool lifecycle and return the collected results.
pub fn run(
    config: &PoolConfig,
    processor: Arc<dyn TaskProcessor>,
    cancel: &CancelToken,
) -> Result<RunReport, PoolError> {
    let queue = Arc::new(TaskQueue::with_capacity(config.queue_capacity));
    seed_queue(&queue, config.tasks)?;
    debug_assert!(queue.is_closed(), "workers must never see an open queue");

    tracing::debug!(
        workers = config.workers,
        aggregation = ?config.aggregation,
        "starting workers"
    );
    let clock = StatsClock::start();
    let (results, workers) = match config.aggregation {
        Aggregation::Mutex => {
            let shared = Arc::new(SharedResults::new());
            let workers = run_workers(config, &queue, &processor, shared.clone(), cancel)?;
            (shared.take(), workers)
        }
        Aggregation::Channel => {
            let (sink, aggregator) = Aggregator::spawn()?;
            let workers = run_workers(config, &queue, &processor, Arc::new(sink), cancel);
            // The sink was dropped inside run_workers, so the aggregator ends.
            let results = aggregator.finish()?;
            (results, workers?)
        }
    };

    // Anything left behind was skipped by a cancellation.
    let mut unprocessed = 0usize;
    while queue.try_pop().is_some() {
        unprocessed += 1;
    }

    debug_assert_eq!(queue.len(), 0);

    let stats = clock.finish(workers, unprocessed);
    if results.is_empty() {
        tracing::debug!("run finished without processing any task");
    }
    Ok(RunReport { results, stats })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TaskError;
    use crate::processor::SimulatedWork;
    use crate::types::{TaskId, TaskResult, WorkerId};
    use crate::worker::ExitReason;
    use proptest::prelude::*;
    use std::sync::mpsc;
    use std::time::{Duration, Instant};

    fn instant_work() -> Arc<dyn TaskProcessor> {
        Arc::new(SimulatedWork::new(Duration::ZERO))
    }

    fn run_plain(tasks: u64, workers: usize, aggregation: Aggregation) -> RunReport {
        let config = PoolConfig::new(tasks, workers)
            .expect("valid config")
            .with_aggregation(aggregation);
        run(&config, instant_work(), &CancelToken::new()).expect("pool run")
    }

    #[test]
    fn every_task_yields_exactly_one_result() {
        for aggregation in [Aggregation::Channel, Aggregation::Mutex] {
            let report = run_plain(20, 5, aggregation);
            assert_eq!(report.results.completed.len(), 20);
            assert_eq!(report.results.task_ids(), (1..=20).collect::<Vec<_>>());
            assert!(report.results.failed.is_empty());
            assert_eq!(report.stats.processed(), 20);
            assert_eq!(report.stats.unprocessed, 0);
        }
    }

    #[test]
    fn four_tasks_two_workers() {
        let report = run_plain(4, 2, Aggregation::Channel);
        let mut completed = report.results.completed.clone();
        completed.sort_by_key(|r| r.task);
        assert_eq!(
            completed.iter().map(|r| r.task).collect::<Vec<_>>(),
            vec![1, 2, 3, 4]
        );
        for result in &completed {
            assert!((1..=2).contains(&result.worker));
            assert_eq!(
                result.to_string(),
                format!("Worker {} completed task {}", result.worker, result.task)
            );
        }
    }

    #[test]
    fn single_worker_processes_everything_in_order() {
        let report = run_plain(6, 1, Aggregation::Mutex);
        let expected: Vec<TaskResult> = (1..=6).map(|t| TaskResult::new(1, t)).collect();
        assert_eq!(report.results.completed, expected);
        assert_eq!(report.stats.workers.len(), 1);
    }

    #[test]
    fn zero_tasks_terminates_with_empty_results() {
        for aggregation in [Aggregation::Channel, Aggregation::Mutex] {
            let report = run_plain(0, 4, aggregation);
            assert!(report.results.is_empty());
            assert_eq!(report.stats.workers.len(), 4);
            assert!(
                report
                    .stats
                    .workers
                    .iter()
                    .all(|w| w.processed == 0 && w.exit == ExitReason::Drained)
            );
        }
    }

    #[test]
    fn run_time_tracks_rounds_of_delay() {
        let config = PoolConfig {
            delay: Duration::from_millis(50),
            ..PoolConfig::new(6, 3).expect("valid config")
        };
        let start = Instant::now();
        let report = run(
            &config,
            Arc::new(SimulatedWork::new(config.delay)),
            &CancelToken::new(),
        )
        .expect("pool run");
        let elapsed = start.elapsed();
        assert_eq!(report.results.len(), 6);
        // Two rounds of three parallel tasks, never six sequential ones.
        assert!(elapsed >= Duration::from_millis(100));
        assert!(elapsed < config.delay * 6, "took {elapsed:?}");
    }

    #[test]
    fn injected_failures_are_reported_separately() {
        let config = PoolConfig::new(10, 3).expect("valid config");
        let processor = Arc::new(SimulatedWork::new(Duration::ZERO).failing_every(Some(5)));
        let report = run(&config, processor, &CancelToken::new()).expect("pool run");
        assert_eq!(report.results.completed.len(), 8);
        let mut failed: Vec<TaskId> = report.results.failed.iter().map(|f| f.task).collect();
        failed.sort_unstable();
        assert_eq!(failed, vec![5, 10]);
        assert_eq!(report.results.task_ids(), (1..=10).collect::<Vec<_>>());
    }

    #[test]
    fn cancelled_before_start_leaves_tasks_unprocessed() {
        let config = PoolConfig::new(12, 3).expect("valid config");
        let cancel = CancelToken::new();
        cancel.cancel();
        let report = run(&config, instant_work(), &cancel).expect("pool run");
        assert!(report.results.is_empty());
        assert_eq!(report.stats.unprocessed, 12);
        assert!(
            report
                .stats
                .workers
                .iter()
                .all(|w| w.exit == ExitReason::Cancelled)
        );
    }

    #[test]
    fn cancellation_mid_run_accounts_for_every_task() {
        let config = PoolConfig::new(10, 1).expect("valid config");
        let cancel = CancelToken::new();
        let trigger = cancel.clone();
        let processor = move |worker: WorkerId, task: TaskId| {
            if task == 3 {
                trigger.cancel();
            }
            Ok::<_, TaskError>(TaskResult::new(worker, task))
        };
        let report = run(&config, Arc::new(processor), &cancel).expect("pool run");
        assert_eq!(report.results.task_ids(), vec![1, 2, 3]);
        assert_eq!(report.stats.unprocessed, 7);
    }

    #[test]
    fn oversized_queue_capacity_still_runs() {
        let config = PoolConfig {
            queue_capacity: usize::MAX,
            ..PoolConfig::new(3, 2).expect("valid config")
        };
        let report = run(&config, instant_work(), &CancelToken::new()).expect("pool run");
        assert_eq!(report.results.task_ids(), vec![1, 2, 3]);
    }

    #[test]
    fn worker_panic_is_surfaced() {
        let config = PoolConfig::new(3, 2).expect("valid config");
        let processor = |worker: WorkerId, task: TaskId| {
            if task == 2 {
                panic!("task 2 exploded");
            }
            Ok::<_, TaskError>(TaskResult::new(worker, task))
        };
        for aggregation in [Aggregation::Channel, Aggregation::Mutex] {
            let config = config.clone().with_aggregation(aggregation);
            let err = run(&config, Arc::new(processor), &CancelToken::new())
                .expect_err("panic must not be swallowed");
            assert!(matches!(err, PoolError::WorkerPanicked { .. }));
        }
    }

    #[test]
    fn run_always_terminates() {
        let (done_tx, done_rx) = mpsc::channel();
        let handle = thread::spawn(move || {
            let report = run_plain(200, 16, Aggregation::Channel);
            done_tx.send(report.results.len()).expect("done");
        });
        let count = done_rx
            .recv_timeout(Duration::from_secs(10))
            .expect("pool run did not finish");
        assert_eq!(count, 200);
        handle.join().expect("pool thread panicked");
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn no_task_is_lost_or_duplicated(
            workers in 1usize..=50,
            tasks in 0u64..=500,
            use_mutex in any::<bool>(),
        ) {
            let aggregation = if use_mutex { Aggregation::Mutex } else { Aggregation::Channel };
            let report = run_plain(tasks, workers, aggregation);
            prop_assert_eq!(report.results.completed.len() as u64, tasks);
            prop_assert_eq!(report.results.task_ids(), (1..=tasks).collect::<Vec<_>>());
            prop_assert_eq!(report.stats.processed() as u64, tasks);
            prop_assert!(report.results.completed.iter().all(|r| (1..=workers).contains(&r.worker)));
        }
    }
}
