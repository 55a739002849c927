//! Timing and CPU usage captured around a pool run.

use std::time::{Duration, Instant};

use crate::worker::WorkerSummary;

/// Best-effort CPU user/system time snapshot (seconds) on Unix platforms.
#[cfg(unix)]
fn cpu_times_seconds() -> Option<(f64, f64)> {
    let mut usage = std::mem::MaybeUninit::<libc::rusage>::zeroed();
    let rc = unsafe { libc::getrusage(libc::RUSAGE_SELF, usage.as_mut_ptr()) };
    if rc != 0 {
        return None;
    }
    // SAFETY: getrusage filled the struct on success.
    let usage = unsafe { usage.assume_init() };
    let user = usage.ru_utime.tv_sec as f64 + (usage.ru_utime.tv_usec as f64 / 1_000_000.0);
    let sys = usage.ru_stime.tv_sec as f64 + (usage.ru_stime.tv_usec as f64 / 1_000_000.0);
    Some((user, sys))
}

/// Stub on non-Unix platforms.
#[cfg(not(unix))]
fn cpu_times_seconds() -> Option<(f64, f64)> {
    None
}

/// Started before workers spawn, finished after the barrier.
pub struct StatsClock {
    start: Instant,
    cpu_start: Option<(f64, f64)>,
}

impl StatsClock {
    pub fn start() -> Self {
        Self {
            cpu_start: cpu_times_seconds(),
            start: Instant::now(),
        }
    }

    pub fn finish(self, workers: Vec<WorkerSummary>, unprocessed: usize) -> RunStats {
        let elapsed = self.start.elapsed();
        let (cpu_user_s, cpu_sys_s) = match (self.cpu_start, cpu_times_seconds()) {
            (Some((user_start, sys_start)), Some((user_end, sys_end))) => {
                (Some(user_end - user_start), Some(sys_end - sys_start))
            }
            _ => (None, None),
        };
        RunStats {
            elapsed,
            cpu_user_s,
            cpu_sys_s,
            workers,
            unprocessed,
        }
    }
}

/// Aggregated metrics from a single run.
#[derive(Clone, Debug)]
pub struct RunStats {
    pub elapsed: Duration,
    pub cpu_user_s: Option<f64>,
    pub cpu_sys_s: Option<f64>,
    /// One entry per worker, ordered by worker id.
    pub workers: Vec<WorkerSummary>,
    /// Tasks still queued after the barrier (non-zero only when cancelled).
    pub unprocessed: usize,
}

impl RunStats {
    pub fn processed(&self) -> usize {
        self.workers.iter().map(|w| w.processed).sum()
    }

    /// Tasks per second over the wall-clock duration, or 0 for instant runs.
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.processed() as f64 / secs
        } else {
            0.0
        }
    }

    pub fn log(&self) {
        let per_worker: Vec<(usize, usize)> = self
            .workers
            .iter()
            .map(|w| (w.worker, w.processed))
            .collect();
        tracing::debug!(
            elapsed_ms = self.elapsed.as_millis() as u64,
            throughput = self.throughput(),
            cpu_user_s = ?self.cpu_user_s,
            cpu_sys_s = ?self.cpu_sys_s,
            ?per_worker,
            unprocessed = self.unprocessed,
            "run statistics"
        );
    }
}
