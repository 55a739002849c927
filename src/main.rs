mod cancel;
mod config;
mod error;
mod logging;
mod pool;
mod processor;
mod report;
mod results;
mod stats;
mod task_queue;
mod types;
mod worker;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use crate::cancel::CancelToken;
use crate::config::{CliArgs, PoolConfig};
use crate::processor::SimulatedWork;

fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    let config = match PoolConfig::try_from(args) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("configuration error: {err}");
            std::process::exit(2);
        }
    };

    logging::init();
    tracing::debug!(?config, "configuration loaded");

    let processor = SimulatedWork::new(config.delay).failing_every(config.fail_every);
    let report = pool::run(&config, Arc::new(processor), &CancelToken::new())
        .context("worker pool run failed")?;
    report.stats.log();

    let stdout = std::io::stdout();
    report::write_report(&mut stdout.lock(), &report.results)
        .context("failed to write final report")?;
    Ok(())
}
