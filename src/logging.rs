use std::io::IsTerminal;

use tracing_subscriber::EnvFilter;

/// Install the global subscriber: progress events go to stderr so stdout
/// carries only the final report. `RUST_LOG` overrides the `info` default.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_thread_names(true)
        .with_target(false)
        .try_init();
}
