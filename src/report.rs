//! Final report printed once every worker has exited.

use std::io::{self, Write};

use crate::results::Results;

/// Write the results block and the completion banner.
///
/// Completed results keep the order they were recorded in. Failures, if
/// any, get their own block so the completed list stays clean.
pub fn write_report<W: Write>(out: &mut W, results: &Results) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "Final results:")?;
    for result in &results.completed {
        writeln!(out, "{result}")?;
    }
    if !results.failed.is_empty() {
        writeln!(out)?;
        writeln!(out, "Failed tasks:")?;
        for failure in &results.failed {
            writeln!(out, "{failure}")?;
        }
    }
    writeln!(out)?;
    writeln!(out, "All tasks completed.")?;
    out.flush()
}
