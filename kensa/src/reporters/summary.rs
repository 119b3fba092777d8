use std::{
    cell::RefCell,
    fmt,
    io::{self, Write},
};

use crate::{
    Reporter,
    report::{RunReport, SpecReport},
};

/// A reporter that prints a summary when the run is done.
///
/// One line per failed or errored spec, with each failed expectation message
/// or the error beneath it, followed by the totals:
///
/// ```text
/// Failures:
///
///   1) Counter increments
///      Expected 1 to equal 2.
///
///   2) Fetcher loads
///      Error: timed out after 5.001s waiting for the response
///
/// 4 specs, 1 failed, 1 errored, 0 skipped (12 ms)
/// ```
pub struct Summary<W: Write> {
    out: RefCell<W>,
}

impl Summary<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> Summary<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: RefCell::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }

    fn write_report(&self, out: &mut W, report: &RunReport) -> io::Result<()> {
        let failures = report.failures();
        if !failures.is_empty() {
            writeln!(out, "Failures:")?;
            for (index, spec) in failures.iter().enumerate() {
                writeln!(out)?;
                write_failure(out, index + 1, spec)?;
            }
            writeln!(out)?;
        }

        let tally = report.tally();
        writeln!(
            out,
            "{} specs, {} failed, {} errored, {} skipped ({} ms){}",
            tally.total(),
            tally.failed,
            tally.errored,
            tally.skipped,
            report.duration().as_millis(),
            if report.was_cancelled() { ", cancelled" } else { "" }
        )?;
        out.flush()
    }
}

fn write_failure<W: Write>(out: &mut W, number: usize, spec: &SpecReport) -> io::Result<()> {
    writeln!(out, "  {number}) {}", spec.full_name())?;
    for result in spec.failed_expectations() {
        writeln!(out, "     {}", result.message())?;
    }
    if let Some(error) = spec.error() {
        writeln!(out, "     Error: {error}")?;
    }
    Ok(())
}

impl<W: Write> Reporter for Summary<W> {
    fn on_run_done(&self, report: &RunReport) {
        let Ok(mut out) = self.out.try_borrow_mut() else {
            tracing::warn!("Summary failed to borrow writer");
            return;
        };
        if let Err(e) = self.write_report(&mut out, report) {
            tracing::warn!("Summary failed to write: {}", e);
        }
    }
}

impl<W: Write> fmt::Debug for Summary<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Summary").finish_non_exhaustive()
    }
}
