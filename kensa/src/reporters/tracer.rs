use crate::{
    ExpectationResult, Reporter, RunId,
    report::{RunReport, SpecReport, SuiteReport},
};

/// A reporter that logs the run to the `tracing` crate.
///
/// Log levels:
/// - `trace` - individual expectation results
/// - `debug` - suite and spec start, passed and skipped specs
/// - `warn` - failed and errored specs
/// - `info` - run start and finish
///
/// # Example
///
/// ```ignore
/// use kensa::reporters::Tracer;
///
/// runner.add_reporter(Tracer);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Tracer;

impl Reporter for Tracer {
    fn on_run_start(&self, run_id: &RunId, spec_count: usize) {
        tracing::info!(run_id = %run_id, specs = spec_count, "run start");
    }

    fn on_suite_start(&self, path: &[&str]) {
        tracing::debug!(suite = %path.join(" "), depth = path.len(), "suite start");
    }

    fn on_spec_start(&self, full_name: &str) {
        tracing::debug!(spec = %full_name, "spec start");
    }

    fn on_expectation(&self, full_name: &str, result: &ExpectationResult) {
        tracing::trace!(
            spec = %full_name,
            passed = result.passed(),
            description = %result.description(),
            message = %result.message(),
            "expectation"
        );
    }

    fn on_spec_done(&self, report: &SpecReport) {
        if report.status().is_failure() {
            tracing::warn!(
                spec = %report.full_name(),
                status = %report.status(),
                failed_expectations = report.failed_expectations().count(),
                error = ?report.error().map(ToString::to_string),
                "spec done"
            );
        } else {
            tracing::debug!(
                spec = %report.full_name(),
                status = %report.status(),
                duration = ?report.duration(),
                "spec done"
            );
        }
    }

    fn on_suite_done(&self, report: &SuiteReport) {
        let tally = report.tally();
        tracing::debug!(
            suite = %report.name(),
            passed = tally.passed,
            failed = tally.failed,
            errored = tally.errored,
            skipped = tally.skipped,
            "suite done"
        );
    }

    fn on_run_done(&self, report: &RunReport) {
        let tally = report.tally();
        tracing::info!(
            run_id = %report.run_id(),
            passed = tally.passed,
            failed = tally.failed,
            errored = tally.errored,
            skipped = tally.skipped,
            cancelled = report.was_cancelled(),
            duration = ?report.duration(),
            "run done"
        );
    }
}
