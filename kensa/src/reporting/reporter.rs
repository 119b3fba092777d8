use crate::{
    ExpectationResult, RunId,
    report::{RunReport, SpecReport, SuiteReport},
};

/// Trait for observing a run.
///
/// # Example
///
/// ```rust
/// use kensa::{Reporter, report::SpecReport};
///
/// struct Dots;
///
/// impl Reporter for Dots {
///     fn on_spec_done(&self, report: &SpecReport) {
///         print!("{}", if report.status().is_failure() { "F" } else { "." });
///     }
/// }
/// ```
pub trait Reporter {
    /// Called once before the first suite starts.
    fn on_run_start(&self, run_id: &RunId, spec_count: usize) {
        let _r = run_id;
        let _c = spec_count;
    }

    /// Called when the runner enters a suite. `path` holds the names of the
    /// enclosing suites, outermost first, ending with this suite's name.
    fn on_suite_start(&self, path: &[&str]) {
        let _p = path;
    }

    /// Called just before a spec's `before` hooks run.
    fn on_spec_start(&self, full_name: &str) {
        let _n = full_name;
    }

    /// Called for each expectation result a finished spec recorded.
    fn on_expectation(&self, full_name: &str, result: &ExpectationResult) {
        let _n = full_name;
        let _r = result;
    }

    /// Called when a spec reaches a terminal status.
    fn on_spec_done(&self, report: &SpecReport) {
        let _r = report;
    }

    /// Called after the last child of a suite finished.
    fn on_suite_done(&self, report: &SuiteReport) {
        let _r = report;
    }

    /// Called once with the complete report.
    fn on_run_done(&self, report: &RunReport) {
        let _r = report;
    }
}
