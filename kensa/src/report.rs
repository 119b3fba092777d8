//! Results of a run.
//!
//! A [`RunReport`] mirrors the registered tree: one [`SuiteReport`] per
//! top-level suite, each holding its specs and nested suites in execution
//! order, with a [`Tally`] aggregated at every level.

use std::time::Duration;

use serde::{Serialize, Serializer};

use crate::{Error, ExpectationResult, Result, RunId, SpecStatus};

fn as_millis<S: Serializer>(duration: &Duration, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_micros() as f64 / 1000.0)
}

/// Spec counts by terminal status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub passed: usize,
    pub failed: usize,
    pub errored: usize,
    pub skipped: usize,
}

impl Tally {
    pub(crate) fn count(&mut self, status: SpecStatus) {
        match status {
            SpecStatus::Passed => self.passed += 1,
            SpecStatus::Failed => self.failed += 1,
            SpecStatus::Errored => self.errored += 1,
            SpecStatus::Skipped => self.skipped += 1,
            SpecStatus::Pending | SpecStatus::Running => {}
        }
    }

    pub(crate) fn merge(&mut self, other: &Tally) {
        self.passed += other.passed;
        self.failed += other.failed;
        self.errored += other.errored;
        self.skipped += other.skipped;
    }

    pub fn total(&self) -> usize {
        self.passed + self.failed + self.errored + self.skipped
    }

    /// Returns true when nothing failed or errored.
    pub fn is_success(&self) -> bool {
        self.failed == 0 && self.errored == 0
    }
}

/// The outcome of one spec.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpecReport {
    pub(crate) name: String,
    pub(crate) full_name: String,
    pub(crate) status: SpecStatus,
    pub(crate) expectations: Vec<ExpectationResult>,
    #[serde(rename = "duration_ms", serialize_with = "as_millis")]
    pub(crate) duration: Duration,
    pub(crate) error: Option<Error>,
}

impl SpecReport {
    pub(crate) fn skipped(name: &str, full_name: String) -> Self {
        Self {
            name: name.to_string(),
            full_name,
            status: SpecStatus::Skipped,
            expectations: Vec::new(),
            duration: Duration::ZERO,
            error: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Enclosing suite names and the spec name, joined by spaces.
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn status(&self) -> SpecStatus {
        self.status
    }

    pub fn expectations(&self) -> &[ExpectationResult] {
        &self.expectations
    }

    pub fn failed_expectations(&self) -> impl Iterator<Item = &ExpectationResult> {
        self.expectations.iter().filter(|r| !r.passed())
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// The error that made the spec Errored, if any.
    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }
}

/// A spec or nested suite inside a [`SuiteReport`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ReportEntry {
    Spec(SpecReport),
    Suite(SuiteReport),
}

/// The outcome of one suite and everything below it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuiteReport {
    pub(crate) name: String,
    pub(crate) tally: Tally,
    pub(crate) entries: Vec<ReportEntry>,
}

impl SuiteReport {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            tally: Tally::default(),
            entries: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, entry: ReportEntry) {
        match &entry {
            ReportEntry::Spec(spec) => self.tally.count(spec.status),
            ReportEntry::Suite(suite) => self.tally.merge(&suite.tally),
        }
        self.entries.push(entry);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Counts for this suite including every nested suite.
    pub fn tally(&self) -> &Tally {
        &self.tally
    }

    pub fn entries(&self) -> &[ReportEntry] {
        &self.entries
    }

    /// Every spec below this suite, depth-first in execution order.
    pub fn specs(&self) -> Vec<&SpecReport> {
        let mut specs = Vec::new();
        self.collect_specs(&mut specs);
        specs
    }

    fn collect_specs<'a>(&'a self, out: &mut Vec<&'a SpecReport>) {
        for entry in &self.entries {
            match entry {
                ReportEntry::Spec(spec) => out.push(spec),
                ReportEntry::Suite(suite) => suite.collect_specs(out),
            }
        }
    }
}

/// The outcome of a whole run.
///
/// # Example
///
/// ```ignore
/// let report = runner.run(&registry).await;
/// for spec in report.failures() {
///     eprintln!("{}: {}", spec.full_name(), spec.status());
/// }
/// std::process::exit(report.exit_code());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub(crate) run_id: RunId,
    pub(crate) suites: Vec<SuiteReport>,
    pub(crate) tally: Tally,
    #[serde(rename = "duration_ms", serialize_with = "as_millis")]
    pub(crate) duration: Duration,
    pub(crate) cancelled: bool,
}

impl RunReport {
    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    pub fn suites(&self) -> &[SuiteReport] {
        &self.suites
    }

    pub fn tally(&self) -> &Tally {
        &self.tally
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Returns true if the run was cancelled before every spec ran.
    pub fn was_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Every spec, depth-first in execution order.
    pub fn all_specs(&self) -> Vec<&SpecReport> {
        let mut specs = Vec::new();
        for suite in &self.suites {
            suite.collect_specs(&mut specs);
        }
        specs
    }

    /// Finds a spec by its full name.
    pub fn spec(&self, full_name: &str) -> Option<&SpecReport> {
        self.all_specs()
            .into_iter()
            .find(|spec| spec.full_name == full_name)
    }

    /// Every recorded expectation result, in execution order.
    pub fn expectations(&self) -> Vec<&ExpectationResult> {
        self.all_specs()
            .into_iter()
            .flat_map(|spec| spec.expectations.iter())
            .collect()
    }

    /// Specs that ended Failed or Errored.
    pub fn failures(&self) -> Vec<&SpecReport> {
        self.all_specs()
            .into_iter()
            .filter(|spec| spec.status.is_failure())
            .collect()
    }

    pub fn is_success(&self) -> bool {
        self.tally.is_success()
    }

    /// Process exit code for command-line drivers: 0 on success, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.is_success() { 0 } else { 1 }
    }

    /// Serialize the whole report as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::External`] if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(name: &str, status: SpecStatus) -> SpecReport {
        SpecReport {
            name: name.to_string(),
            full_name: format!("Suite {name}"),
            status,
            expectations: vec![ExpectationResult::new(
                format!("expect({name})"),
                status != SpecStatus::Failed,
                "Passed.".into(),
            )],
            duration: Duration::from_millis(2),
            error: (status == SpecStatus::Errored).then(|| Error::Failed("boom".into())),
        }
    }

    fn report() -> RunReport {
        let mut nested = SuiteReport::new("Nested");
        nested.push(ReportEntry::Spec(spec("b", SpecStatus::Failed)));
        nested.push(ReportEntry::Spec(spec("c", SpecStatus::Skipped)));

        let mut root = SuiteReport::new("Suite");
        root.push(ReportEntry::Spec(spec("a", SpecStatus::Passed)));
        root.push(ReportEntry::Suite(nested));
        root.push(ReportEntry::Spec(spec("d", SpecStatus::Errored)));

        let mut tally = Tally::default();
        tally.merge(root.tally());
        RunReport {
            run_id: RunId::from(1),
            suites: vec![root],
            tally,
            duration: Duration::from_millis(10),
            cancelled: false,
        }
    }

    #[test]
    fn tallies_aggregate_recursively() {
        let report = report();
        let tally = report.tally();
        assert_eq!(tally.passed, 1);
        assert_eq!(tally.failed, 1);
        assert_eq!(tally.errored, 1);
        assert_eq!(tally.skipped, 1);
        assert_eq!(tally.total(), 4);
        assert!(!report.is_success());
        assert_eq!(report.exit_code(), 1);
    }

    #[test]
    fn specs_are_listed_in_execution_order() {
        let report = report();
        let names: Vec<_> = report.all_specs().iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["a", "b", "c", "d"]);

        let failures: Vec<_> = report.failures().iter().map(|s| s.name()).collect();
        assert_eq!(failures, vec!["b", "d"]);
        assert_eq!(report.expectations().len(), 4);
        assert!(report.spec("Suite d").is_some_and(|s| s.error().is_some()));
    }

    #[test]
    fn empty_run_exits_cleanly() {
        let report = RunReport {
            run_id: RunId::new(),
            suites: Vec::new(),
            tally: Tally::default(),
            duration: Duration::ZERO,
            cancelled: false,
        };
        assert!(report.is_success());
        assert_eq!(report.exit_code(), 0);
    }

    #[test]
    fn json_shape() {
        let json: serde_json::Value = serde_json::from_str(&report().to_json().unwrap()).unwrap();
        let entries = &json["suites"][0]["entries"];
        assert_eq!(entries[0]["kind"], "spec");
        assert_eq!(entries[0]["status"], "passed");
        assert_eq!(entries[0]["duration_ms"], 2.0);
        assert_eq!(entries[1]["kind"], "suite");
        assert_eq!(entries[2]["error"], "boom");
        assert_eq!(json["tally"]["failed"], 1);
    }
}
