use std::{fmt, rc::Rc};

use futures_util::{FutureExt, future::LocalBoxFuture};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::{
    Config, Registry, Reporter, RunId, Suite,
    cx::SpecState,
    internal::{ReporterSet, SpecExecution},
    report::{ReportEntry, RunReport, SpecReport, SuiteReport, Tally},
    suite::{Node, Spec},
};

/// Executes a [`Registry`] and produces a [`RunReport`].
///
/// The runner walks the suite tree depth-first in registration order and
/// runs one spec at a time. Failures stay inside the spec that caused them,
/// so a run always completes and reports every spec.
///
/// Engine state is `Rc`-based, so the returned future is `!Send`: await it
/// on a current-thread runtime (the default for `#[tokio::test]`), or inside
/// a `tokio::task::LocalSet`.
///
/// Run one run per thread at a time. The free functions [`expect`](crate::expect)
/// and [`expect_spy`](crate::expect_spy) find the running spec through a
/// thread-local slot, so two runs interleaved on one thread (for example
/// joined with `tokio::join!`) can record into the wrong spec. Expectations
/// made through [`Cx`](crate::Cx) are unaffected.
///
/// # Example
///
/// ```rust
/// use kensa::{Registry, Runner, json};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let mut registry = Registry::new();
/// registry.describe("math", |s| {
///     s.it("adds", |cx| {
///         cx.expect(1 + 1).to_equal(json!(2))?;
///         Ok(())
///     });
/// });
///
/// let report = Runner::default().run(&registry).await;
/// assert!(report.is_success());
/// # }
/// ```
pub struct Runner {
    config: Rc<Config>,
    reporters: ReporterSet,
    cancel: CancellationToken,
}

impl Runner {
    pub fn new(config: Config) -> Self {
        Self {
            config: Rc::new(config),
            reporters: ReporterSet::default(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Register a reporter. Reporters are notified in registration order.
    pub fn add_reporter<R: Reporter + 'static>(&mut self, reporter: R) -> &mut Self {
        self.reporters.add(Box::new(reporter));
        self
    }

    /// A token that cancels the run.
    ///
    /// Cancelling interrupts the current wait, ends the running spec as
    /// Errored once its `after` hooks ran, and reports every later spec as
    /// Skipped.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run every registered spec.
    pub async fn run(&mut self, registry: &Registry) -> RunReport {
        let run_id = RunId::new();
        let started = Instant::now();
        let spec_count = registry.spec_count();

        tracing::info!(
            run_id = %run_id,
            suites = registry.suites().len(),
            specs = spec_count,
            reporters = self.reporters.len(),
            "run started"
        );
        self.reporters.notify(|r| r.on_run_start(&run_id, spec_count));

        let mut suites = Vec::with_capacity(registry.suites().len());
        let mut tally = Tally::default();
        for suite in registry.suites() {
            let (report, _) = self.run_suite(suite, Vec::new(), None).await;
            tally.merge(report.tally());
            suites.push(report);
        }

        let report = RunReport {
            run_id,
            suites,
            tally,
            duration: started.elapsed(),
            cancelled: self.cancel.is_cancelled(),
        };

        tracing::info!(
            run_id = %run_id,
            passed = tally.passed,
            failed = tally.failed,
            errored = tally.errored,
            skipped = tally.skipped,
            duration = ?report.duration,
            "run finished"
        );
        self.reporters.notify(|r| r.on_run_done(&report));
        report
    }

    /// Run a suite and everything below it.
    ///
    /// `forced` skips every spec below with the given reason. Also returns
    /// the depth of an enclosing suite whose `before` hook failed, so the
    /// caller can skip that suite's remaining children.
    fn run_suite<'a>(
        &'a mut self,
        suite: &'a Suite,
        mut levels: Vec<&'a Suite>,
        forced: Option<&'static str>,
    ) -> LocalBoxFuture<'a, (SuiteReport, Option<usize>)> {
        async move {
            let depth = levels.len();
            levels.push(suite);
            let path: Vec<&str> = levels.iter().map(|s| s.name()).collect();
            self.reporters.notify(|r| r.on_suite_start(&path));

            let mut report = SuiteReport::new(suite.name());
            let mut forced = forced;
            let mut broken_at: Option<usize> = None;

            for child in &suite.children {
                let failed_level = match child {
                    Node::Spec(spec) => {
                        let (spec_report, failed_level) =
                            self.run_spec(spec, &levels, forced).await;
                        report.push(ReportEntry::Spec(spec_report));
                        failed_level
                    }
                    Node::Suite(nested) => {
                        let (nested_report, failed_level) =
                            self.run_suite(nested, levels.clone(), forced).await;
                        report.push(ReportEntry::Suite(nested_report));
                        failed_level
                    }
                };

                if let Some(level) = failed_level {
                    broken_at = Some(broken_at.map_or(level, |b| b.min(level)));
                    forced = forced.or(Some(BEFORE_HOOK_FAILED));
                }
            }

            self.reporters.notify(|r| r.on_suite_done(&report));
            (report, broken_at.filter(|level| *level < depth))
        }
        .boxed_local()
    }

    async fn run_spec(
        &mut self,
        spec: &Spec,
        levels: &[&Suite],
        forced: Option<&'static str>,
    ) -> (SpecReport, Option<usize>) {
        let full_name = full_name(levels, &spec.name);

        if let Some(reason) = forced.or_else(|| self.skip_reason(spec, levels, &full_name)) {
            tracing::trace!(spec = %full_name, reason, "spec skipped");
            let report = SpecReport::skipped(&spec.name, full_name);
            self.reporters.notify(|r| r.on_spec_done(&report));
            return (report, None);
        }

        tracing::trace!(spec = %full_name, "spec started");
        self.reporters.notify(|r| r.on_spec_start(&full_name));

        let started = Instant::now();
        let state = Rc::new(SpecState::new(
            full_name.clone(),
            self.config.clone(),
            self.cancel.child_token(),
        ));
        let outcome = SpecExecution::new(state, levels, &spec.body).run().await;
        let duration = started.elapsed();

        for result in &outcome.expectations {
            self.reporters.notify(|r| r.on_expectation(&full_name, result));
        }

        tracing::trace!(
            spec = %full_name,
            status = %outcome.status,
            error = ?outcome.error,
            ?duration,
            "spec finished"
        );

        let report = SpecReport {
            name: spec.name.clone(),
            full_name,
            status: outcome.status,
            expectations: outcome.expectations,
            duration,
            error: outcome.error,
        };
        self.reporters.notify(|r| r.on_spec_done(&report));
        (report, outcome.failed_level)
    }

    fn skip_reason(&self, spec: &Spec, levels: &[&Suite], full_name: &str) -> Option<&'static str> {
        if spec.skipped || levels.iter().any(|s| s.is_skipped()) {
            Some("disabled")
        } else if self.cancel.is_cancelled() {
            Some("cancelled")
        } else if !self.config.selects(full_name) {
            Some("filtered")
        } else {
            None
        }
    }
}

impl Default for Runner {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl fmt::Debug for Runner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runner")
            .field("config", &self.config)
            .field("reporters", &self.reporters)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

const BEFORE_HOOK_FAILED: &str = "before hook failed";

fn full_name(levels: &[&Suite], spec: &str) -> String {
    levels
        .iter()
        .map(|s| s.name())
        .chain(std::iter::once(spec))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use serde_json::json;

    use super::*;
    use crate::{Error, ExpectationResult, SpecStatus, expect};

    #[derive(Clone, Default)]
    struct Events(Rc<RefCell<Vec<String>>>);

    impl Events {
        fn push(&self, event: impl Into<String>) {
            self.0.borrow_mut().push(event.into());
        }

        fn take(&self) -> Vec<String> {
            std::mem::take(&mut *self.0.borrow_mut())
        }
    }

    impl Reporter for Events {
        fn on_run_start(&self, _run_id: &RunId, spec_count: usize) {
            self.push(format!("run start {spec_count}"));
        }

        fn on_suite_start(&self, path: &[&str]) {
            self.push(format!("suite start {}", path.join("/")));
        }

        fn on_spec_start(&self, full_name: &str) {
            self.push(format!("spec start {full_name}"));
        }

        fn on_expectation(&self, _full_name: &str, result: &ExpectationResult) {
            self.push(format!("expectation {}", result.passed()));
        }

        fn on_spec_done(&self, report: &SpecReport) {
            self.push(format!("spec done {} {}", report.full_name(), report.status()));
        }

        fn on_suite_done(&self, report: &SuiteReport) {
            self.push(format!("suite done {}", report.name()));
        }

        fn on_run_done(&self, report: &RunReport) {
            self.push(format!("run done {}", report.tally().total()));
        }
    }

    #[tokio::test]
    async fn reporter_callbacks_follow_the_tree() {
        let mut registry = Registry::new();
        registry.describe("A", |s| {
            s.it("passes", |_| {
                expect(1).to_equal(json!(1))?;
                Ok(())
            });
            s.describe("B", |s| {
                s.xit("off", |_| Ok(()));
            });
        });

        let events = Events::default();
        let mut runner = Runner::default();
        runner.add_reporter(events.clone());
        runner.run(&registry).await;

        assert_eq!(
            events.take(),
            vec![
                "run start 2",
                "suite start A",
                "spec start A passes",
                "expectation true",
                "spec done A passes Passed",
                "suite start A/B",
                "spec done A B off Skipped",
                "suite done B",
                "suite done A",
                "run done 2",
            ]
        );
    }

    #[tokio::test]
    async fn status_precedence() {
        let mut registry = Registry::new();
        registry.describe("S", |s| {
            s.it("fails", |cx| {
                cx.expect(1).to_equal(json!(2))?;
                Ok(())
            });
            s.it("errors", |cx| {
                cx.expect(1).to_equal(json!(2))?;
                Err(crate::fail("gave up"))
            });
            s.it("is empty", |_| Ok(()));
        });

        let report = Runner::default().run(&registry).await;
        let statuses: Vec<_> = report.all_specs().iter().map(|s| s.status()).collect();
        assert_eq!(
            statuses,
            vec![SpecStatus::Failed, SpecStatus::Errored, SpecStatus::Passed]
        );
        assert_eq!(
            report.spec("S errors").and_then(|s| s.error()),
            Some(&Error::Failed("gave up".into()))
        );
    }

    #[tokio::test]
    async fn filter_skips_unselected_specs() {
        let mut registry = Registry::new();
        registry.describe("Cart", |s| {
            s.it("adds items", |_| Ok(()));
            s.it("removes items", |_| Ok(()));
        });

        let mut runner = Runner::new(Config::default().with_filter("adds"));
        let report = runner.run(&registry).await;
        assert_eq!(report.tally().passed, 1);
        assert_eq!(report.tally().skipped, 1);
        assert_eq!(
            report.spec("Cart removes items").map(|s| s.status()),
            Some(SpecStatus::Skipped)
        );
    }

    #[derive(Clone, Default)]
    struct Captured(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn spec_outcomes_are_logged_once_with_a_tracer() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let _subscriber = tracing::subscriber::set_default(subscriber);

        let mut registry = Registry::new();
        registry.describe("S", |s| {
            s.it("fails", |cx| {
                cx.expect(1).to_equal(json!(2))?;
                Ok(())
            });
        });
        let mut runner = Runner::default();
        runner.add_reporter(crate::reporters::Tracer);
        runner.run(&registry).await;

        let text = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert_eq!(text.matches("spec done").count(), 1);
        assert!(!text.contains("spec finished"));
        assert!(!text.contains("spec started"));
    }

    #[test]
    fn full_names_join_suite_path() {
        let outer = Suite::build("Outer", false, |_| {});
        let inner = Suite::build("Inner", false, |_| {});
        assert_eq!(full_name(&[&outer, &inner], "works"), "Outer Inner works");
        assert_eq!(full_name(&[], "alone"), "alone");
    }
}
