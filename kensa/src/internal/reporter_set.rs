use std::{
    fmt,
    panic::{AssertUnwindSafe, catch_unwind},
};

use crate::Reporter;

/// Fans callbacks out to the registered reporters.
#[derive(Default)]
pub(crate) struct ReporterSet {
    reporters: Vec<Box<dyn Reporter>>,
    to_remove: Vec<usize>,
}

impl ReporterSet {
    pub(crate) fn add(&mut self, reporter: Box<dyn Reporter>) {
        self.reporters.push(reporter);
    }

    pub(crate) fn len(&self) -> usize {
        self.reporters.len()
    }

    /// Call `f` on every reporter. A reporter that panics is dropped.
    pub(crate) fn notify(&mut self, f: impl Fn(&dyn Reporter)) {
        for (index, reporter) in self.reporters.iter().enumerate() {
            let result = catch_unwind(AssertUnwindSafe(|| f(reporter.as_ref())));
            if result.is_err() {
                tracing::error!(reporter = index, "Reporter panicked, removing");
                self.to_remove.push(index);
            }
        }

        while let Some(index) = self.to_remove.pop() {
            self.reporters.remove(index);
        }
    }
}

impl fmt::Debug for ReporterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReporterSet")
            .field("reporters", &self.reporters.len())
            .finish()
    }
}
