use crate::Suite;

/// The top-level suites of a run, in registration order.
///
/// Build one per run and hand it to [`Runner::run`](crate::Runner::run).
#[derive(Debug, Clone, Default)]
pub struct Registry {
    suites: Vec<Suite>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a top-level suite. `define` runs immediately.
    pub fn describe<F>(&mut self, name: impl Into<String>, define: F) -> &mut Self
    where
        F: FnOnce(&mut Suite),
    {
        self.suites.push(Suite::build(name, false, define));
        self
    }

    /// Register a top-level suite whose specs are all reported Skipped.
    pub fn xdescribe<F>(&mut self, name: impl Into<String>, define: F) -> &mut Self
    where
        F: FnOnce(&mut Suite),
    {
        self.suites.push(Suite::build(name, true, define));
        self
    }

    pub fn suites(&self) -> &[Suite] {
        &self.suites
    }

    pub fn spec_count(&self) -> usize {
        self.suites.iter().map(Suite::spec_count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.suites.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_specs_across_suites() {
        let mut registry = Registry::new();
        assert!(registry.is_empty());
        registry
            .describe("A", |s| {
                s.it("one", |_| Ok(()));
            })
            .xdescribe("B", |s| {
                s.it("two", |_| Ok(()));
                s.it("three", |_| Ok(()));
            });

        assert_eq!(registry.spec_count(), 3);
        let names: Vec<_> = registry.suites().iter().map(Suite::name).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert!(registry.suites()[1].is_skipped());
    }
}
