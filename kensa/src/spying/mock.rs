use std::fmt;

use serde_json::Value;

use crate::{
    Result, Spy, cx,
    matching::ExpectationResult,
    value::render_args,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Times {
    Any,
    Exactly(usize),
    AtLeast(usize),
    AtMost(usize),
}

impl Times {
    fn admits(&self, count: usize) -> bool {
        match *self {
            Times::Any => count > 0,
            Times::Exactly(n) => count == n,
            Times::AtLeast(n) => count >= n,
            Times::AtMost(n) => count <= n,
        }
    }
}

impl fmt::Display for Times {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Times::Any => write!(f, "at least once"),
            Times::Exactly(0) => write!(f, "never"),
            Times::Exactly(n) => write!(f, "exactly {n} times"),
            Times::AtLeast(n) => write!(f, "at least {n} times"),
            Times::AtMost(n) => write!(f, "at most {n} times"),
        }
    }
}

/// One usage constraint declared on a [`Mock`].
///
/// Defaults to "called at least once". With [`with_args`](Self::with_args),
/// only calls whose leading arguments match are counted.
#[derive(Debug)]
pub struct Constraint {
    spy: Spy,
    times: Times,
    args: Option<Vec<Value>>,
}

impl Constraint {
    pub fn exactly(&mut self, times: usize) -> &mut Self {
        self.times = Times::Exactly(times);
        self
    }

    pub fn once(&mut self) -> &mut Self {
        self.exactly(1)
    }

    pub fn twice(&mut self) -> &mut Self {
        self.exactly(2)
    }

    pub fn at_least(&mut self, times: usize) -> &mut Self {
        self.times = Times::AtLeast(times);
        self
    }

    pub fn at_most(&mut self, times: usize) -> &mut Self {
        self.times = Times::AtMost(times);
        self
    }

    pub fn never(&mut self) -> &mut Self {
        self.exactly(0)
    }

    pub fn with_args(&mut self, args: &[Value]) -> &mut Self {
        self.args = Some(args.to_vec());
        self
    }

    fn matching_calls(&self) -> usize {
        match &self.args {
            Some(args) => self
                .spy
                .calls()
                .iter()
                .filter(|call| call.called_with(args))
                .count(),
            None => self.spy.call_count(),
        }
    }

    fn check(&self, mock: &str) -> ExpectationResult {
        let count = self.matching_calls();
        let with = self
            .args
            .as_ref()
            .map(|args| format!(" with {}", render_args(args)))
            .unwrap_or_default();
        let description = format!(
            "mock '{mock}': spy '{}' called {}{with}",
            self.spy.name(),
            self.times
        );
        if self.times.admits(count) {
            ExpectationResult::new(description, true, "Passed.".to_string())
        } else {
            let message = format!(
                "Expected spy '{}' to be called {}{with}, but it was called {count} times.",
                self.spy.name(),
                self.times
            );
            ExpectationResult::new(description, false, message)
        }
    }
}

/// A bundle of spies with usage constraints declared up front and verified
/// after the fact.
///
/// # Example
///
/// ```ignore
/// let mut mock = Mock::new("todo store");
/// mock.expects(&save).once().with_args(&args!["milk"]);
/// mock.expects(&remove).never();
///
/// app.add_todo("milk")?;
///
/// mock.verify()?;
/// ```
#[derive(Debug)]
pub struct Mock {
    name: String,
    constraints: Vec<Constraint>,
}

impl Mock {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            constraints: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declare a constraint on `spy` and return it for configuration.
    pub fn expects(&mut self, spy: &Spy) -> &mut Constraint {
        self.constraints.push(Constraint {
            spy: spy.clone(),
            times: Times::Any,
            args: None,
        });
        let last = self.constraints.len() - 1;
        &mut self.constraints[last]
    }

    /// Check every constraint without recording anything.
    pub fn check(&self) -> Vec<ExpectationResult> {
        self.constraints.iter().map(|c| c.check(&self.name)).collect()
    }

    /// Record one expectation result per constraint against the running spec.
    ///
    /// Returns `Ok(true)` if every constraint held.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoActiveSpec`](crate::Error::NoActiveSpec) outside of a
    /// running spec.
    pub fn verify(&self) -> Result<bool> {
        let state = cx::current()?;
        let mut all_passed = true;
        for result in self.check() {
            all_passed &= result.passed();
            state.record(result);
        }
        Ok(all_passed)
    }
}
