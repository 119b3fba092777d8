use std::{fmt, rc::Rc};

use serde_json::Value;

use crate::{
    Result,
    cx::{self, SpecState},
    matching::{Matcher, Subject, judge},
    value::TypeClass,
};

/// Where an expectation records its result.
#[derive(Clone)]
pub(crate) enum Sink {
    /// The spec a [`Cx`](crate::Cx) belongs to.
    Spec(Rc<SpecState>),
    /// Whatever spec is running on this thread when the matcher is called.
    Current,
}

impl Sink {
    fn resolve(&self) -> Result<Rc<SpecState>> {
        match self {
            Sink::Spec(state) if state.is_active() => Ok(state.clone()),
            Sink::Spec(_) => Err(crate::Error::NoActiveSpec),
            Sink::Current => cx::current(),
        }
    }
}

/// A subject waiting for a matcher.
///
/// Created by [`Cx::expect`](crate::Cx::expect), [`Cx::expect_spy`](crate::Cx::expect_spy)
/// or the free functions [`expect`](crate::expect) / [`expect_spy`](crate::expect_spy).
/// Calling a matcher records exactly one [`ExpectationResult`](crate::ExpectationResult)
/// against the running spec and returns `Ok(passed)`. A failed matcher
/// doesn't stop the body; later expectations still run.
///
/// # Example
///
/// ```ignore
/// cx.expect(json!({"title": "milk"})).to_contain(json!({"title": "milk"}))?;
/// cx.expect(todos.len()).not().to_equal(0)?;
/// cx.expect_spy(&save).was_called_with(&args![1, "milk"])?;
/// ```
///
/// # Errors
///
/// Every matcher returns [`Error::NoActiveSpec`](crate::Error::NoActiveSpec)
/// if no spec is running, and records nothing.
pub struct Expectation {
    subject: Subject,
    negated: bool,
    sink: Sink,
}

impl fmt::Debug for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Expectation")
            .field("subject", &self.subject)
            .field("negated", &self.negated)
            .finish_non_exhaustive()
    }
}

impl Expectation {
    pub(crate) fn new(subject: Subject, sink: Sink) -> Self {
        Self {
            subject,
            negated: false,
            sink,
        }
    }

    /// Invert the next matcher.
    #[allow(clippy::should_implement_trait)]
    pub fn not(mut self) -> Self {
        self.negated = !self.negated;
        self
    }

    /// Evaluate any matcher from the table, including custom ones.
    pub fn to(self, matcher: Matcher) -> Result<bool> {
        let state = self.sink.resolve()?;
        let result = judge(&self.subject, &matcher, self.negated);
        let passed = result.passed();
        state.record(result);
        Ok(passed)
    }

    // ==================== Value matchers ====================

    /// Deep structural equality.
    pub fn to_equal(self, expected: impl Into<Value>) -> Result<bool> {
        self.to(Matcher::Equal(expected.into()))
    }

    pub fn to_be_truthy(self) -> Result<bool> {
        self.to(Matcher::Truthy)
    }

    pub fn to_be_falsy(self) -> Result<bool> {
        self.to(Matcher::Falsy)
    }

    pub fn to_be_null(self) -> Result<bool> {
        self.to(Matcher::Null)
    }

    /// Substring, array element or contiguous sub-sequence, or sub-object.
    pub fn to_contain(self, needle: impl Into<Value>) -> Result<bool> {
        self.to(Matcher::Contain(needle.into()))
    }

    pub fn to_be_a(self, class: TypeClass) -> Result<bool> {
        self.to(Matcher::BeA(class))
    }

    pub fn to_be_greater_than(self, bound: f64) -> Result<bool> {
        self.to(Matcher::GreaterThan(bound))
    }

    pub fn to_be_less_than(self, bound: f64) -> Result<bool> {
        self.to(Matcher::LessThan(bound))
    }

    /// Numeric equality to `precision` decimal places.
    pub fn to_be_close_to(self, expected: f64, precision: i32) -> Result<bool> {
        self.to(Matcher::CloseTo {
            expected,
            precision,
        })
    }

    pub fn to_start_with(self, prefix: impl Into<String>) -> Result<bool> {
        self.to(Matcher::StartWith(prefix.into()))
    }

    pub fn to_end_with(self, suffix: impl Into<String>) -> Result<bool> {
        self.to(Matcher::EndWith(suffix.into()))
    }

    /// A one-off custom matcher; `name` shows up in the description.
    pub fn to_satisfy<F>(self, name: impl Into<String>, predicate: F) -> Result<bool>
    where
        F: Fn(&Value) -> bool + 'static,
    {
        self.to(Matcher::satisfy(name, predicate))
    }

    // ==================== Spy matchers ====================

    pub fn was_called(self) -> Result<bool> {
        self.to(Matcher::WasCalled)
    }

    pub fn was_not_called(self) -> Result<bool> {
        self.to(Matcher::WasNotCalled)
    }

    pub fn was_called_times(self, times: usize) -> Result<bool> {
        self.to(Matcher::WasCalledTimes(times))
    }

    /// Any call whose leading arguments deep-equal `args`.
    pub fn was_called_with(self, args: &[Value]) -> Result<bool> {
        self.to(Matcher::WasCalledWith(args.to_vec()))
    }
}
