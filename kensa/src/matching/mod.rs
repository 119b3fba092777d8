//! Expectations and the matcher table.

mod expectation;
mod expectation_result;
mod matcher;

pub use expectation::Expectation;
pub(crate) use expectation::Sink;
pub use expectation_result::ExpectationResult;
pub use matcher::Matcher;
pub(crate) use matcher::{Subject, judge};

use serde_json::Value;

use crate::Spy;

/// Bind a value to an expectation against the spec running on this thread.
///
/// The spec is looked up when the matcher is called, so an `Expectation`
/// built outside of a spec fails with [`Error::NoActiveSpec`](crate::Error::NoActiveSpec).
pub fn expect(actual: impl Into<Value>) -> Expectation {
    Expectation::new(Subject::Value(actual.into()), Sink::Current)
}

/// Bind a spy to an expectation against the spec running on this thread.
pub fn expect_spy(spy: &Spy) -> Expectation {
    Expectation::new(Subject::Spy(spy.clone()), Sink::Current)
}
