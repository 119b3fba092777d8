use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use serde_json::Value;

use crate::value::args_equal;

static NEXT_SEQ: AtomicU64 = AtomicU64::new(1);

/// Next value of the process-wide call counter.
///
/// Every spy invocation takes one number at the moment it starts, so two
/// calls never share an order index, even inside one synchronous tick.
pub(crate) fn next_seq() -> u64 {
    NEXT_SEQ.fetch_add(1, Ordering::Relaxed)
}

/// How a recorded call ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CallOutcome {
    Returned(Value),
    /// The call failed; holds the thrown value (or the error text for other failures).
    Threw(Value),
}

/// One recorded invocation of a [`Spy`](crate::Spy).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Call {
    args: Vec<Value>,
    seq: u64,
    outcome: CallOutcome,
}

impl Call {
    pub(crate) fn new(args: Vec<Value>, seq: u64, outcome: CallOutcome) -> Self {
        Self { args, seq, outcome }
    }

    /// Arguments the spy was called with.
    pub fn args(&self) -> &[Value] {
        &self.args
    }

    pub fn arg(&self, index: usize) -> Option<&Value> {
        self.args.get(index)
    }

    /// Global order index of this call; see [`Spy::called_before`](crate::Spy::called_before).
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn outcome(&self) -> &CallOutcome {
        &self.outcome
    }

    /// Returns the value the call returned, if it didn't throw.
    pub fn return_value(&self) -> Option<&Value> {
        match &self.outcome {
            CallOutcome::Returned(v) => Some(v),
            CallOutcome::Threw(_) => None,
        }
    }

    pub fn threw(&self) -> bool {
        matches!(self.outcome, CallOutcome::Threw(_))
    }

    /// True if the leading arguments equal `expected` (extra trailing arguments are allowed).
    pub fn called_with(&self, expected: &[Value]) -> bool {
        self.args.len() >= expected.len() && args_equal(&self.args[..expected.len()], expected)
    }

    /// True if the arguments equal `expected` exactly, count included.
    pub fn called_with_exactly(&self, expected: &[Value]) -> bool {
        args_equal(&self.args, expected)
    }
}
