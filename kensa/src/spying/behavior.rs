use std::fmt;

use serde_json::Value;

use crate::Method;

/// What a spy does when it is called, besides recording the call.
///
/// Configured through [`Spy::call_through`](crate::Spy::call_through),
/// [`Spy::returns`](crate::Spy::returns), [`Spy::throws`](crate::Spy::throws)
/// and [`Spy::fake`](crate::Spy::fake). The last configuration wins.
#[derive(Clone, Default)]
pub enum Behavior {
    /// Record and return `null`. This is the default.
    #[default]
    Record,
    /// Invoke the wrapped original. Anonymous spies return `null`.
    CallThrough,
    /// Return a fixed value.
    Return(Value),
    /// Fail with [`Error::Thrown`](crate::Error::Thrown).
    Throw(Value),
    /// Delegate to a replacement implementation.
    Fake(Method),
}

impl fmt::Debug for Behavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Behavior::Record => write!(f, "Record"),
            Behavior::CallThrough => write!(f, "CallThrough"),
            Behavior::Return(v) => f.debug_tuple("Return").field(v).finish(),
            Behavior::Throw(v) => f.debug_tuple("Throw").field(v).finish(),
            Behavior::Fake(_) => write!(f, "Fake(..)"),
        }
    }
}

impl fmt::Display for Behavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Behavior::Record => write!(f, "Record"),
            Behavior::CallThrough => write!(f, "CallThrough"),
            Behavior::Return(_) => write!(f, "Return"),
            Behavior::Throw(_) => write!(f, "Throw"),
            Behavior::Fake(_) => write!(f, "Fake"),
        }
    }
}
