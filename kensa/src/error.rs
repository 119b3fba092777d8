use std::{sync::Arc, time::Duration};

use serde::{Serialize, Serializer};
use serde_json::Value;

/// The single error type for all Kensa operations.
///
/// Every fallible Kensa API returns `kensa::Result<T>` (alias for
/// `Result<T, kensa::Error>`). Spec bodies and hooks return the same type,
/// so `?` inside a body turns any of these into an Errored spec.
///
/// A failed matcher is *not* an error: it is recorded as an
/// [`ExpectationResult`](crate::ExpectationResult) and the body keeps going.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// A stub configured with [`Spy::throws`](crate::Spy::throws) (or user code)
    /// threw a value.
    #[error("Thrown: {0}")]
    Thrown(Value),

    /// The body gave up explicitly, see [`fail`](crate::fail).
    #[error("{0}")]
    Failed(String),

    #[error("Panicked: {0}")]
    Panicked(String),

    /// A `waits_for` predicate never became true in time.
    #[error("timed out after {elapsed:?} waiting for {message}")]
    Timeout { message: String, elapsed: Duration },

    /// An async spec body ran past [`Config::spec_timeout`](crate::Config::spec_timeout).
    #[error("spec did not complete within {0:?}")]
    SpecTimeout(Duration),

    #[error("Run cancelled")]
    Cancelled,

    #[error("Method '{0}' is already wrapped by a spy")]
    DoubleWrap(String),

    #[error("Object has no method '{0}'")]
    NoSuchMethod(String),

    #[error("Call {index} requested but only {count} calls were recorded")]
    NoSuchCall { index: usize, count: usize },

    #[error("No calls were recorded")]
    NoCallsRecorded,

    #[error("Expectation made outside of a running spec")]
    NoActiveSpec,

    #[error("IO error: {0}")]
    IoError(#[source] Arc<std::io::Error>),

    #[error("External error: {0}")]
    External(#[source] Arc<dyn std::error::Error + Send + Sync>),
}

impl Error {
    pub fn external(e: impl std::error::Error + Send + Sync + 'static) -> Self {
        Error::External(Arc::new(e))
    }

    /// Returns true for errors that end a spec as Errored because it ran out of time.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout { .. } | Error::SpecTimeout(_))
    }

    /// Returns true for misuse of the engine's own API.
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            Error::DoubleWrap(_)
                | Error::NoSuchMethod(_)
                | Error::NoSuchCall { .. }
                | Error::NoCallsRecorded
                | Error::NoActiveSpec
        )
    }
}

/// Build an [`Error::Failed`] to end a spec body early.
///
/// ```rust
/// # fn body(ready: bool) -> kensa::Result {
/// if !ready {
///     return Err(kensa::fail("fixture was not ready"));
/// }
/// # Ok(())
/// # }
/// ```
pub fn fail(message: impl Into<String>) -> Error {
    Error::Failed(message.into())
}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Thrown(a), Self::Thrown(b)) => a == b,
            (Self::Failed(a), Self::Failed(b)) => a == b,
            (Self::Panicked(a), Self::Panicked(b)) => a == b,
            (
                Self::Timeout {
                    message: m1,
                    elapsed: e1,
                },
                Self::Timeout {
                    message: m2,
                    elapsed: e2,
                },
            ) => m1 == m2 && e1 == e2,
            (Self::SpecTimeout(a), Self::SpecTimeout(b)) => a == b,
            (Self::Cancelled, Self::Cancelled) => true,
            (Self::DoubleWrap(a), Self::DoubleWrap(b)) => a == b,
            (Self::NoSuchMethod(a), Self::NoSuchMethod(b)) => a == b,
            (
                Self::NoSuchCall {
                    index: i1,
                    count: c1,
                },
                Self::NoSuchCall {
                    index: i2,
                    count: c2,
                },
            ) => i1 == i2 && c1 == c2,
            (Self::NoCallsRecorded, Self::NoCallsRecorded) => true,
            (Self::NoActiveSpec, Self::NoActiveSpec) => true,
            (Self::IoError(a), Self::IoError(b)) => Arc::ptr_eq(a, b),
            (Self::External(a), Self::External(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::IoError(Arc::new(e))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::external(e)
    }
}

// Reports carry the error as its display text.
impl Serialize for Error {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn timeout_message_names_the_condition() {
        let err = Error::Timeout {
            message: "the list to render".into(),
            elapsed: Duration::from_millis(50),
        };
        assert_eq!(
            err.to_string(),
            "timed out after 50ms waiting for the list to render"
        );
        assert!(err.is_timeout());
        assert!(!err.is_usage_error());
    }

    #[test]
    fn usage_errors_are_classified() {
        assert!(Error::NoCallsRecorded.is_usage_error());
        assert!(Error::DoubleWrap("save".into()).is_usage_error());
        assert!(!Error::Cancelled.is_usage_error());
    }

    #[test]
    fn thrown_values_compare_structurally() {
        assert_eq!(Error::Thrown(json!({"code": 1})), Error::Thrown(json!({"code": 1})));
        assert_ne!(Error::Thrown(json!(1)), Error::Thrown(json!(2)));
    }

    #[test]
    fn serializes_as_display_text() {
        let text = serde_json::to_string(&fail("boom")).unwrap();
        assert_eq!(text, "\"boom\"");
    }
}
