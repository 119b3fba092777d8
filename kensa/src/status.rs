use std::{fmt, hash};

use serde::{Deserialize, Serialize};

/// Where a spec is in its lifecycle.
///
/// `Pending → Running → {Passed, Failed, Errored}`, or straight to `Skipped`
/// for `xit`, `xdescribe`, filtered-out specs and specs left behind by a
/// cancelled run. Reports only ever carry terminal states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, hash::Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpecStatus {
    #[default]
    Pending,
    Running,
    /// Every expectation passed and nothing errored.
    Passed,
    /// At least one expectation failed.
    Failed,
    /// A hook, the body or a block returned an error, panicked or timed out.
    Errored,
    Skipped,
}

impl SpecStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SpecStatus::Pending | SpecStatus::Running)
    }

    /// Returns true for `Failed` and `Errored`.
    pub fn is_failure(&self) -> bool {
        matches!(self, SpecStatus::Failed | SpecStatus::Errored)
    }
}

impl fmt::Display for SpecStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpecStatus::Pending => write!(f, "Pending"),
            SpecStatus::Running => write!(f, "Running"),
            SpecStatus::Passed => write!(f, "Passed"),
            SpecStatus::Failed => write!(f, "Failed"),
            SpecStatus::Errored => write!(f, "Errored"),
            SpecStatus::Skipped => write!(f, "Skipped"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        assert!(!SpecStatus::Pending.is_terminal());
        assert!(!SpecStatus::Running.is_terminal());
        assert!(SpecStatus::Skipped.is_terminal());
        assert!(SpecStatus::Failed.is_failure());
        assert!(SpecStatus::Errored.is_failure());
        assert!(!SpecStatus::Skipped.is_failure());
        assert_eq!(SpecStatus::default(), SpecStatus::Pending);
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&SpecStatus::Errored).unwrap(),
            "\"errored\""
        );
        assert_eq!(SpecStatus::Passed.to_string(), "Passed");
    }
}
