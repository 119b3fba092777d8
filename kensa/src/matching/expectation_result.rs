use serde::{Deserialize, Serialize};

/// The outcome of one matcher evaluation, recorded against the running spec.
///
/// Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExpectationResult {
    description: String,
    passed: bool,
    message: String,
}

impl ExpectationResult {
    pub(crate) fn new(description: String, passed: bool, message: String) -> Self {
        Self {
            description,
            passed,
            message,
        }
    }

    /// What was asserted, e.g. `expect(3).to_equal(4)`.
    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn passed(&self) -> bool {
        self.passed
    }

    /// `"Passed."` on success, otherwise a sentence explaining the mismatch.
    pub fn message(&self) -> &str {
        &self.message
    }
}
