use std::{fmt, hash};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifies one [`Runner::run`](crate::Runner::run) invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, hash::Hash, Serialize, Deserialize)]
pub struct RunId(u128);

impl RunId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4().as_u128())
    }

    pub fn value(&self) -> u128 {
        self.0
    }
}

impl From<u128> for RunId {
    fn from(value: u128) -> Self {
        RunId(value)
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Uuid::from_u128(self.0))
    }
}

impl Default for RunId {
    fn default() -> Self {
        RunId::new()
    }
}
