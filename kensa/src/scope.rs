use std::collections::BTreeMap;

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::Result;

/// Per-spec shared state.
///
/// A fresh `Scope` is created for every spec execution. The `before` hooks
/// fill it in (outer to inner), the body and its blocks read and mutate it,
/// the `after` hooks see the final state, and then it is dropped. Nothing
/// written here leaks into the next spec.
///
/// Entries are enumerable, so a spec can assert on exactly what its hooks
/// prepared. Local bindings inside a hook closure are not part of the scope.
///
/// # Example
///
/// ```rust
/// use kensa::{Scope, json};
///
/// let mut scope = Scope::default();
/// scope.set("count", 0);
/// let next = scope.get("count").and_then(|v| v.as_i64()).unwrap_or(0) + 1;
/// scope.set("count", next);
/// assert_eq!(scope.get("count"), Some(&json!(1)));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Scope {
    entries: BTreeMap<String, Value>,
}

impl Scope {
    /// Store a value, returning the previous one.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.entries.insert(key.into(), value.into())
    }

    /// Store any serializable value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::External`](crate::Error::External) if `value` can't be
    /// represented as JSON.
    pub fn set_serialized<T: Serialize>(&mut self, key: impl Into<String>, value: &T) -> Result<()> {
        let value = serde_json::to_value(value)?;
        self.entries.insert(key.into(), value);
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Read an entry back into a concrete type.
    ///
    /// Returns `None` if the key is missing or doesn't deserialize as `T`.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.entries
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Returns the keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
