//! Dynamic values and the comparisons matchers and spies are built on.
//!
//! Everything a spec hands to the engine (scope entries, spy arguments,
//! matcher subjects) is a [`serde_json::Value`]. Equality is structural:
//!
//! - objects compare key-by-key, ignoring key order
//! - arrays compare element-by-element, in order
//! - numbers compare by numeric value, so `1` equals `1.0`
//! - there is no identity-based fallback
//!
//! `NaN` has no `Value` representation (`Value::from(f64::NAN)` is `null`),
//! so it never reaches a comparison.

use std::fmt;

use serde_json::{Number, Value};

/// Structural equality between two values.
pub fn deep_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => numbers_equal(a, b),
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| deep_equal(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(key, x)| b.get(key).is_some_and(|y| deep_equal(x, y)))
        }
        _ => false,
    }
}

/// Element-wise [`deep_equal`] over two argument lists of equal length.
pub fn args_equal(a: &[Value], b: &[Value]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| deep_equal(x, y))
}

fn numbers_equal(a: &Number, b: &Number) -> bool {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return x == y;
    }
    if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
        return x == y;
    }
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

/// Truthiness in the loose sense BDD matchers use.
///
/// `null`, `false`, `0` and `""` are falsy. Everything else, including empty
/// arrays and objects, is truthy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Containment: substring, array element or contiguous sub-sequence, or sub-mapping.
pub fn contains(haystack: &Value, needle: &Value) -> bool {
    match (haystack, needle) {
        (Value::String(h), Value::String(n)) => h.contains(n.as_str()),
        (Value::Array(h), Value::Array(n)) => {
            h.iter().any(|item| deep_equal(item, needle))
                || n.is_empty()
                || h.windows(n.len()).any(|window| args_equal(window, n))
        }
        (Value::Array(h), _) => h.iter().any(|item| deep_equal(item, needle)),
        (Value::Object(h), Value::Object(n)) => n
            .iter()
            .all(|(key, x)| h.get(key).is_some_and(|y| deep_equal(x, y))),
        _ => false,
    }
}

/// The shape of a [`Value`], used by the `to_be_a` matcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum TypeClass {
    Null,
    Bool,
    Number,
    String,
    Array,
    Object,
}

impl TypeClass {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => TypeClass::Null,
            Value::Bool(_) => TypeClass::Bool,
            Value::Number(_) => TypeClass::Number,
            Value::String(_) => TypeClass::String,
            Value::Array(_) => TypeClass::Array,
            Value::Object(_) => TypeClass::Object,
        }
    }
}

impl fmt::Display for TypeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeClass::Null => write!(f, "null"),
            TypeClass::Bool => write!(f, "bool"),
            TypeClass::Number => write!(f, "number"),
            TypeClass::String => write!(f, "string"),
            TypeClass::Array => write!(f, "array"),
            TypeClass::Object => write!(f, "object"),
        }
    }
}

/// Compact rendering used in matcher messages.
pub(crate) fn render(value: &Value) -> String {
    value.to_string()
}

pub(crate) fn render_args(args: &[Value]) -> String {
    let parts: Vec<String> = args.iter().map(render).collect();
    format!("({})", parts.join(", "))
}
