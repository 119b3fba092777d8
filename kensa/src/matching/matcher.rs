use std::{fmt, rc::Rc};

use serde_json::Value;

use crate::{
    Spy,
    matching::ExpectationResult,
    value::{TypeClass, contains, deep_equal, is_truthy, render, render_args},
};

type Predicate = Rc<dyn Fn(&Value) -> bool>;

/// What an expectation is about: a value, or a spy's call history.
#[derive(Debug, Clone)]
pub(crate) enum Subject {
    Value(Value),
    Spy(Spy),
}

impl Subject {
    fn render(&self) -> String {
        match self {
            Subject::Value(v) => render(v),
            Subject::Spy(spy) => format!("spy '{}'", spy.name()),
        }
    }
}

/// The table of built-in matchers.
///
/// Each variant is a named predicate over the subject. Negation is not a
/// separate matcher: [`Expectation::not`](crate::Expectation::not) flips the
/// verdict of the same entry, so passing and failing messages stay symmetric.
#[derive(Clone)]
pub enum Matcher {
    Equal(Value),
    Truthy,
    Falsy,
    Null,
    /// Substring, array element or sub-sequence, or sub-object.
    Contain(Value),
    BeA(TypeClass),
    GreaterThan(f64),
    LessThan(f64),
    /// Equal when rounded to `precision` decimal places.
    CloseTo {
        expected: f64,
        precision: i32,
    },
    StartWith(String),
    EndWith(String),
    /// A custom named predicate.
    Satisfy {
        name: String,
        predicate: Predicate,
    },
    WasCalled,
    WasNotCalled,
    WasCalledTimes(usize),
    WasCalledWith(Vec<Value>),
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.name(), self.render_args())
    }
}

impl Matcher {
    /// Build a [`Matcher::Satisfy`] from a name and predicate.
    pub fn satisfy<F>(name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&Value) -> bool + 'static,
    {
        Matcher::Satisfy {
            name: name.into(),
            predicate: Rc::new(predicate),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Matcher::Equal(_) => "to_equal",
            Matcher::Truthy => "to_be_truthy",
            Matcher::Falsy => "to_be_falsy",
            Matcher::Null => "to_be_null",
            Matcher::Contain(_) => "to_contain",
            Matcher::BeA(_) => "to_be_a",
            Matcher::GreaterThan(_) => "to_be_greater_than",
            Matcher::LessThan(_) => "to_be_less_than",
            Matcher::CloseTo { .. } => "to_be_close_to",
            Matcher::StartWith(_) => "to_start_with",
            Matcher::EndWith(_) => "to_end_with",
            Matcher::Satisfy { name, .. } => name.as_str(),
            Matcher::WasCalled => "was_called",
            Matcher::WasNotCalled => "was_not_called",
            Matcher::WasCalledTimes(_) => "was_called_times",
            Matcher::WasCalledWith(_) => "was_called_with",
        }
    }

    fn render_args(&self) -> String {
        match self {
            Matcher::Equal(v) | Matcher::Contain(v) => format!("({})", render(v)),
            Matcher::BeA(class) => format!("({class})"),
            Matcher::GreaterThan(n) | Matcher::LessThan(n) => format!("({n})"),
            Matcher::CloseTo {
                expected,
                precision,
            } => format!("({expected}, {precision})"),
            Matcher::StartWith(s) | Matcher::EndWith(s) => format!("({s:?})"),
            Matcher::WasCalledTimes(n) => format!("({n})"),
            Matcher::WasCalledWith(args) => render_args(args),
            _ => "()".to_string(),
        }
    }

    /// The verb phrase after "to" in a failure message.
    fn phrase(&self) -> String {
        match self {
            Matcher::Equal(v) => format!("equal {}", render(v)),
            Matcher::Truthy => "be truthy".to_string(),
            Matcher::Falsy => "be falsy".to_string(),
            Matcher::Null => "be null".to_string(),
            Matcher::Contain(v) => format!("contain {}", render(v)),
            Matcher::BeA(class) => format!("be a {class}"),
            Matcher::GreaterThan(n) => format!("be greater than {n}"),
            Matcher::LessThan(n) => format!("be less than {n}"),
            Matcher::CloseTo {
                expected,
                precision,
            } => format!("be close to {expected} ({precision} decimal places)"),
            Matcher::StartWith(s) => format!("start with {s:?}"),
            Matcher::EndWith(s) => format!("end with {s:?}"),
            Matcher::Satisfy { name, .. } => format!("satisfy {name}"),
            Matcher::WasCalled => "have been called".to_string(),
            Matcher::WasNotCalled => "have no calls".to_string(),
            Matcher::WasCalledTimes(n) => format!("have been called {n} times"),
            Matcher::WasCalledWith(args) => format!("have been called with {}", render_args(args)),
        }
    }

    fn wants_spy(&self) -> bool {
        matches!(
            self,
            Matcher::WasCalled
                | Matcher::WasNotCalled
                | Matcher::WasCalledTimes(_)
                | Matcher::WasCalledWith(_)
        )
    }

    /// Evaluate against the subject. `None` means the subject is the wrong kind.
    fn test(&self, subject: &Subject) -> Option<bool> {
        match (self, subject) {
            (Matcher::WasCalled, Subject::Spy(spy)) => Some(spy.called()),
            (Matcher::WasNotCalled, Subject::Spy(spy)) => Some(!spy.called()),
            (Matcher::WasCalledTimes(n), Subject::Spy(spy)) => Some(spy.call_count() == *n),
            (Matcher::WasCalledWith(args), Subject::Spy(spy)) => Some(spy.called_with(args)),
            (_, Subject::Spy(_)) => None,
            (m, Subject::Value(_)) if m.wants_spy() => None,
            (m, Subject::Value(actual)) => Some(m.test_value(actual)),
        }
    }

    fn test_value(&self, actual: &Value) -> bool {
        match self {
            Matcher::Equal(expected) => deep_equal(actual, expected),
            Matcher::Truthy => is_truthy(actual),
            Matcher::Falsy => !is_truthy(actual),
            Matcher::Null => actual.is_null(),
            Matcher::Contain(needle) => contains(actual, needle),
            Matcher::BeA(class) => TypeClass::of(actual) == *class,
            Matcher::GreaterThan(n) => actual.as_f64().is_some_and(|a| a > *n),
            Matcher::LessThan(n) => actual.as_f64().is_some_and(|a| a < *n),
            Matcher::CloseTo {
                expected,
                precision,
            } => actual
                .as_f64()
                .is_some_and(|a| (expected - a).abs() < 10f64.powi(-precision) / 2.0),
            Matcher::StartWith(prefix) => actual.as_str().is_some_and(|s| s.starts_with(prefix)),
            Matcher::EndWith(suffix) => actual.as_str().is_some_and(|s| s.ends_with(suffix)),
            Matcher::Satisfy { predicate, .. } => predicate(actual),
            Matcher::WasCalled
            | Matcher::WasNotCalled
            | Matcher::WasCalledTimes(_)
            | Matcher::WasCalledWith(_) => false,
        }
    }

    /// Extra context appended to failure messages of spy matchers.
    fn detail(&self, subject: &Subject) -> Option<String> {
        let Subject::Spy(spy) = subject else {
            return None;
        };
        match self {
            Matcher::WasCalledTimes(_) | Matcher::WasNotCalled => {
                Some(format!("it was called {} times", spy.call_count()))
            }
            Matcher::WasCalledWith(_) => {
                let calls: Vec<String> = spy.all_args().iter().map(|a| render_args(a)).collect();
                if calls.is_empty() {
                    Some("it was never called".to_string())
                } else {
                    Some(format!("actual calls were [{}]", calls.join(", ")))
                }
            }
            _ => None,
        }
    }
}

/// Evaluate `matcher` against `subject`, applying negation.
pub(crate) fn judge(subject: &Subject, matcher: &Matcher, negated: bool) -> ExpectationResult {
    let not = if negated { "not()." } else { "" };
    let description = format!(
        "expect({}).{}{}{}",
        subject.render(),
        not,
        matcher.name(),
        matcher.render_args()
    );

    let Some(outcome) = matcher.test(subject) else {
        let message = match subject {
            Subject::Value(v) => format!("Expected a spy, but got {}.", render(v)),
            Subject::Spy(spy) => format!("Expected a value, but got spy '{}'.", spy.name()),
        };
        return ExpectationResult::new(description, false, message);
    };

    let passed = outcome != negated;
    if passed {
        return ExpectationResult::new(description, true, "Passed.".to_string());
    }

    let to = if negated { "not to" } else { "to" };
    let mut message = format!("Expected {} {} {}", subject.render(), to, matcher.phrase());
    if let Some(detail) = matcher.detail(subject) {
        message.push_str(", but ");
        message.push_str(&detail);
    }
    message.push('.');
    ExpectationResult::new(description, false, message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn value(v: Value) -> Subject {
        Subject::Value(v)
    }

    #[test]
    fn equality_pass_and_fail_messages() {
        let pass = judge(&value(json!(3)), &Matcher::Equal(json!(3)), false);
        assert!(pass.passed());
        assert_eq!(pass.message(), "Passed.");
        assert_eq!(pass.description(), "expect(3).to_equal(3)");

        let fail = judge(&value(json!(3)), &Matcher::Equal(json!(4)), false);
        assert!(!fail.passed());
        assert_eq!(fail.message(), "Expected 3 to equal 4.");
    }

    #[test]
    fn negation_is_symmetric() {
        let m = Matcher::Equal(json!("a"));
        let negated_pass = judge(&value(json!("b")), &m, true);
        assert!(negated_pass.passed());
        assert_eq!(negated_pass.description(), "expect(\"b\").not().to_equal(\"a\")");

        let negated_fail = judge(&value(json!("a")), &m, true);
        assert!(!negated_fail.passed());
        assert_eq!(negated_fail.message(), "Expected \"a\" not to equal \"a\".");
    }

    #[test]
    fn value_matchers() {
        let cases = [
            (json!(1), Matcher::Truthy, true),
            (json!(""), Matcher::Falsy, true),
            (json!(null), Matcher::Null, true),
            (json!("todo list"), Matcher::Contain(json!("list")), true),
            (json!([1, 2]), Matcher::Contain(json!(3)), false),
            (json!(1.5), Matcher::BeA(TypeClass::Number), true),
            (json!("1"), Matcher::BeA(TypeClass::Number), false),
            (json!(5), Matcher::GreaterThan(4.0), true),
            (json!("5"), Matcher::GreaterThan(4.0), false),
            (json!(3), Matcher::LessThan(4.0), true),
            (json!("milk"), Matcher::StartWith("mi".into()), true),
            (json!("milk"), Matcher::EndWith("lk".into()), true),
            (json!(7), Matcher::EndWith("7".into()), false),
        ];
        for (actual, matcher, expected) in cases {
            let result = judge(&value(actual.clone()), &matcher, false);
            assert_eq!(result.passed(), expected, "{matcher:?} on {actual}");
        }
    }

    #[test]
    fn close_to_uses_decimal_places() {
        let m = Matcher::CloseTo {
            expected: 1.0,
            precision: 2,
        };
        assert!(judge(&value(json!(1.004)), &m, false).passed());
        assert!(!judge(&value(json!(1.006)), &m, false).passed());
    }

    #[test]
    fn custom_predicate() {
        let even = Matcher::satisfy("to_be_even", |v| v.as_i64().is_some_and(|n| n % 2 == 0));
        assert!(judge(&value(json!(4)), &even, false).passed());
        let fail = judge(&value(json!(3)), &even, false);
        assert_eq!(fail.message(), "Expected 3 to satisfy to_be_even.");
        assert_eq!(fail.description(), "expect(3).to_be_even()");
    }

    #[test]
    fn spy_matchers() {
        let spy = Spy::new("save");
        let subject = Subject::Spy(spy.clone());
        assert!(judge(&subject, &Matcher::WasNotCalled, false).passed());
        assert!(!judge(&subject, &Matcher::WasCalled, false).passed());

        spy.call(&[json!(1), json!(2)]).unwrap();
        assert!(judge(&subject, &Matcher::WasCalled, false).passed());
        assert!(judge(&subject, &Matcher::WasCalledTimes(1), false).passed());
        assert!(judge(&subject, &Matcher::WasCalledWith(vec![json!(1)]), false).passed());

        let fail = judge(&subject, &Matcher::WasCalledWith(vec![json!(9)]), false);
        assert_eq!(
            fail.message(),
            "Expected spy 'save' to have been called with (9), but actual calls were [(1, 2)]."
        );
    }

    #[test]
    fn wrong_subject_kind_always_fails() {
        let on_value = judge(&value(json!(1)), &Matcher::WasCalled, true);
        assert!(!on_value.passed());
        assert_eq!(on_value.message(), "Expected a spy, but got 1.");

        let on_spy = judge(&Subject::Spy(Spy::new("s")), &Matcher::Truthy, true);
        assert!(!on_spy.passed());
    }
}
