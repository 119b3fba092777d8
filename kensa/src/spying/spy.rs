use std::{
    cell::{Cell, RefCell},
    fmt,
    rc::Rc,
};

use serde_json::Value;

use crate::{
    Error, Method, Object, Result, cx,
    object::WeakObject,
    spying::{Behavior, Call, CallOutcome, call::next_seq},
    value::deep_equal,
};

struct Target {
    object: WeakObject,
    method: String,
    original: Method,
}

struct SpyInner {
    name: String,
    calls: RefCell<Vec<Call>>,
    behavior: RefCell<Behavior>,
    target: Option<Target>,
    restored: Cell<bool>,
}

/// An instrumented callable that records every invocation.
///
/// A spy is either anonymous ([`Spy::new`]) and handed to code as a callback
/// via [`as_method`](Self::as_method), or it wraps a method slot of an
/// [`Object`] ([`Spy::wrap`]) until [`restore`](Self::restore) puts the
/// original back.
///
/// Provides methods to inspect:
/// - How often and with which arguments it was called
/// - What each call returned or threw
/// - Ordering relative to other spies
///
/// Cloning a `Spy` yields another handle to the same recorder. Spies are
/// `!Send`; they belong to the single thread that runs the specs.
///
/// # Example
///
/// ```rust
/// use kensa::{Object, Spy, json};
///
/// let store = Object::new();
/// store.define("save", |_| Ok(json!(true)));
///
/// let spy = Spy::wrap(&store, "save").unwrap().call_through();
/// store.invoke("save", &[json!(1), json!(2)]).unwrap();
///
/// assert!(spy.called_with(&[json!(1), json!(2)]));
/// assert_eq!(spy.call_count(), 1);
///
/// assert!(spy.restore());
/// assert!(!store.is_wrapped("save"));
/// ```
#[derive(Clone)]
pub struct Spy {
    inner: Rc<SpyInner>,
}

impl fmt::Debug for Spy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Spy")
            .field("name", &self.inner.name)
            .field("calls", &self.call_count())
            .field("behavior", &*self.inner.behavior.borrow())
            .field("wrapping", &self.wrapped_method())
            .finish_non_exhaustive()
    }
}

impl Spy {
    /// Create an anonymous spy. Calling it records the call and returns `null`.
    pub fn new(name: impl Into<String>) -> Self {
        Self::build(name.into(), None)
    }

    /// Replace `object`'s `method` with a recording wrapper.
    ///
    /// The wrapper records calls and then applies the spy's [`Behavior`];
    /// use [`call_through`](Self::call_through) to keep the original
    /// behavior while recording.
    ///
    /// Inside a running spec the spy is restored automatically after the
    /// spec's `after` hooks. Outside of one, call [`restore`](Self::restore).
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoSuchMethod`] if the method isn't defined, and
    /// [`Error::DoubleWrap`] if another spy already wraps it and hasn't been
    /// restored.
    pub fn wrap(object: &Object, method: &str) -> Result<Self> {
        if !object.has_method(method) {
            return Err(Error::NoSuchMethod(method.to_string()));
        }
        if object.is_wrapped(method) {
            return Err(Error::DoubleWrap(method.to_string()));
        }

        // The original is filled in once the slot is swapped; the wrapper only
        // needs the recorder, which it reaches through this cell.
        let slot: Rc<RefCell<Option<Spy>>> = Rc::new(RefCell::new(None));
        let wrapper_slot = slot.clone();
        let wrapper: Method = Rc::new(move |args: &[Value]| {
            let spy = wrapper_slot.borrow().clone();
            match spy {
                Some(spy) => spy.call(args),
                None => Ok(Value::Null),
            }
        });

        let original = object.install_wrapper(method, wrapper)?;
        let spy = Self::build(
            method.to_string(),
            Some(Target {
                object: object.downgrade(),
                method: method.to_string(),
                original,
            }),
        );
        *slot.borrow_mut() = Some(spy.clone());
        if let Ok(state) = cx::current() {
            state.track_spy(spy.clone());
        }
        tracing::trace!(method, "spy installed");
        Ok(spy)
    }

    fn build(name: String, target: Option<Target>) -> Self {
        Self {
            inner: Rc::new(SpyInner {
                name,
                calls: RefCell::new(Vec::new()),
                behavior: RefCell::new(Behavior::Record),
                target,
                restored: Cell::new(false),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    // ==================== Invocation ====================

    /// Invoke the spy: take an order index, apply the behavior, record the call.
    pub fn call(&self, args: &[Value]) -> Result<Value> {
        let seq = next_seq();
        let behavior = self.inner.behavior.borrow().clone();
        let result = match behavior {
            Behavior::Record => Ok(Value::Null),
            Behavior::CallThrough => match &self.inner.target {
                Some(target) => (target.original)(args),
                None => Ok(Value::Null),
            },
            Behavior::Return(value) => Ok(value),
            Behavior::Throw(value) => Err(Error::Thrown(value)),
            Behavior::Fake(fake) => fake(args),
        };

        let outcome = match &result {
            Ok(value) => CallOutcome::Returned(value.clone()),
            Err(Error::Thrown(value)) => CallOutcome::Threw(value.clone()),
            Err(e) => CallOutcome::Threw(Value::String(e.to_string())),
        };
        self.inner
            .calls
            .borrow_mut()
            .push(Call::new(args.to_vec(), seq, outcome));
        result
    }

    /// Returns a [`Method`] that calls this spy, for handing it out as a callback.
    pub fn as_method(&self) -> Method {
        let spy = self.clone();
        Rc::new(move |args: &[Value]| spy.call(args))
    }

    // ==================== Configuration ====================

    /// Invoke the wrapped original on every call, still recording.
    pub fn call_through(self) -> Self {
        self.set_behavior(Behavior::CallThrough)
    }

    /// Return `value` on every call.
    pub fn returns(self, value: impl Into<Value>) -> Self {
        self.set_behavior(Behavior::Return(value.into()))
    }

    /// Fail every call with [`Error::Thrown`].
    pub fn throws(self, value: impl Into<Value>) -> Self {
        self.set_behavior(Behavior::Throw(value.into()))
    }

    /// Delegate every call to `fake`.
    pub fn fake<F>(self, fake: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value> + 'static,
    {
        self.set_behavior(Behavior::Fake(Rc::new(fake)))
    }

    /// Replace the behavior through a shared handle.
    pub fn set_behavior(self, behavior: Behavior) -> Self {
        *self.inner.behavior.borrow_mut() = behavior;
        self
    }

    pub fn behavior(&self) -> Behavior {
        self.inner.behavior.borrow().clone()
    }

    /// Forget all recorded calls. The behavior is kept.
    pub fn reset(&self) {
        self.inner.calls.borrow_mut().clear();
    }

    // ==================== Restoration ====================

    /// Put the original method back into the wrapped slot.
    ///
    /// Returns true the first time it restores something. Calling it again,
    /// calling it on an anonymous spy, or calling it after the object is gone
    /// is a no-op returning false.
    pub fn restore(&self) -> bool {
        let Some(target) = &self.inner.target else {
            return false;
        };
        if self.inner.restored.replace(true) {
            return false;
        }
        match target.object.upgrade() {
            Some(object) => {
                object.reinstate(&target.method, target.original.clone());
                tracing::trace!(method = %target.method, "spy restored");
                true
            }
            None => false,
        }
    }

    pub fn is_restored(&self) -> bool {
        self.inner.restored.get()
    }

    /// Returns the wrapped method name, if this spy wraps one.
    pub fn wrapped_method(&self) -> Option<&str> {
        self.inner.target.as_ref().map(|t| t.method.as_str())
    }

    // ==================== Inspection ====================

    pub fn call_count(&self) -> usize {
        self.inner.calls.borrow().len()
    }

    pub fn called(&self) -> bool {
        self.call_count() > 0
    }

    pub fn called_once(&self) -> bool {
        self.call_count() == 1
    }

    pub fn called_twice(&self) -> bool {
        self.call_count() == 2
    }

    pub fn called_thrice(&self) -> bool {
        self.call_count() == 3
    }

    /// True if any call's leading arguments equal `args` (deep equality).
    pub fn called_with(&self, args: &[Value]) -> bool {
        self.inner.calls.borrow().iter().any(|c| c.called_with(args))
    }

    /// True if any call's arguments equal `args`, argument count included.
    pub fn called_with_exactly(&self, args: &[Value]) -> bool {
        self.inner
            .calls
            .borrow()
            .iter()
            .any(|c| c.called_with_exactly(args))
    }

    /// True if the spy was called and every call's leading arguments equal `args`.
    pub fn always_called_with(&self, args: &[Value]) -> bool {
        let calls = self.inner.calls.borrow();
        !calls.is_empty() && calls.iter().all(|c| c.called_with(args))
    }

    /// True if any call returned `value`.
    pub fn returned(&self, value: &Value) -> bool {
        self.inner
            .calls
            .borrow()
            .iter()
            .any(|c| c.return_value().is_some_and(|v| deep_equal(v, value)))
    }

    /// True if any call threw.
    pub fn threw(&self) -> bool {
        self.inner.calls.borrow().iter().any(Call::threw)
    }

    /// True if this spy's first call happened before `other`'s last call.
    ///
    /// A called spy is before a spy that was never called; an uncalled spy is
    /// before nothing. Order indexes come from a process-wide counter, so
    /// there are no ties.
    pub fn called_before(&self, other: &Spy) -> bool {
        let Some(first) = self.first_seq() else {
            return false;
        };
        match other.last_seq() {
            Some(other_last) => first < other_last,
            None => true,
        }
    }

    /// True if this spy's last call happened after `other`'s first call.
    ///
    /// False if either spy was never called.
    pub fn called_after(&self, other: &Spy) -> bool {
        match (self.last_seq(), other.first_seq()) {
            (Some(last), Some(other_first)) => last > other_first,
            _ => false,
        }
    }

    fn first_seq(&self) -> Option<u64> {
        self.inner.calls.borrow().iter().map(Call::seq).min()
    }

    fn last_seq(&self) -> Option<u64> {
        self.inner.calls.borrow().iter().map(Call::seq).max()
    }

    /// Returns the `index`-th call (0-based).
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoCallsRecorded`] if the spy was never called, and
    /// [`Error::NoSuchCall`] if `index` is past the last call.
    pub fn get_call(&self, index: usize) -> Result<Call> {
        let calls = self.inner.calls.borrow();
        if calls.is_empty() {
            return Err(Error::NoCallsRecorded);
        }
        calls.get(index).cloned().ok_or(Error::NoSuchCall {
            index,
            count: calls.len(),
        })
    }

    /// Returns the first call.
    pub fn first_call(&self) -> Result<Call> {
        self.get_call(0)
    }

    /// Returns the last call.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoCallsRecorded`] if the spy was never called.
    pub fn most_recent_call(&self) -> Result<Call> {
        self.inner
            .calls
            .borrow()
            .last()
            .cloned()
            .ok_or(Error::NoCallsRecorded)
    }

    /// Returns all recorded calls in call order.
    pub fn calls(&self) -> Vec<Call> {
        self.inner.calls.borrow().clone()
    }

    /// Returns the argument list of every call in call order.
    pub fn all_args(&self) -> Vec<Vec<Value>> {
        self.inner
            .calls
            .borrow()
            .iter()
            .map(|c| c.args().to_vec())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store() -> Object {
        let object = Object::new();
        object.define("save", |args| Ok(json!({"saved": args.len()})));
        object
    }

    #[test]
    fn anonymous_spy_records_and_returns_null() {
        let spy = Spy::new("callback");
        assert!(!spy.called());

        let result = spy.call(&[json!("a")]).unwrap();
        assert_eq!(result, Value::Null);
        assert!(spy.called_once());
        assert!(spy.called_with(&[json!("a")]));
        assert_eq!(spy.name(), "callback");
    }

    #[test]
    fn call_count_tracks_the_call_list() {
        let spy = Spy::new("s");
        for i in 0..3 {
            spy.call(&[json!(i)]).unwrap();
            assert_eq!(spy.call_count(), spy.calls().len());
        }
        assert!(spy.called_thrice());
        assert!(!spy.called_twice());
        assert_eq!(spy.all_args(), vec![vec![json!(0)], vec![json!(1)], vec![json!(2)]]);
    }

    #[test]
    fn calls_keep_order_and_increasing_indexes() {
        let spy = Spy::new("s");
        spy.call(&[json!(1)]).unwrap();
        spy.call(&[json!(2)]).unwrap();
        let calls = spy.calls();
        assert!(calls[0].seq() < calls[1].seq());
        assert_eq!(calls[1].args(), &[json!(2)]);
    }

    #[test]
    fn empty_spy_has_no_calls_to_inspect() {
        let spy = Spy::new("s");
        assert_eq!(spy.get_call(0), Err(Error::NoCallsRecorded));
        assert_eq!(spy.most_recent_call(), Err(Error::NoCallsRecorded));
        assert_eq!(spy.first_call(), Err(Error::NoCallsRecorded));
    }

    #[test]
    fn out_of_range_call_index() {
        let spy = Spy::new("s");
        spy.call(&[]).unwrap();
        assert_eq!(
            spy.get_call(3),
            Err(Error::NoSuchCall { index: 3, count: 1 })
        );
        assert!(spy.get_call(0).is_ok());
    }

    #[test]
    fn most_recent_call_is_the_last_one() {
        let spy = Spy::new("s");
        spy.call(&[json!("first")]).unwrap();
        spy.call(&[json!("second")]).unwrap();
        let call = spy.most_recent_call().unwrap();
        assert_eq!(call.arg(0), Some(&json!("second")));
    }

    #[test]
    fn called_with_exactly_requires_the_same_count() {
        let spy = Spy::new("s");
        spy.call(&[json!(1), json!(2)]).unwrap();
        assert!(spy.called_with(&[json!(1)]));
        assert!(!spy.called_with_exactly(&[json!(1)]));
        assert!(spy.called_with_exactly(&[json!(1), json!(2)]));
    }

    #[test]
    fn always_called_with_checks_every_call() {
        let spy = Spy::new("s");
        assert!(!spy.always_called_with(&[]));
        spy.call(&[json!("x"), json!(1)]).unwrap();
        spy.call(&[json!("x"), json!(2)]).unwrap();
        assert!(spy.always_called_with(&[json!("x")]));
        assert!(!spy.always_called_with(&[json!("x"), json!(1)]));
    }

    #[test]
    fn ordering_between_spies() {
        let a = Spy::new("a");
        let b = Spy::new("b");
        a.call(&[]).unwrap();
        b.call(&[]).unwrap();

        assert!(a.called_before(&b));
        assert!(!b.called_before(&a));
        assert!(b.called_after(&a));
        assert!(!a.called_after(&b));
    }

    #[test]
    fn ordering_with_uncalled_spies() {
        let called = Spy::new("called");
        let idle = Spy::new("idle");
        called.call(&[]).unwrap();

        assert!(called.called_before(&idle));
        assert!(!idle.called_before(&called));
        assert!(!called.called_after(&idle));
        assert!(!idle.called_after(&called));
    }

    #[test]
    fn fixed_return_value() {
        let spy = Spy::new("s").returns(json!(42));
        assert_eq!(spy.call(&[]).unwrap(), json!(42));
        assert!(spy.returned(&json!(42.0)));
    }

    #[test]
    fn throwing_stub_records_the_throw() {
        let spy = Spy::new("s").throws("offline");
        assert_eq!(spy.call(&[]), Err(Error::Thrown(json!("offline"))));
        assert!(spy.threw());
        assert_eq!(
            spy.most_recent_call().unwrap().outcome(),
            &CallOutcome::Threw(json!("offline"))
        );
    }

    #[test]
    fn fake_implementation() {
        let spy = Spy::new("s").fake(|args| Ok(json!(args.len() * 10)));
        assert_eq!(spy.call(&[json!(1), json!(2)]).unwrap(), json!(20));
    }

    #[test]
    fn last_configuration_wins() {
        let spy = Spy::new("s").returns(1).throws("x").returns(2);
        assert_eq!(spy.call(&[]).unwrap(), json!(2));
        assert_eq!(spy.behavior().to_string(), "Return");
    }

    #[test]
    fn reset_clears_calls_but_keeps_behavior() {
        let spy = Spy::new("s").returns(7);
        spy.call(&[]).unwrap();
        spy.reset();
        assert!(!spy.called());
        assert_eq!(spy.call(&[]).unwrap(), json!(7));
    }

    #[test]
    fn wrapping_spy_records_calls_through_the_object() {
        let object = store();
        let spy = Spy::wrap(&object, "save").unwrap();

        let result = object.invoke("save", &[json!(1), json!(2)]).unwrap();
        assert_eq!(result, Value::Null);
        assert!(spy.called_with(&[json!(1), json!(2)]));
        assert_eq!(spy.call_count(), 1);
        assert_eq!(spy.wrapped_method(), Some("save"));
    }

    #[test]
    fn call_through_uses_the_original() {
        let object = store();
        let spy = Spy::wrap(&object, "save").unwrap().call_through();
        let result = object.invoke("save", &[json!(1), json!(2)]).unwrap();
        assert_eq!(result, json!({"saved": 2}));
        assert!(spy.returned(&json!({"saved": 2})));
    }

    #[test]
    fn call_through_on_anonymous_spy_returns_null() {
        let spy = Spy::new("s").call_through();
        assert_eq!(spy.call(&[json!(1)]).unwrap(), Value::Null);
    }

    #[test]
    fn restore_reinstates_the_original() {
        let object = store();
        let original = object.method("save").unwrap();
        let spy = Spy::wrap(&object, "save").unwrap();

        assert!(spy.restore());
        assert!(spy.is_restored());
        assert!(!object.is_wrapped("save"));
        assert!(Rc::ptr_eq(&object.method("save").unwrap(), &original));
        assert_eq!(
            object.invoke("save", &[json!(1)]).unwrap(),
            json!({"saved": 1})
        );
        // Calls after restoration are not recorded.
        assert_eq!(spy.call_count(), 0);
    }

    #[test]
    fn restore_is_idempotent() {
        let object = store();
        let spy = Spy::wrap(&object, "save").unwrap();
        assert!(spy.restore());
        assert!(!spy.restore());
        assert!(object.has_method("save"));
    }

    #[test]
    fn restore_on_anonymous_spy_is_a_noop() {
        assert!(!Spy::new("s").restore());
    }

    #[test]
    fn double_wrap_is_rejected_until_restored() {
        let object = store();
        let first = Spy::wrap(&object, "save").unwrap();
        assert_eq!(
            Spy::wrap(&object, "save").err(),
            Some(Error::DoubleWrap("save".into()))
        );

        first.restore();
        assert!(Spy::wrap(&object, "save").is_ok());
    }

    #[test]
    fn wrapping_a_missing_method_fails() {
        let object = Object::new();
        assert_eq!(
            Spy::wrap(&object, "load").err(),
            Some(Error::NoSuchMethod("load".into()))
        );
    }

    #[test]
    fn restore_after_object_dropped_is_a_noop() {
        let object = store();
        let spy = Spy::wrap(&object, "save").unwrap();
        drop(object);
        assert!(!spy.restore());
    }

    #[test]
    fn as_method_routes_to_the_spy() {
        let spy = Spy::new("on_done").returns("ok");
        let callback = spy.as_method();
        assert_eq!(callback(&[json!(1)]).unwrap(), json!("ok"));
        assert!(spy.called_once());
    }
}
