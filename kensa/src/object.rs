use std::{
    cell::RefCell,
    collections::BTreeMap,
    fmt,
    rc::{Rc, Weak},
};

use serde_json::Value;

use crate::{Error, Result};

/// A callable stored in an [`Object`] method slot.
pub type Method = Rc<dyn Fn(&[Value]) -> Result<Value>>;

struct Slot {
    method: Method,
    wrapped: bool,
}

type Slots = RefCell<BTreeMap<String, Slot>>;

/// A collaborator with named, replaceable methods.
///
/// `Object` is the owner half of a spy's owner + key target: application code
/// calls through [`invoke`](Self::invoke), and [`Spy::wrap`](crate::Spy::wrap)
/// swaps a slot for a recording wrapper until it is restored. Swapping a slot
/// is the only mutation the engine performs on anything it doesn't own.
///
/// Cloning an `Object` yields another handle to the same slots.
///
/// # Example
///
/// ```rust
/// use kensa::{Object, json};
///
/// let store = Object::new();
/// store.define("save", |args| Ok(json!({"saved": args.len()})));
///
/// let reply = store.invoke("save", &[json!("milk")]).unwrap();
/// assert_eq!(reply, json!({"saved": 1}));
/// ```
#[derive(Clone, Default)]
pub struct Object {
    slots: Rc<Slots>,
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slots = self.slots.borrow();
        f.debug_struct("Object")
            .field("methods", &slots.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Object {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define (or redefine) a method.
    ///
    /// Redefining a slot that a spy currently wraps replaces the wrapper; the
    /// spy's later [`restore`](crate::Spy::restore) puts its saved original back.
    pub fn define<F>(&self, name: &str, method: F) -> &Self
    where
        F: Fn(&[Value]) -> Result<Value> + 'static,
    {
        self.slots.borrow_mut().insert(
            name.to_string(),
            Slot {
                method: Rc::new(method),
                wrapped: false,
            },
        );
        self
    }

    /// Call a method by name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoSuchMethod`] if nothing is defined under `name`,
    /// and whatever the method itself returns.
    pub fn invoke(&self, name: &str, args: &[Value]) -> Result<Value> {
        // Release the borrow before calling, the method may touch this object again.
        let method = self
            .method(name)
            .ok_or_else(|| Error::NoSuchMethod(name.to_string()))?;
        method(args)
    }

    /// Returns the callable currently installed under `name`.
    pub fn method(&self, name: &str) -> Option<Method> {
        self.slots.borrow().get(name).map(|slot| slot.method.clone())
    }

    pub fn has_method(&self, name: &str) -> bool {
        self.slots.borrow().contains_key(name)
    }

    /// Returns true while a spy wraps the method.
    pub fn is_wrapped(&self, name: &str) -> bool {
        self.slots
            .borrow()
            .get(name)
            .is_some_and(|slot| slot.wrapped)
    }

    /// Returns the method names in sorted order.
    pub fn method_names(&self) -> Vec<String> {
        self.slots.borrow().keys().cloned().collect()
    }

    /// Swap a slot for `wrapper` and hand back the original.
    pub(crate) fn install_wrapper(&self, name: &str, wrapper: Method) -> Result<Method> {
        let mut slots = self.slots.borrow_mut();
        let slot = slots
            .get_mut(name)
            .ok_or_else(|| Error::NoSuchMethod(name.to_string()))?;
        if slot.wrapped {
            return Err(Error::DoubleWrap(name.to_string()));
        }
        let original = std::mem::replace(&mut slot.method, wrapper);
        slot.wrapped = true;
        Ok(original)
    }

    pub(crate) fn reinstate(&self, name: &str, original: Method) {
        self.slots.borrow_mut().insert(
            name.to_string(),
            Slot {
                method: original,
                wrapped: false,
            },
        );
    }

    pub(crate) fn downgrade(&self) -> WeakObject {
        WeakObject(Rc::downgrade(&self.slots))
    }
}

/// Non-owning handle held by a wrapping spy, so the wrapper installed in a slot
/// and the spy don't keep each other alive.
#[derive(Clone)]
pub(crate) struct WeakObject(Weak<Slots>);

impl WeakObject {
    pub(crate) fn upgrade(&self) -> Option<Object> {
        self.0.upgrade().map(|slots| Object { slots })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn counter() -> Object {
        let object = Object::new();
        object.define("add", |args| {
            let sum: i64 = args.iter().filter_map(Value::as_i64).sum();
            Ok(json!(sum))
        });
        object
    }

    #[test]
    fn invokes_defined_methods() {
        let object = counter();
        assert_eq!(object.invoke("add", &[json!(1), json!(2)]).unwrap(), json!(3));
        assert!(object.has_method("add"));
        assert_eq!(object.method_names(), vec!["add".to_string()]);
    }

    #[test]
    fn missing_method_is_an_error() {
        let object = Object::new();
        assert_eq!(
            object.invoke("nope", &[]),
            Err(Error::NoSuchMethod("nope".into()))
        );
    }

    #[test]
    fn wrapping_twice_is_rejected() {
        let object = counter();
        let wrapper: Method = Rc::new(|_| Ok(Value::Null));
        let original = object.install_wrapper("add", wrapper.clone()).unwrap();
        assert!(object.is_wrapped("add"));
        assert_eq!(
            object.install_wrapper("add", wrapper).err(),
            Some(Error::DoubleWrap("add".into()))
        );

        object.reinstate("add", original.clone());
        assert!(!object.is_wrapped("add"));
        let current = object.method("add").unwrap();
        assert!(Rc::ptr_eq(&current, &original));
    }

    #[test]
    fn methods_may_call_back_into_their_object() {
        let object = counter();
        let inner = object.clone();
        object.define("double_add", move |args| {
            let once = inner.invoke("add", args)?;
            inner.invoke("add", &[once.clone(), once])
        });
        assert_eq!(
            object.invoke("double_add", &[json!(2), json!(3)]).unwrap(),
            json!(10)
        );
    }

    #[test]
    fn weak_handle_does_not_keep_the_object_alive() {
        let object = counter();
        let weak = object.downgrade();
        assert!(weak.upgrade().is_some());
        drop(object);
        assert!(weak.upgrade().is_none());
    }
}
