use std::{fmt, future::Future, rc::Rc};

use futures_util::{FutureExt, future::LocalBoxFuture};

use crate::{Cx, Result};

/// A `before_each` or `after_each` hook.
pub type Hook = Rc<dyn Fn(&Cx) -> Result>;

#[derive(Clone)]
pub(crate) enum Body {
    Sync(Rc<dyn Fn(&Cx) -> Result>),
    Async(Rc<dyn Fn(Cx) -> LocalBoxFuture<'static, Result>>),
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Body::Sync(_) => write!(f, "Sync"),
            Body::Async(_) => write!(f, "Async"),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Spec {
    pub(crate) name: String,
    pub(crate) body: Body,
    pub(crate) skipped: bool,
}

#[derive(Debug, Clone)]
pub(crate) enum Node {
    Spec(Spec),
    Suite(Suite),
}

/// A named group of specs, nested suites and hooks.
///
/// Suites are built by the closure passed to
/// [`Registry::describe`](crate::Registry::describe) or [`Suite::describe`].
/// The closure runs immediately; spec bodies and hooks are only stored.
/// Children keep their registration order, which is the order they run in.
///
/// # Example
///
/// ```rust
/// use kensa::{Registry, json};
///
/// let mut registry = Registry::new();
/// registry.describe("Counter", |s| {
///     s.before_each(|cx| {
///         cx.set("count", 0);
///         Ok(())
///     });
///     s.it("starts at zero", |cx| {
///         cx.expect(cx.get("count")).to_equal(json!(0))?;
///         Ok(())
///     });
///     s.describe("when incremented", |s| {
///         s.it("is one", |cx| {
///             cx.set("count", 1);
///             cx.expect(cx.get("count")).to_equal(json!(1))?;
///             Ok(())
///         });
///     });
/// });
/// assert_eq!(registry.spec_count(), 2);
/// ```
#[derive(Clone)]
pub struct Suite {
    name: String,
    pub(crate) children: Vec<Node>,
    pub(crate) before: Vec<Hook>,
    pub(crate) after: Vec<Hook>,
    pub(crate) skipped: bool,
}

impl fmt::Debug for Suite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Suite")
            .field("name", &self.name)
            .field("children", &self.children)
            .field("before", &self.before.len())
            .field("after", &self.after.len())
            .field("skipped", &self.skipped)
            .finish()
    }
}

impl Suite {
    pub(crate) fn build<F>(name: impl Into<String>, skipped: bool, define: F) -> Self
    where
        F: FnOnce(&mut Suite),
    {
        let mut suite = Suite {
            name: name.into(),
            children: Vec::new(),
            before: Vec::new(),
            after: Vec::new(),
            skipped,
        };
        define(&mut suite);
        suite
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns true if the suite was registered with `xdescribe`.
    pub fn is_skipped(&self) -> bool {
        self.skipped
    }

    /// Register a nested suite.
    pub fn describe<F>(&mut self, name: impl Into<String>, define: F) -> &mut Self
    where
        F: FnOnce(&mut Suite),
    {
        let child = Suite::build(name, false, define);
        self.children.push(Node::Suite(child));
        self
    }

    /// Register a nested suite whose specs are all reported Skipped.
    pub fn xdescribe<F>(&mut self, name: impl Into<String>, define: F) -> &mut Self
    where
        F: FnOnce(&mut Suite),
    {
        let child = Suite::build(name, true, define);
        self.children.push(Node::Suite(child));
        self
    }

    /// Register a spec with a synchronous body.
    pub fn it<F>(&mut self, name: impl Into<String>, body: F) -> &mut Self
    where
        F: Fn(&Cx) -> Result + 'static,
    {
        self.push_spec(name, Body::Sync(Rc::new(body)), false)
    }

    /// Register a spec whose body is a future.
    ///
    /// The body receives an owned [`Cx`] so the future can hold it across
    /// `.await` points.
    pub fn it_async<F, Fut>(&mut self, name: impl Into<String>, body: F) -> &mut Self
    where
        F: Fn(Cx) -> Fut + 'static,
        Fut: Future<Output = Result> + 'static,
    {
        let body = Body::Async(Rc::new(move |cx| body(cx).boxed_local()));
        self.push_spec(name, body, false)
    }

    /// Register a spec that is reported Skipped without running.
    pub fn xit<F>(&mut self, name: impl Into<String>, body: F) -> &mut Self
    where
        F: Fn(&Cx) -> Result + 'static,
    {
        self.push_spec(name, Body::Sync(Rc::new(body)), true)
    }

    pub fn before_each<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(&Cx) -> Result + 'static,
    {
        self.before.push(Rc::new(hook));
        self
    }

    pub fn after_each<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(&Cx) -> Result + 'static,
    {
        self.after.push(Rc::new(hook));
        self
    }

    /// Number of specs in this suite and every nested suite.
    pub fn spec_count(&self) -> usize {
        self.children
            .iter()
            .map(|child| match child {
                Node::Spec(_) => 1,
                Node::Suite(suite) => suite.spec_count(),
            })
            .sum()
    }

    /// Names of the direct children in registration order.
    pub fn child_names(&self) -> Vec<&str> {
        self.children
            .iter()
            .map(|child| match child {
                Node::Spec(spec) => spec.name.as_str(),
                Node::Suite(suite) => suite.name(),
            })
            .collect()
    }

    fn push_spec(&mut self, name: impl Into<String>, body: Body, skipped: bool) -> &mut Self {
        self.children.push(Node::Spec(Spec {
            name: name.into(),
            body,
            skipped,
        }));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn children_keep_registration_order() {
        let suite = Suite::build("root", false, |s| {
            s.it("a", |_| Ok(()));
            s.describe("nested", |s| {
                s.it("b", |_| Ok(()));
                s.xit("c", |_| Ok(()));
            });
            s.it_async("d", |_cx| async { Ok(()) });
        });

        assert_eq!(suite.child_names(), vec!["a", "nested", "d"]);
        assert_eq!(suite.spec_count(), 4);
    }

    #[test]
    fn hooks_are_stored_not_run() {
        let suite = Suite::build("root", false, |s| {
            s.before_each(|_| panic!("must not run at registration"));
            s.after_each(|_| Ok(()));
            s.after_each(|_| Ok(()));
        });
        assert_eq!(suite.before.len(), 1);
        assert_eq!(suite.after.len(), 2);
    }

    #[test]
    fn xdescribe_marks_the_nested_suite() {
        let suite = Suite::build("root", false, |s| {
            s.xdescribe("off", |s| {
                s.it("x", |_| Ok(()));
            });
        });
        let Node::Suite(nested) = &suite.children[0] else {
            panic!("expected a suite");
        };
        assert!(nested.is_skipped());
        assert!(!suite.is_skipped());
    }
}
