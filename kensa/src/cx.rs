use std::{
    cell::{Cell, RefCell, RefMut},
    fmt,
    rc::Rc,
    time::Duration,
};

use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::{
    Config, Error, Expectation, ExpectationResult, Object, Result, Scope, Spy, WaitFor,
    internal::{Block, BlockQueue},
    matching::{Sink, Subject},
};

/// Everything one spec execution owns: scope, recorded results, queued
/// blocks and the spies to restore at teardown.
pub(crate) struct SpecState {
    full_name: String,
    config: Rc<Config>,
    cancel: CancellationToken,
    scope: RefCell<Scope>,
    results: RefCell<Vec<ExpectationResult>>,
    pub(crate) blocks: RefCell<BlockQueue>,
    spies: RefCell<Vec<Spy>>,
    active: Cell<bool>,
}

impl SpecState {
    pub(crate) fn new(full_name: String, config: Rc<Config>, cancel: CancellationToken) -> Self {
        Self {
            full_name,
            config,
            cancel,
            scope: RefCell::new(Scope::default()),
            results: RefCell::new(Vec::new()),
            blocks: RefCell::new(BlockQueue::default()),
            spies: RefCell::new(Vec::new()),
            active: Cell::new(false),
        }
    }

    pub(crate) fn is_active(&self) -> bool {
        self.active.get()
    }

    pub(crate) fn record(&self, result: ExpectationResult) {
        if !result.passed() {
            tracing::debug!(
                spec = %self.full_name,
                message = %result.message(),
                "expectation failed"
            );
        }
        self.results.borrow_mut().push(result);
    }

    pub(crate) fn take_results(&self) -> Vec<ExpectationResult> {
        std::mem::take(&mut *self.results.borrow_mut())
    }

    pub(crate) fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub(crate) fn config(&self) -> &Config {
        &self.config
    }

    pub(crate) fn track_spy(&self, spy: Spy) {
        self.spies.borrow_mut().push(spy);
    }

    /// Restore every spy installed during the spec, newest first.
    pub(crate) fn restore_spies(&self) -> usize {
        let spies = std::mem::take(&mut *self.spies.borrow_mut());
        spies.iter().rev().filter(|spy| spy.restore()).count()
    }
}

thread_local! {
    static CURRENT: RefCell<Option<Rc<SpecState>>> = const { RefCell::new(None) };
}

/// Marks a spec as the running one on this thread until dropped.
pub(crate) struct ActiveSpec {
    state: Rc<SpecState>,
    previous: Option<Rc<SpecState>>,
}

impl ActiveSpec {
    pub(crate) fn enter(state: Rc<SpecState>) -> Self {
        state.active.set(true);
        let previous = CURRENT.with(|current| current.replace(Some(state.clone())));
        Self { state, previous }
    }
}

impl Drop for ActiveSpec {
    fn drop(&mut self) {
        self.state.active.set(false);
        let previous = self.previous.take();
        CURRENT.with(|current| *current.borrow_mut() = previous);
    }
}

/// The spec running on this thread.
///
/// # Errors
///
/// Returns [`Error::NoActiveSpec`] outside of a running spec.
pub(crate) fn current() -> Result<Rc<SpecState>> {
    CURRENT
        .with(|current| current.borrow().clone())
        .filter(|state| state.is_active())
        .ok_or(Error::NoActiveSpec)
}

/// The handle a spec body, hook or block uses to talk to the engine.
///
/// Use it to:
/// - `scope()`: read and write the per-spec [`Scope`]
/// - `expect(value)` / `expect_spy(&spy)`: record expectations
/// - `spy_on(&object, method)`: wrap a method, restored automatically at teardown
/// - `runs`, `waits`, `waits_for`: queue blocks that run after the current one
/// - `sleep`, `wait_for`: suspend an async body directly
///
/// `Cx` is cheap to clone. Clones outlive the spec harmlessly: once the spec
/// finishes, expectations made through them fail with [`Error::NoActiveSpec`].
#[derive(Clone)]
pub struct Cx {
    pub(crate) state: Rc<SpecState>,
}

impl fmt::Debug for Cx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cx")
            .field("spec", &self.state.full_name)
            .field("active", &self.state.is_active())
            .finish_non_exhaustive()
    }
}

impl Cx {
    pub(crate) fn new(state: Rc<SpecState>) -> Self {
        Self { state }
    }

    /// Returns the spec's full name: every enclosing suite name, then the spec name.
    pub fn spec_name(&self) -> &str {
        &self.state.full_name
    }

    pub fn config(&self) -> &Config {
        self.state.config()
    }

    // ==================== Scope ====================

    /// Mutable access to the spec's scope.
    ///
    /// Don't hold the guard across an `.await`; a block or another handle
    /// touching the scope meanwhile would panic.
    pub fn scope(&self) -> RefMut<'_, Scope> {
        self.state.scope.borrow_mut()
    }

    /// Shorthand for `cx.scope().get(key).cloned()`.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.state.scope.borrow().get(key).cloned()
    }

    /// Shorthand for `cx.scope().set(key, value)`.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.state.scope.borrow_mut().set(key, value)
    }

    // ==================== Expectations ====================

    pub fn expect(&self, actual: impl Into<Value>) -> Expectation {
        Expectation::new(
            Subject::Value(actual.into()),
            Sink::Spec(self.state.clone()),
        )
    }

    pub fn expect_spy(&self, spy: &Spy) -> Expectation {
        Expectation::new(Subject::Spy(spy.clone()), Sink::Spec(self.state.clone()))
    }

    // ==================== Spies ====================

    /// Create an anonymous spy.
    pub fn create_spy(&self, name: impl Into<String>) -> Spy {
        Spy::new(name)
    }

    /// Wrap `object`'s `method` for the rest of this spec.
    ///
    /// The spy is restored after the spec's `after` hooks, whatever the
    /// outcome, so the next spec always sees the original method.
    ///
    /// # Errors
    ///
    /// See [`Spy::wrap`].
    pub fn spy_on(&self, object: &Object, method: &str) -> Result<Spy> {
        Spy::wrap(object, method)
    }

    // ==================== Blocks ====================

    /// Queue a block that runs once everything queued before it is done.
    pub fn runs<F>(&self, block: F)
    where
        F: FnOnce(&Cx) -> Result + 'static,
    {
        self.state
            .blocks
            .borrow_mut()
            .push(Block::Runs(Box::new(block)));
    }

    /// Queue a pause of at least `duration`.
    pub fn waits(&self, duration: Duration) {
        self.state.blocks.borrow_mut().push(Block::Waits(duration));
    }

    /// Queue a wait until `predicate` returns true, using the default timeout.
    ///
    /// If the timeout elapses first the spec ends as Errored with
    /// [`Error::Timeout`] and the remaining blocks are dropped.
    pub fn waits_for<F>(&self, predicate: F)
    where
        F: FnMut() -> bool + 'static,
    {
        self.state.blocks.borrow_mut().push(Block::WaitsFor {
            predicate: Box::new(predicate),
            message: None,
            timeout: None,
        });
    }

    /// Like [`waits_for`](Self::waits_for) with a message for the timeout error
    /// and an explicit timeout.
    pub fn waits_for_within<F>(&self, predicate: F, message: impl Into<String>, timeout: Duration)
    where
        F: FnMut() -> bool + 'static,
    {
        self.state.blocks.borrow_mut().push(Block::WaitsFor {
            predicate: Box::new(predicate),
            message: Some(message.into()),
            timeout: Some(timeout),
        });
    }

    // ==================== Async ====================

    /// Suspend an async body for `duration`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cancelled`] if the run is cancelled meanwhile.
    pub async fn sleep(&self, duration: Duration) -> Result {
        tokio::select! {
            _ = self.state.cancel_token().cancelled() => Err(Error::Cancelled),
            _ = tokio::time::sleep(duration) => Ok(()),
        }
    }

    /// Build an awaitable poll of `predicate`.
    ///
    /// # Example
    ///
    /// ```ignore
    /// cx.wait_for(|| list.borrow().len() == 3)
    ///     .message("three items to render")
    ///     .within(Duration::from_millis(500))
    ///     .await?;
    /// ```
    pub fn wait_for<'a, F>(&self, predicate: F) -> WaitFor<'a, F>
    where
        F: FnMut() -> bool + 'a,
    {
        WaitFor::new(self.state.clone(), predicate)
    }

    /// Returns true once the run has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.state.cancel_token().is_cancelled()
    }
}

#[cfg(test)]
pub(crate) fn test_state() -> (Rc<SpecState>, ActiveSpec) {
    let state = Rc::new(SpecState::new(
        "test spec".to_string(),
        Rc::new(Config::default()),
        CancellationToken::new(),
    ));
    let guard = ActiveSpec::enter(state.clone());
    (state, guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn current_is_set_only_while_active() {
        assert_eq!(current().err(), Some(Error::NoActiveSpec));
        {
            let (state, _guard) = test_state();
            let found = current().unwrap();
            assert!(Rc::ptr_eq(&found, &state));
        }
        assert_eq!(current().err(), Some(Error::NoActiveSpec));
    }

    #[test]
    fn nested_activation_restores_the_outer_spec() {
        let (outer, _outer_guard) = test_state();
        {
            let (_inner, _inner_guard) = test_state();
            assert!(!Rc::ptr_eq(&current().unwrap(), &outer));
        }
        assert!(Rc::ptr_eq(&current().unwrap(), &outer));
    }

    #[test]
    fn scope_shorthands() {
        let (state, _guard) = test_state();
        let cx = Cx::new(state);
        cx.set("count", 1);
        assert_eq!(cx.get("count"), Some(json!(1)));
        cx.scope().set("count", 2);
        assert_eq!(cx.get("count"), Some(json!(2)));
    }

    #[test]
    fn spies_from_spy_on_are_restored_at_teardown() {
        let (state, _guard) = test_state();
        let cx = Cx::new(state.clone());
        let object = Object::new();
        object.define("load", |_| Ok(json!("real")));

        let spy = cx.spy_on(&object, "load").unwrap().returns("fake");
        assert_eq!(object.invoke("load", &[]).unwrap(), json!("fake"));

        assert_eq!(state.restore_spies(), 1);
        assert!(spy.is_restored());
        assert_eq!(object.invoke("load", &[]).unwrap(), json!("real"));
        assert_eq!(state.restore_spies(), 0);
    }

    #[test]
    fn spies_wrapped_directly_are_tracked_by_the_running_spec() {
        let object = Object::new();
        object.define("load", |_| Ok(json!("real")));

        let outside = Spy::wrap(&object, "load").unwrap();
        assert!(outside.restore());

        let (state, _guard) = test_state();
        let inside = Spy::wrap(&object, "load").unwrap().returns("fake");
        assert_eq!(state.restore_spies(), 1);
        assert!(inside.is_restored());
        assert_eq!(object.invoke("load", &[]).unwrap(), json!("real"));
    }

    #[test]
    fn expectations_after_the_spec_ends_are_rejected() {
        let cx = {
            let (state, _guard) = test_state();
            Cx::new(state)
        };
        assert_eq!(cx.expect(1).to_equal(1), Err(Error::NoActiveSpec));
    }
}
