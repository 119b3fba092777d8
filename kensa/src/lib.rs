#![cfg_attr(docsrs, feature(doc_cfg))]
//! # Kensa
//!
//! A BDD-style test execution engine: suites, specs, hooks, spies and
//! asynchronous wait blocks, run on Tokio.
//!
//! Kensa runs behavior specs the way Jasmine does. You describe suites,
//! register specs and `before_each` / `after_each` hooks, spy on
//! collaborators, and assert with matchers. The runner walks the tree one
//! spec at a time, gives each spec a fresh [`Scope`], restores every spy
//! afterwards and reports results through pluggable [`Reporter`]s.
//!
//! ## Quick Start
//!
//! ```rust
//! use kensa::*;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let mut registry = Registry::new();
//! registry.describe("Counter", |s| {
//!     s.before_each(|cx| {
//!         cx.set("count", 0);
//!         Ok(())
//!     });
//!
//!     s.it("increments", |cx| {
//!         let next = cx.get("count").and_then(|v| v.as_i64()).unwrap_or(0) + 1;
//!         cx.set("count", next);
//!         cx.expect(cx.get("count")).to_equal(json!(1))?;
//!         Ok(())
//!     });
//!
//!     s.it("notifies listeners", |cx| {
//!         let bus = Object::new();
//!         bus.define("publish", |_| Ok(Value::Null));
//!         let publish = cx.spy_on(&bus, "publish")?;
//!
//!         bus.invoke("publish", &args!["changed", 1])?;
//!
//!         cx.expect_spy(&publish).was_called_with(&args!["changed"])?;
//!         Ok(())
//!     });
//! });
//!
//! let report = Runner::default().run(&registry).await;
//! assert_eq!(report.tally().passed, 2);
//! # }
//! ```
//!
//! ## Core Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Registry`] | Top-level suites of a run |
//! | [`Suite`] | Builder for specs, nested suites and hooks |
//! | [`Cx`] | Handle a body, hook or block uses to talk to the engine |
//! | [`Runner`] | Executes a registry, produces a [`RunReport`](report::RunReport) |
//! | [`Spy`] | Records calls and optionally stubs behavior |
//! | [`Object`] | Collaborator with named methods a spy can wrap |
//! | [`Mock`] | Up-front usage constraints on spies |
//! | [`Expectation`] | A subject waiting for a matcher |
//! | [`Scope`] | Per-spec shared state |
//! | [`Config`] | Wait timeouts, poll interval and spec filter |
//!
//! ## Execution Order
//!
//! For every spec, in registration order, depth-first:
//!
//! 1. `before_each` hooks, outermost suite first
//! 2. the body
//! 3. `after_each` hooks, innermost suite first
//!
//! `after_each` hooks always run, whether the spec passed, failed or errored.
//! A failing `before_each` stops the remaining befores and the body, but the
//! afters of every suite that was entered still run.
//!
//! ## Blocks and Waiting
//!
//! A synchronous body queues deferred work on [`Cx`]: `runs` for a closure,
//! `waits` for a pause and `waits_for` for a polled condition. Blocks run
//! in order after the body returns; blocks queued inside a block run before
//! the ones queued after it. Async bodies registered with
//! [`Suite::it_async`] await [`Cx::sleep`] and [`Cx::wait_for`] directly.
//!
//! ## Outcomes
//!
//! | Status | When |
//! |--------|------|
//! | `Passed` | every expectation passed |
//! | `Failed` | at least one expectation failed |
//! | `Errored` | a hook, body or block returned an error, panicked or timed out |
//! | `Skipped` | `xit`, `xdescribe`, filtered out, or cancelled before it started |
//!
//! ## Features
//!
//! - **`recorder`** - JSON Lines [`Recorder`](reporters::Recorder) reporter
//!
//! ## Note
//!
//! Engine types use `Rc` internally and are `!Send`. Run specs on a
//! current-thread runtime, which is what `#[tokio::test]` gives you.

mod config;
mod cx;
mod error;
mod object;
mod registry;
mod run_id;
mod runner;
mod scope;
mod status;
mod suite;
mod value;
mod wait_for;

mod internal;

pub mod matching;
pub mod report;
pub mod reporters;
pub mod reporting;
pub mod spying;

pub use config::Config;
pub use cx::Cx;
pub use error::{Error, fail};
pub use matching::{Expectation, ExpectationResult, Matcher, expect, expect_spy};
pub use object::{Method, Object};
pub use registry::Registry;
pub use reporting::Reporter;
pub use run_id::RunId;
pub use runner::Runner;
pub use scope::Scope;
pub use spying::{Behavior, Call, CallOutcome, Constraint, Mock, Spy};
pub use status::SpecStatus;
pub use suite::{Hook, Suite};
pub use value::{TypeClass, args_equal, contains, deep_equal, is_truthy};
pub use wait_for::WaitFor;

pub use serde_json::{self, Value, json};

/// Convenience alias for `Result<T, kensa::Error>`.
pub type Result<T = ()> = std::result::Result<T, Error>;

/// Create an anonymous spy. Same as [`Spy::new`].
pub fn create_spy(name: impl Into<String>) -> Spy {
    Spy::new(name)
}

/// Build a `Vec<Value>` argument list, each element converted with `json!`.
///
/// ```rust
/// use kensa::{args, json};
///
/// assert_eq!(args![1, "two", [3]], vec![json!(1), json!("two"), json!([3])]);
/// assert!(args![].is_empty());
/// ```
#[macro_export]
macro_rules! args {
    () => {
        ::std::vec::Vec::<$crate::Value>::new()
    };
    ($($arg:tt),+ $(,)?) => {
        ::std::vec![$($crate::json!($arg)),+]
    };
}
