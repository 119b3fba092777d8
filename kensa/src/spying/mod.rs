//! Spies, stubs and mocks.
//!
//! - [`Spy`] records every call and optionally replaces behavior (a stub)
//! - [`Object`](crate::Object) holds the method slots a spy can wrap
//! - [`Mock`] declares expected usage of spies and verifies it afterwards

mod behavior;
mod call;
mod mock;
mod spy;

pub use behavior::Behavior;
pub use call::{Call, CallOutcome};
pub use mock::{Constraint, Mock};
pub use spy::Spy;
