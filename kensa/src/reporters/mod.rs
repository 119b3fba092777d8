//! Ready-to-use reporter implementations.
//!
//! - [`Tracer`] - Logs the run via the `tracing` crate
//! - [`Summary`] - Writes a human-readable summary with itemized failures
//! - [`Recorder`] - Records spec reports to a JSON Lines file (requires `recorder` feature)
//!
//! # Example
//!
//! ```ignore
//! use kensa::reporters::{Summary, Tracer};
//!
//! runner.add_reporter(Tracer).add_reporter(Summary::stdout());
//! ```

mod summary;
mod tracer;

pub use summary::Summary;
pub use tracer::Tracer;

#[cfg(feature = "recorder")]
mod recorder;

#[cfg(feature = "recorder")]
#[cfg_attr(docsrs, doc(cfg(feature = "recorder")))]
pub use recorder::Recorder;
