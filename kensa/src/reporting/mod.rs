//! Observing a run as it happens.
//!
//! Implement [`Reporter`] and register it with
//! [`Runner::add_reporter`](crate::Runner::add_reporter). All callbacks have
//! default no-op implementations, so you only override the ones you care
//! about. Ready-made reporters live in [`reporters`](crate::reporters).
//!
//! # Callback order
//!
//! For every run:
//! 1. `on_run_start` once
//! 2. `on_suite_start` for each suite, depth-first
//! 3. per spec: `on_spec_start`, then `on_expectation` for each recorded
//!    result in order, then `on_spec_done`
//! 4. `on_suite_done` after the suite's last child
//! 5. `on_run_done` once, with the full report
//!
//! Skipped specs get `on_spec_done` only.
//!
//! A reporter that panics is removed for the rest of the run and the panic
//! is logged; the run itself is unaffected.

mod reporter;

pub use reporter::Reporter;
