use std::{
    any::Any,
    panic::{AssertUnwindSafe, catch_unwind},
    time::Duration,
};

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::{Error, Result};

const DEFAULT_WAIT_MESSAGE: &str = "something to happen";

/// Poll `predicate` until it holds, `timeout` elapses or `cancel` fires.
///
/// The predicate is checked before the first sleep, so an already-true
/// condition returns without suspending. A panicking predicate ends the wait
/// with [`Error::Panicked`].
pub(crate) async fn poll_until<F>(
    mut predicate: F,
    message: Option<&str>,
    timeout: Duration,
    interval: Duration,
    cancel: &CancellationToken,
) -> Result
where
    F: FnMut() -> bool,
{
    let started = Instant::now();
    let deadline = started + timeout;
    let mut polls = 0u32;

    loop {
        polls += 1;
        match catch_unwind(AssertUnwindSafe(&mut predicate)) {
            Ok(true) => {
                tracing::trace!(polls, elapsed = ?started.elapsed(), "wait condition met");
                return Ok(());
            }
            Ok(false) => {}
            Err(payload) => return Err(Error::Panicked(panic_message(payload))),
        }

        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            let elapsed = started.elapsed();
            tracing::trace!(polls, ?elapsed, "wait condition timed out");
            return Err(Error::Timeout {
                message: message.unwrap_or(DEFAULT_WAIT_MESSAGE).to_string(),
                elapsed,
            });
        }

        tokio::select! {
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            _ = tokio::time::sleep(interval.min(remaining)) => {}
        }
    }
}

/// Extract the text of a panic payload.
pub(crate) fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
