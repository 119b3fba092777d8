use std::{fmt, future::IntoFuture, marker::PhantomData, pin::Pin, rc::Rc, time::Duration};

use crate::{Result, cx::SpecState, internal::poll_until};

/// An awaitable poll built by [`Cx::wait_for`](crate::Cx::wait_for).
///
/// Checks the predicate every [`Config::poll_interval`](crate::Config::poll_interval)
/// until it holds. If the timeout (by default
/// [`Config::default_wait_timeout`](crate::Config::default_wait_timeout))
/// elapses first, resolves to [`Error::Timeout`](crate::Error::Timeout).
///
/// # Example
///
/// ```ignore
/// cx.wait_for(|| done.get())
///     .message("the request to finish")
///     .within(Duration::from_millis(200))
///     .await?;
/// ```
pub struct WaitFor<'a, F> {
    state: Rc<SpecState>,
    predicate: F,
    message: Option<String>,
    timeout: Option<Duration>,
    _borrow: PhantomData<&'a ()>,
}

impl<'a, F> WaitFor<'a, F>
where
    F: FnMut() -> bool + 'a,
{
    pub(crate) fn new(state: Rc<SpecState>, predicate: F) -> Self {
        Self {
            state,
            predicate,
            message: None,
            timeout: None,
            _borrow: PhantomData,
        }
    }

    /// Describe what is awaited, used in the timeout error.
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Override the default timeout.
    pub fn within(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    async fn run(self) -> Result {
        let config = self.state.config();
        poll_until(
            self.predicate,
            self.message.as_deref(),
            self.timeout.unwrap_or(config.default_wait_timeout()),
            config.poll_interval(),
            self.state.cancel_token(),
        )
        .await
    }
}

impl<'a, F> IntoFuture for WaitFor<'a, F>
where
    F: FnMut() -> bool + 'a,
{
    type Output = Result;
    type IntoFuture = Pin<Box<dyn std::future::Future<Output = Self::Output> + 'a>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.run())
    }
}

impl<F> fmt::Debug for WaitFor<'_, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WaitFor")
            .field("message", &self.message)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
