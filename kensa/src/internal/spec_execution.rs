use std::{
    panic::{AssertUnwindSafe, catch_unwind},
    rc::Rc,
};

use futures_util::FutureExt;

use crate::{
    Cx, Error, ExpectationResult, Hook, Result, SpecStatus, Suite,
    cx::{ActiveSpec, SpecState},
    internal::{Block, panic_message, poll_until},
    suite::Body,
};

/// What a finished spec hands back to the runner.
#[derive(Debug)]
pub(crate) struct SpecOutcome {
    pub(crate) status: SpecStatus,
    pub(crate) error: Option<Error>,
    pub(crate) expectations: Vec<ExpectationResult>,
    /// Depth of the suite whose `before` hook failed, if one did.
    pub(crate) failed_level: Option<usize>,
}

/// Drives one spec through its hooks, body and block queue.
///
/// `levels` holds the enclosing suites from outermost to innermost.
pub(crate) struct SpecExecution<'a> {
    state: Rc<SpecState>,
    cx: Cx,
    levels: &'a [&'a Suite],
    body: &'a Body,
}

impl<'a> SpecExecution<'a> {
    pub(crate) fn new(state: Rc<SpecState>, levels: &'a [&'a Suite], body: &'a Body) -> Self {
        let cx = Cx::new(state.clone());
        Self {
            state,
            cx,
            levels,
            body,
        }
    }

    pub(crate) async fn run(self) -> SpecOutcome {
        let _active = ActiveSpec::enter(self.state.clone());
        let mut error = None;
        let mut failed_level = None;
        let mut entered = 0;

        for (depth, suite) in self.levels.iter().enumerate() {
            entered += 1;
            if let Err(e) = self.run_hooks(suite.before.iter()).await {
                tracing::warn!(
                    spec = %self.cx.spec_name(),
                    suite = %suite.name(),
                    error = %e,
                    "before hook failed"
                );
                error = Some(e);
                failed_level = Some(depth);
                break;
            }
        }

        if error.is_none() {
            error = self.run_body().await.err();
        }

        // Afters run for every entered level, even after a failure.
        for suite in self.levels[..entered].iter().rev() {
            if let Err(e) = self.run_hooks(suite.after.iter().rev()).await {
                tracing::warn!(
                    spec = %self.cx.spec_name(),
                    suite = %suite.name(),
                    error = %e,
                    "after hook failed"
                );
                error = error.or(Some(e));
            }
        }

        let restored = self.state.restore_spies();
        if restored > 0 {
            tracing::trace!(spec = %self.cx.spec_name(), restored, "spies restored");
        }

        if error.is_none() && self.state.cancel_token().is_cancelled() {
            error = Some(Error::Cancelled);
        }

        let expectations = self.state.take_results();
        let status = if error.is_some() {
            SpecStatus::Errored
        } else if expectations.iter().any(|r| !r.passed()) {
            SpecStatus::Failed
        } else {
            SpecStatus::Passed
        };

        SpecOutcome {
            status,
            error,
            expectations,
            failed_level,
        }
    }

    async fn run_hooks<'h, I>(&self, hooks: I) -> Result
    where
        I: Iterator<Item = &'h Hook>,
    {
        for hook in hooks {
            self.guarded(|cx| hook(cx))?;
            self.drain().await?;
        }
        Ok(())
    }

    async fn run_body(&self) -> Result {
        match self.body {
            Body::Sync(body) => self.guarded(|cx| body(cx))?,
            Body::Async(body) => {
                let timeout = self.state.config().spec_timeout();
                let future = AssertUnwindSafe(body(self.cx.clone())).catch_unwind();
                tokio::select! {
                    biased;
                    _ = self.state.cancel_token().cancelled() => return self.abort(Error::Cancelled),
                    outcome = tokio::time::timeout(timeout, future) => match outcome {
                        Err(_) => return self.abort(Error::SpecTimeout(timeout)),
                        Ok(Err(payload)) => return self.abort(Error::Panicked(panic_message(payload))),
                        Ok(Ok(result)) => {
                            if let Err(e) = result {
                                return self.abort(e);
                            }
                        }
                    },
                }
            }
        }
        self.drain().await
    }

    fn guarded<F>(&self, f: F) -> Result
    where
        F: FnOnce(&Cx) -> Result,
    {
        let result = match catch_unwind(AssertUnwindSafe(|| f(&self.cx))) {
            Ok(result) => result,
            Err(payload) => Err(Error::Panicked(panic_message(payload))),
        };
        result.or_else(|e| self.abort(e))
    }

    /// Drop pending blocks and pass the error on.
    fn abort(&self, error: Error) -> Result {
        let dropped = self.state.blocks.borrow_mut().clear();
        if dropped > 0 {
            tracing::trace!(spec = %self.cx.spec_name(), dropped, "pending blocks dropped");
        }
        Err(error)
    }

    /// Run queued blocks until the queue is empty.
    ///
    /// Blocks queued while a block runs go ahead of the blocks that were
    /// already waiting.
    async fn drain(&self) -> Result {
        loop {
            let (block, rest) = {
                let mut queue = self.state.blocks.borrow_mut();
                let Some(block) = queue.pop_front() else {
                    return Ok(());
                };
                (block, queue.take_rest())
            };

            let outcome = self.run_block(block).await;
            self.state.blocks.borrow_mut().extend(rest);
            outcome.or_else(|e| self.abort(e))?;
        }
    }

    async fn run_block(&self, block: Block) -> Result {
        let config = self.state.config();
        let cancel = self.state.cancel_token();
        match block {
            Block::Runs(f) => match catch_unwind(AssertUnwindSafe(|| f(&self.cx))) {
                Ok(result) => result,
                Err(payload) => Err(Error::Panicked(panic_message(payload))),
            },
            Block::Waits(duration) => {
                tokio::select! {
                    _ = cancel.cancelled() => Err(Error::Cancelled),
                    _ = tokio::time::sleep(duration) => Ok(()),
                }
            }
            Block::WaitsFor {
                predicate,
                message,
                timeout,
            } => {
                poll_until(
                    predicate,
                    message.as_deref(),
                    timeout.unwrap_or(config.default_wait_timeout()),
                    config.poll_interval(),
                    cancel,
                )
                .await
            }
        }
    }
}
