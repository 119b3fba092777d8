use std::time::Duration;

/// Runner configuration.
///
/// Controls the default timeouts and polling cadence of wait blocks, and
/// which specs a run selects. Use the builder methods to customize, or use
/// [`Default`] for sensible defaults.
///
/// # Examples
///
/// ```rust
/// use std::time::Duration;
/// use kensa::Config;
///
/// let config = Config::default()
///     .with_default_wait_timeout(Duration::from_secs(1)) // waits_for without an explicit timeout
///     .with_poll_interval(Duration::from_millis(5))      // how often predicates are re-checked
///     .with_filter("TodoList");                          // only specs whose full name matches
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Config {
    /// Timeout applied to `waits_for` when the caller gives none.
    /// Default: 5s
    default_wait_timeout: Duration,

    /// How often a `waits_for` predicate is re-evaluated.
    /// Default: 10ms
    poll_interval: Duration,

    /// Upper bound for an async spec body.
    /// Default: 30s
    spec_timeout: Duration,

    /// Substring a spec's full name must contain to run.
    /// Default: none (every spec runs)
    filter: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            default_wait_timeout: Duration::from_secs(5),
            poll_interval: Duration::from_millis(10),
            spec_timeout: Duration::from_secs(30),
            filter: None,
        }
    }
}

impl Config {
    /// Set the timeout used by `waits_for` blocks that don't specify one.
    pub fn with_default_wait_timeout(mut self, timeout: Duration) -> Self {
        self.default_wait_timeout = timeout;
        self
    }

    /// Returns the default `waits_for` timeout.
    pub fn default_wait_timeout(&self) -> Duration {
        self.default_wait_timeout
    }

    /// Set the polling interval for `waits_for` predicates.
    ///
    /// Trade-offs:
    /// - Lower values (1-5ms): faster reaction once the condition holds, more wakeups
    /// - Higher values (50ms+): cheaper, but every wait overshoots by up to one interval
    ///
    /// A zero interval is clamped to 1ms so a predicate never spins.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval.max(Duration::from_millis(1));
        self
    }

    /// Returns the polling interval for `waits_for` predicates.
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Set the upper bound for an async spec body.
    pub fn with_spec_timeout(mut self, timeout: Duration) -> Self {
        self.spec_timeout = timeout;
        self
    }

    /// Returns the upper bound for an async spec body.
    pub fn spec_timeout(&self) -> Duration {
        self.spec_timeout
    }

    /// Only run specs whose full name contains `filter`.
    ///
    /// Specs that don't match are reported as skipped.
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Returns the active spec filter.
    pub fn filter(&self) -> Option<&str> {
        self.filter.as_deref()
    }

    pub(crate) fn selects(&self, full_name: &str) -> bool {
        self.filter
            .as_deref()
            .is_none_or(|filter| full_name.contains(filter))
    }
}
