//! Builder pattern for OrderedPool

use std::num::NonZeroUsize;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::ordered_pool::OrderedPool;
use crate::config::{PanicPolicy, PoolOptions};
use crate::error::PoolResult;

/// Builder for OrderedPool
#[derive(Debug, Default)]
pub struct OrderedPoolBuilder {
    options: PoolOptions,
    token: Option<CancellationToken>,
    lenient: bool,
}

impl OrderedPoolBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing set of options
    pub fn with_options(mut self, options: PoolOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.options.workers = workers;
        self
    }

    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.options.max_in_flight = Some(max_in_flight);
        self
    }

    /// Stop after `successes` successful results; 0 disables early stop
    pub fn with_early_stop(mut self, successes: usize) -> Self {
        self.options.early_stop_after = NonZeroUsize::new(successes);
        self
    }

    pub fn with_panic_policy(mut self, policy: PanicPolicy) -> Self {
        self.options.panic_policy = policy;
        self
    }

    /// Shorthand for `PanicPolicy::Capture` (true) or `Propagate` (false)
    pub fn with_panic_as_error(self, enabled: bool) -> Self {
        self.with_panic_policy(if enabled {
            PanicPolicy::Capture
        } else {
            PanicPolicy::Propagate
        })
    }

    pub fn with_task_timeout(mut self, timeout: Duration) -> Self {
        self.options.task_timeout = Some(timeout);
        self
    }

    pub fn with_cancellation_token(mut self, token: CancellationToken) -> Self {
        self.token = Some(token);
        self
    }

    /// Clamp invalid values instead of failing in [`build`](Self::build)
    pub fn lenient(mut self, enabled: bool) -> Self {
        self.lenient = enabled;
        self
    }

    pub fn build(self) -> PoolResult<OrderedPool> {
        let options = if self.lenient && self.options.needs_normalization() {
            let normalized = self.options.clone().normalized();
            tracing::warn!(
                requested_workers = self.options.workers,
                requested_max_in_flight = ?self.options.max_in_flight,
                workers = normalized.workers,
                max_in_flight = ?normalized.max_in_flight,
                "Normalized invalid pool options"
            );
            normalized
        } else {
            self.options
        };

        OrderedPool::with_cancellation_token(options, self.token.unwrap_or_else(CancellationToken::new))
    }
}
