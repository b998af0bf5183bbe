//! The pool handle

use super::builder::OrderedPoolBuilder;
use super::context::TaskContext;
use super::lifecycle;
use super::stream::OrderedStream;
use crate::config::PoolOptions;
use crate::error::PoolResult;
use futures::Stream;
use std::future::Future;
use tokio_util::sync::CancellationToken;

/// A configured, reusable order-preserving parallel map.
///
/// Every call to [`map`](Self::map) starts an independent pipeline whose
/// cancellation token is a child of the pool's root token.
#[derive(Debug, Clone)]
pub struct OrderedPool {
    options: PoolOptions,
    root: CancellationToken,
}

impl OrderedPool {
    /// Create a pool, rejecting invalid options
    pub fn new(options: PoolOptions) -> PoolResult<Self> {
        Self::with_cancellation_token(options, CancellationToken::new())
    }

    /// Create a pool whose pipelines stop when `token` is cancelled
    pub fn with_cancellation_token(
        options: PoolOptions,
        token: CancellationToken,
    ) -> PoolResult<Self> {
        options.validate()?;
        Ok(Self {
            options,
            root: token,
        })
    }

    /// Start building a pool
    pub fn builder() -> OrderedPoolBuilder {
        OrderedPoolBuilder::new()
    }

    /// The options this pool runs with
    pub fn options(&self) -> &PoolOptions {
        &self.options
    }

    /// Get a child of the pool's root token
    pub fn child_token(&self) -> CancellationToken {
        self.root.child_token()
    }

    /// Cancel every pipeline started by this pool, including future ones
    pub fn cancel_all(&self) {
        self.root.cancel();
    }

    /// Check if the root token has been cancelled
    pub fn is_cancelled(&self) -> bool {
        self.root.is_cancelled()
    }

    /// Run `transform` over `input` on the pool's workers and return the
    /// results in input order.
    ///
    /// # Panics
    ///
    /// Must be called from within a Tokio runtime.
    pub fn map<S, T, R, E, F, Fut>(&self, input: S, transform: F) -> OrderedStream<R, E>
    where
        S: Stream<Item = T> + Send + 'static,
        T: Send + 'static,
        R: Send + 'static,
        E: Send + 'static,
        F: Fn(TaskContext, T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, E>> + Send + 'static,
    {
        lifecycle::launch(&self.options, &self.root, input, transform)
    }

    /// [`map`](Self::map) over an in-memory collection
    pub fn map_iter<I, R, E, F, Fut>(&self, items: I, transform: F) -> OrderedStream<R, E>
    where
        I: IntoIterator,
        I::IntoIter: Send + 'static,
        I::Item: Send + 'static,
        R: Send + 'static,
        E: Send + 'static,
        F: Fn(TaskContext, I::Item) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, E>> + Send + 'static,
    {
        self.map(futures::stream::iter(items), transform)
    }
}

/// One-shot form of [`OrderedPool::map`]: validate `options`, run one
/// pipeline tied to `token`, and return its output.
pub fn map_ordered<S, T, R, E, F, Fut>(
    token: CancellationToken,
    input: S,
    transform: F,
    options: PoolOptions,
) -> PoolResult<OrderedStream<R, E>>
where
    S: Stream<Item = T> + Send + 'static,
    T: Send + 'static,
    R: Send + 'static,
    E: Send + 'static,
    F: Fn(TaskContext, T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, E>> + Send + 'static,
{
    let pool = OrderedPool::with_cancellation_token(options, token)?;
    Ok(pool.map(input, transform))
}
