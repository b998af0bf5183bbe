//! orderly core library
//!
//! Bounded, order-preserving parallel map on top of tokio: inputs are
//! processed by a fixed set of workers and results come back in the order the
//! inputs arrived, whichever worker finishes first.

pub mod config;
pub mod error;
pub mod pool;

// Re-export commonly used types
pub use config::{PanicPolicy, PoolOptions};
pub use error::{PanicError, PoolError, PoolResult, TaskError, TaskResult};
pub use pool::{
    OrderedPool, OrderedPoolBuilder, OrderedStream, PipelineSummary, StopReason, TaskContext,
    map_ordered,
};
