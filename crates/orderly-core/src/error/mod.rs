//! Error types for orderly
//!
//! Two families live here:
//! - [`PoolError`]: problems building or configuring a pool
//! - [`TaskError`]: the terminal error of a single slot in the output stream,
//!   which is either the transform's own error, a captured panic, or an
//!   expired task deadline

mod panic;
mod task;
mod types;

pub use panic::PanicError;
pub use task::{TaskError, TaskResult};
pub use types::{PoolError, PoolResult};
