//! Order-preserving parallel map
//!
//! ```text
//! input ─▶ submitter ─▶ task queue ─▶ workers (×N) ─▶ result queue ─▶ collector ─▶ OrderedStream
//! ```
//!
//! - The submitter tags each item with its input position and blocks while
//!   the task queue is full
//! - Workers run the transform with panic capture and an optional deadline
//! - The collector buffers early finishers and releases results in index
//!   order, stopping the whole pipeline once the success quota is met
//! - Queues are bounded by `max_in_flight`; every wait also watches the
//!   pipeline's cancellation token
//!
//! ## Example
//!
//! ```rust
//! use futures::StreamExt;
//! use orderly_core::pool::OrderedPool;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let pool = OrderedPool::builder().with_workers(2).build().unwrap();
//! let results: Vec<_> = pool
//!     .map_iter(1..=5, |_ctx, x: u32| async move { Ok::<_, std::io::Error>(x * 2) })
//!     .map(|r| r.unwrap())
//!     .collect()
//!     .await;
//! assert_eq!(results, vec![2, 4, 6, 8, 10]);
//! # }
//! ```

mod builder;
mod collector;
mod context;
mod lifecycle;
mod ordered_pool;
mod reorder;
mod stream;
mod submitter;
mod types;
mod worker;

pub use builder::OrderedPoolBuilder;
pub use context::TaskContext;
pub use ordered_pool::{OrderedPool, map_ordered};
pub use stream::OrderedStream;
pub use types::{PipelineSummary, StopReason};
