//! Messages passed between pipeline stages

use crate::error::TaskResult;
use std::any::Any;

/// An input item tagged with its position in the input stream
#[derive(Debug)]
pub(super) struct IndexedTask<T> {
    pub index: usize,
    pub value: T,
}

/// What a worker produced for one task
pub(super) enum Outcome<R, E> {
    /// A terminal result for the slot
    Completed(TaskResult<R, E>),
    /// The transform panicked under `PanicPolicy::Propagate`
    Fatal(Box<dyn Any + Send + 'static>),
}

/// A worker's outcome tagged with the index of the task it ran
pub(super) struct IndexedResult<R, E> {
    pub index: usize,
    pub outcome: Outcome<R, E>,
}

/// An item on the output channel
pub(super) enum Emission<R, E> {
    Item(TaskResult<R, E>),
    Fatal(Box<dyn Any + Send + 'static>),
}

/// Counters reported by the collector once it stops
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineSummary {
    /// Results delivered to the output stream
    pub emitted: usize,
    /// Delivered results that carried a value
    pub succeeded: usize,
    /// Delivered results that carried an error
    pub failed: usize,
    /// Results received but never delivered because the pipeline stopped first
    pub discarded: usize,
    /// Why the collector stopped
    pub stop_reason: StopReason,
}

/// Why the pipeline stopped delivering results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StopReason {
    /// Every submitted task was delivered
    #[default]
    Exhausted,
    /// The success quota was reached
    EarlyStop,
    /// The pipeline was cancelled by the caller or the consumer went away
    Cancelled,
    /// A transform panicked and the panic was propagated
    Panicked,
    /// A worker task died outside the guarded transform, so some slots will
    /// never get a result
    WorkerFailed,
}
