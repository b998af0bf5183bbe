//! Output side of the pipeline

use super::types::{Emission, PipelineSummary};
use crate::error::TaskResult;
use futures::Stream;
use std::pin::Pin;
use std::task::{Context, Poll, ready};
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::{CancellationToken, DropGuard};

/// Results of a pipeline, in input order.
///
/// Ends once every submitted item has been delivered, the success quota was
/// reached, or the pipeline was cancelled. Dropping the stream cancels the
/// pipeline.
///
/// # Panics
///
/// Under `PanicPolicy::Propagate`, polling the stream re-raises a panic
/// thrown by the transform.
pub struct OrderedStream<R, E> {
    output: mpsc::Receiver<Emission<R, E>>,
    summary_rx: Option<oneshot::Receiver<PipelineSummary>>,
    summary: Option<PipelineSummary>,
    token: CancellationToken,
    _guard: DropGuard,
}

impl<R, E> OrderedStream<R, E> {
    pub(super) fn new(
        output: mpsc::Receiver<Emission<R, E>>,
        summary_rx: oneshot::Receiver<PipelineSummary>,
        token: CancellationToken,
    ) -> Self {
        let guard = token.clone().drop_guard();
        Self {
            output,
            summary_rx: Some(summary_rx),
            summary: None,
            token,
            _guard: guard,
        }
    }

    /// Stop the pipeline. Already buffered results may still be yielded.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Check if the pipeline has been cancelled or stopped early
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Counters from the collector, available once it has stopped
    pub fn summary(&mut self) -> Option<PipelineSummary> {
        if self.summary.is_none() {
            if let Some(rx) = self.summary_rx.as_mut() {
                match rx.try_recv() {
                    Ok(summary) => {
                        self.summary = Some(summary);
                        self.summary_rx = None;
                    }
                    Err(oneshot::error::TryRecvError::Empty) => {}
                    Err(oneshot::error::TryRecvError::Closed) => self.summary_rx = None,
                }
            }
        }
        self.summary
    }
}

impl<R, E> Stream for OrderedStream<R, E> {
    type Item = TaskResult<R, E>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        match ready!(this.output.poll_recv(cx)) {
            Some(Emission::Item(result)) => Poll::Ready(Some(result)),
            Some(Emission::Fatal(payload)) => {
                this.token.cancel();
                std::panic::resume_unwind(payload)
            }
            None => Poll::Ready(None),
        }
    }
}

impl<R, E> std::fmt::Debug for OrderedStream<R, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderedStream")
            .field("cancelled", &self.token.is_cancelled())
            .field("summary", &self.summary)
            .finish_non_exhaustive()
    }
}
