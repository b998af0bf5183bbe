//! Reassembly of out-of-order results into input order

use super::reorder::ReorderBuffer;
use super::types::{Emission, IndexedResult, Outcome, PipelineSummary, StopReason};
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

/// Channels and limits the collector works with
pub(super) struct CollectorParts<R, E> {
    pub result_rx: mpsc::Receiver<IndexedResult<R, E>>,
    pub output_tx: mpsc::Sender<Emission<R, E>>,
    pub summary_tx: oneshot::Sender<PipelineSummary>,
    pub early_stop_after: Option<usize>,
    /// Fired by the worker join helper when a worker task failed
    pub worker_failure: CancellationToken,
}

/// Consume the result queue and forward results downstream in index order.
///
/// `shutdown` is the pipeline token: the collector cancels it when the
/// success quota is reached or a panic is propagated, which releases the
/// submitter and any worker blocked on a queue. `root` is the caller's token
/// and only bounds the wait for delivering a propagated panic.
///
/// A failed worker leaves holes in the index sequence, so `worker_failure`
/// ends the run with [`StopReason::WorkerFailed`] instead of waiting for
/// results that will never arrive.
///
/// The output channel closes when this returns; the summary is sent just
/// before that.
pub(super) async fn run<R, E>(
    parts: CollectorParts<R, E>,
    shutdown: CancellationToken,
    root: CancellationToken,
) {
    let CollectorParts {
        mut result_rx,
        output_tx,
        summary_tx,
        early_stop_after,
        worker_failure,
    } = parts;

    let mut buffer = ReorderBuffer::new();
    let mut summary = PipelineSummary::default();
    let interrupted = |otherwise: StopReason| {
        if worker_failure.is_cancelled() {
            StopReason::WorkerFailed
        } else {
            otherwise
        }
    };

    summary.stop_reason = 'collect: loop {
        let received = tokio::select! {
            biased;
            _ = worker_failure.cancelled() => break 'collect StopReason::WorkerFailed,
            _ = shutdown.cancelled() => break 'collect interrupted(StopReason::Cancelled),
            received = result_rx.recv() => received,
        };

        let Some(IndexedResult { index, outcome }) = received else {
            break 'collect interrupted(StopReason::Exhausted);
        };

        match outcome {
            Outcome::Completed(result) => buffer.insert(index, result),
            Outcome::Fatal(payload) => {
                shutdown.cancel();
                tokio::select! {
                    biased;
                    _ = root.cancelled() => {}
                    _ = output_tx.send(Emission::Fatal(payload)) => {}
                }
                break 'collect StopReason::Panicked;
            }
        }

        while let Some((index, result)) = buffer.pop_ready() {
            let success = result.is_ok();
            let sent = tokio::select! {
                biased;
                _ = shutdown.cancelled() => false,
                sent = output_tx.send(Emission::Item(result)) => sent.is_ok(),
            };

            if !sent {
                tracing::debug!(index, "Output closed or pipeline cancelled while emitting");
                summary.discarded += 1;
                break 'collect interrupted(StopReason::Cancelled);
            }

            summary.emitted += 1;
            if success {
                summary.succeeded += 1;
            } else {
                summary.failed += 1;
            }

            if let Some(limit) = early_stop_after {
                if summary.succeeded >= limit {
                    tracing::info!(
                        succeeded = summary.succeeded,
                        last_index = index,
                        "Success quota reached, stopping pipeline"
                    );
                    shutdown.cancel();
                    break 'collect StopReason::EarlyStop;
                }
            }
        }
    };

    summary.discarded += buffer.pending();
    tracing::debug!(
        next_index = buffer.next_index(),
        emitted = summary.emitted,
        succeeded = summary.succeeded,
        failed = summary.failed,
        discarded = summary.discarded,
        reason = ?summary.stop_reason,
        "Collector finished"
    );

    let _ = summary_tx.send(summary);
}
