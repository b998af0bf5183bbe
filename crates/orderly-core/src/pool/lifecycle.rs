//! Pipeline wiring: queue creation, task spawning and closing order

use super::collector::{self, CollectorParts};
use super::context::TaskContext;
use super::stream::OrderedStream;
use super::submitter;
use super::types::IndexedResult;
use super::worker::{self, WorkerSettings};
use crate::config::PoolOptions;
use futures::stream::FuturesUnordered;
use futures::{FutureExt, Stream, StreamExt};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Spawn the submitter, the workers, the worker-join helper and the collector
/// for one pipeline, and hand back its output stream.
///
/// Closing order:
/// - the task queue closes when the submitter returns
/// - the result queue closes when the helper has joined every worker and
///   drops the last sender; a worker that fails instead of returning
///   cancels the pipeline
/// - the output closes when the collector returns
pub(super) fn launch<S, T, R, E, F, Fut>(
    options: &PoolOptions,
    root: &CancellationToken,
    input: S,
    transform: F,
) -> OrderedStream<R, E>
where
    S: Stream<Item = T> + Send + 'static,
    T: Send + 'static,
    R: Send + 'static,
    E: Send + 'static,
    F: Fn(TaskContext, T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, E>> + Send + 'static,
{
    let shutdown = root.child_token();
    let capacity = options.effective_max_in_flight();

    let (task_tx, task_rx) = mpsc::channel(capacity);
    let (result_tx, result_rx) = mpsc::channel(capacity);
    let (output_tx, output_rx) = mpsc::channel(capacity);
    let (summary_tx, summary_rx) = oneshot::channel();

    tracing::debug!(
        workers = options.workers,
        max_in_flight = capacity,
        early_stop_after = ?options.early_stop_limit(),
        panic_policy = %options.panic_policy,
        task_timeout = ?options.effective_task_timeout(),
        "Starting ordered pipeline"
    );

    tokio::spawn(submitter::run(input, task_tx, shutdown.clone()));

    let settings = WorkerSettings {
        panic_policy: options.panic_policy,
        task_timeout: options.effective_task_timeout(),
    };
    let task_queue = Arc::new(Mutex::new(task_rx));
    let transform = Arc::new(transform);
    let workers: Vec<JoinHandle<()>> = (0..options.workers)
        .map(|id| {
            tokio::spawn(worker::run(
                id,
                task_queue.clone(),
                result_tx.clone(),
                transform.clone(),
                settings,
                shutdown.clone(),
            ))
        })
        .collect();

    let worker_failure = CancellationToken::new();
    tokio::spawn(close_results_when_idle(
        workers,
        result_tx,
        shutdown.clone(),
        worker_failure.clone(),
    ));

    tokio::spawn(collector::run(
        CollectorParts {
            result_rx,
            output_tx,
            summary_tx,
            early_stop_after: options.early_stop_limit(),
            worker_failure,
        },
        shutdown.clone(),
        root.clone(),
    ));

    OrderedStream::new(output_rx, summary_rx, shutdown)
}

/// Keep the result queue open until every worker has exited.
///
/// The first worker that fails (rather than returning) fires
/// `worker_failure` and cancels the pipeline, since its in-flight slot will
/// never produce a result.
async fn close_results_when_idle<R, E>(
    workers: Vec<JoinHandle<()>>,
    result_tx: mpsc::Sender<IndexedResult<R, E>>,
    shutdown: CancellationToken,
    worker_failure: CancellationToken,
) {
    let mut running: FuturesUnordered<_> = workers
        .into_iter()
        .enumerate()
        .map(|(id, handle)| handle.map(move |joined| (id, joined)))
        .collect();

    while let Some((id, joined)) = running.next().await {
        if let Err(err) = joined {
            if !worker_failure.is_cancelled() {
                tracing::error!(worker = id, error = %err, "Worker task failed, stopping pipeline");
                worker_failure.cancel();
                shutdown.cancel();
            } else {
                tracing::debug!(worker = id, error = %err, "Another worker task failed");
            }
        }
    }

    tracing::debug!("All workers exited, closing result queue");
    drop(result_tx);
}
