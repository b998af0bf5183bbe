//! Input side of the pipeline

use super::types::IndexedTask;
use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Tag every input item with its position and push it onto the task queue.
///
/// Blocks while the queue is full. Returns the number of tasks submitted.
/// The task queue is closed when this returns, whether the input ran dry,
/// the pipeline was cancelled, or every worker has gone away.
pub(super) async fn run<S, T>(
    input: S,
    task_tx: mpsc::Sender<IndexedTask<T>>,
    shutdown: CancellationToken,
) -> usize
where
    S: Stream<Item = T>,
{
    let mut input = std::pin::pin!(input);
    let mut index = 0;

    loop {
        let value = tokio::select! {
            biased;
            _ = shutdown.cancelled() => {
                tracing::debug!(submitted = index, "Submitter cancelled");
                break;
            }
            next = input.next() => match next {
                Some(value) => value,
                None => {
                    tracing::debug!(submitted = index, "Input exhausted");
                    break;
                }
            }
        };

        let sent = tokio::select! {
            biased;
            _ = shutdown.cancelled() => false,
            sent = task_tx.send(IndexedTask { index, value }) => sent.is_ok(),
        };

        if !sent {
            tracing::debug!(submitted = index, "Submitter stopped, task queue unavailable");
            break;
        }

        index += 1;
    }

    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;
    use std::time::Duration;

    #[tokio::test]
    async fn test_assigns_dense_indices_and_closes_queue() {
        let (task_tx, mut task_rx) = mpsc::channel(8);
        let submitted = run(
            stream::iter(["a", "b", "c"]),
            task_tx,
            CancellationToken::new(),
        )
        .await;

        assert_eq!(submitted, 3);
        let mut seen = Vec::new();
        while let Some(task) = task_rx.recv().await {
            seen.push((task.index, task.value));
        }
        assert_eq!(seen, vec![(0, "a"), (1, "b"), (2, "c")]);
    }

    #[tokio::test]
    async fn test_cancel_unblocks_full_queue() {
        let (task_tx, mut task_rx) = mpsc::channel(1);
        let shutdown = CancellationToken::new();

        let handle = tokio::spawn(run(stream::iter(0..100), task_tx, shutdown.clone()));

        // Let the submitter fill the queue and block on the second send.
        tokio::time::sleep(Duration::from_millis(20)).await;
        shutdown.cancel();

        let submitted = tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("submitter should exit after cancellation")
            .unwrap();
        assert_eq!(submitted, 1);

        assert_eq!(task_rx.recv().await.map(|t| t.index), Some(0));
        assert!(task_rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_cancel_while_waiting_for_input() {
        let (task_tx, mut task_rx) = mpsc::channel::<IndexedTask<u32>>(4);
        let shutdown = CancellationToken::new();

        let handle = tokio::spawn(run(stream::pending(), task_tx, shutdown.clone()));
        shutdown.cancel();

        let submitted = tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("submitter should not wait on input past cancellation")
            .unwrap();
        assert_eq!(submitted, 0);
        assert!(task_rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_stops_when_workers_gone() {
        let (task_tx, task_rx) = mpsc::channel(1);
        drop(task_rx);

        let submitted = run(stream::iter(0..10), task_tx, CancellationToken::new()).await;
        assert_eq!(submitted, 0);
    }
}
