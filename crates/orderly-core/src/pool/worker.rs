//! Worker loop and guarded transform invocation

use super::context::TaskContext;
use super::types::{IndexedResult, IndexedTask, Outcome};
use crate::config::PanicPolicy;
use crate::error::{PanicError, TaskError};
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, mpsc};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Task queue receiver shared by every worker
pub(super) type SharedTaskQueue<T> = Arc<Mutex<mpsc::Receiver<IndexedTask<T>>>>;

/// Settings every worker of a pipeline shares
#[derive(Debug, Clone, Copy)]
pub(super) struct WorkerSettings {
    pub panic_policy: PanicPolicy,
    pub task_timeout: Option<Duration>,
}

/// Pull tasks until the queue is drained or the pipeline is cancelled.
///
/// Each task produces exactly one result on `result_tx`, unless cancellation
/// fires first, in which case the in-flight result is discarded.
pub(super) async fn run<T, R, E, F, Fut>(
    id: usize,
    task_queue: SharedTaskQueue<T>,
    result_tx: mpsc::Sender<IndexedResult<R, E>>,
    transform: Arc<F>,
    settings: WorkerSettings,
    shutdown: CancellationToken,
) where
    F: Fn(TaskContext, T) -> Fut,
    Fut: Future<Output = Result<R, E>>,
{
    let mut completed = 0_usize;

    loop {
        let task = tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            task = next_task(&task_queue) => match task {
                Some(task) => task,
                None => break,
            },
        };

        let index = task.index;
        let outcome = tokio::select! {
            biased;
            _ = shutdown.cancelled() => {
                tracing::debug!(worker = id, index, "Dropping in-flight task on cancellation");
                break;
            }
            outcome = invoke(&*transform, task, settings, &shutdown) => outcome,
        };

        let fatal = matches!(outcome, Outcome::Fatal(_));
        let sent = tokio::select! {
            biased;
            _ = shutdown.cancelled() => false,
            sent = result_tx.send(IndexedResult { index, outcome }) => sent.is_ok(),
        };

        if !sent {
            break;
        }
        completed += 1;

        if fatal {
            break;
        }
    }

    tracing::debug!(worker = id, completed, "Worker exited");
}

async fn next_task<T>(task_queue: &Mutex<mpsc::Receiver<IndexedTask<T>>>) -> Option<IndexedTask<T>> {
    task_queue.lock().await.recv().await
}

/// Run the transform for one task with panic capture and the optional deadline
pub(super) async fn invoke<T, R, E, F, Fut>(
    transform: &F,
    task: IndexedTask<T>,
    settings: WorkerSettings,
    shutdown: &CancellationToken,
) -> Outcome<R, E>
where
    F: Fn(TaskContext, T) -> Fut,
    Fut: Future<Output = Result<R, E>>,
{
    let IndexedTask { index, value } = task;
    let token = shutdown.child_token();
    // A timeout too large to represent as an instant never expires
    let deadline = settings
        .task_timeout
        .and_then(|timeout| Some((timeout, Instant::now().checked_add(timeout)?)));
    let ctx = TaskContext::new(index, token.clone(), deadline.map(|(_, at)| at));

    // Calling the transform happens inside the guarded future so a panic
    // before its first await is caught as well.
    let guarded = AssertUnwindSafe(async move { transform(ctx, value).await }).catch_unwind();

    let caught = match deadline {
        Some((timeout, at)) => match tokio::time::timeout_at(at, guarded).await {
            Ok(caught) => caught,
            Err(_) => {
                token.cancel();
                tracing::warn!(index, timeout = ?timeout, "Task deadline exceeded");
                return Outcome::Completed(Err(TaskError::TimedOut(timeout)));
            }
        },
        None => guarded.await,
    };

    match caught {
        Ok(Ok(value)) => Outcome::Completed(Ok(value)),
        Ok(Err(err)) => Outcome::Completed(Err(TaskError::Failed(err))),
        Err(payload) => {
            let panic = PanicError::new(payload);
            match settings.panic_policy {
                PanicPolicy::Capture => {
                    tracing::warn!(index, message = %panic.message(), "Transform panicked, captured as error");
                    Outcome::Completed(Err(TaskError::Panicked(panic)))
                }
                PanicPolicy::Propagate => {
                    tracing::error!(index, message = %panic.message(), "Transform panicked, propagating");
                    Outcome::Fatal(panic.into_payload())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(panic_policy: PanicPolicy, task_timeout: Option<Duration>) -> WorkerSettings {
        WorkerSettings {
            panic_policy,
            task_timeout,
        }
    }

    fn task(index: usize, value: u32) -> IndexedTask<u32> {
        IndexedTask { index, value }
    }

    #[tokio::test]
    async fn test_invoke_success_and_failure() {
        let transform = |_ctx: TaskContext, x: u32| async move {
            if x % 2 == 0 {
                Ok(x * 10)
            } else {
                Err(format!("odd {}", x))
            }
        };
        let shutdown = CancellationToken::new();
        let settings = settings(PanicPolicy::Propagate, None);

        match invoke(&transform, task(0, 4), settings, &shutdown).await {
            Outcome::Completed(Ok(value)) => assert_eq!(value, 40),
            _ => panic!("expected a value"),
        }

        match invoke(&transform, task(1, 3), settings, &shutdown).await {
            Outcome::Completed(Err(TaskError::Failed(err))) => assert_eq!(err, "odd 3"),
            _ => panic!("expected the transform's error"),
        }
    }

    #[tokio::test]
    async fn test_invoke_passes_index_to_context() {
        let transform = |ctx: TaskContext, _x: u32| async move { Ok::<_, ()>(ctx.index()) };
        let outcome = invoke(
            &transform,
            task(7, 0),
            settings(PanicPolicy::Propagate, None),
            &CancellationToken::new(),
        )
        .await;

        assert!(matches!(outcome, Outcome::Completed(Ok(7))));
    }

    #[tokio::test]
    async fn test_invoke_captures_panic() {
        let transform = |_ctx: TaskContext, _x: u32| async move {
            if true {
                panic!("boom");
            }
            Ok::<u32, String>(0)
        };

        let outcome = invoke(
            &transform,
            task(0, 1),
            settings(PanicPolicy::Capture, None),
            &CancellationToken::new(),
        )
        .await;

        match outcome {
            Outcome::Completed(Err(TaskError::Panicked(panic))) => assert_eq!(panic.message(), "boom"),
            _ => panic!("expected a captured panic"),
        }
    }

    #[tokio::test]
    async fn test_invoke_captures_panic_before_first_await() {
        fn eager(_ctx: TaskContext, _x: u32) -> std::future::Ready<Result<u32, String>> {
            panic!("eager boom")
        }

        let outcome = invoke(
            &eager,
            task(0, 1),
            settings(PanicPolicy::Capture, None),
            &CancellationToken::new(),
        )
        .await;

        assert!(matches!(outcome, Outcome::Completed(Err(TaskError::Panicked(_)))));
    }

    #[tokio::test]
    async fn test_invoke_propagate_yields_fatal() {
        let transform = |_ctx: TaskContext, _x: u32| async move {
            if true {
                panic!("fatal");
            }
            Ok::<u32, String>(0)
        };

        let outcome = invoke(
            &transform,
            task(0, 1),
            settings(PanicPolicy::Propagate, None),
            &CancellationToken::new(),
        )
        .await;

        match outcome {
            Outcome::Fatal(payload) => assert_eq!(payload.downcast_ref::<&str>(), Some(&"fatal")),
            _ => panic!("expected a fatal outcome"),
        }
    }

    #[tokio::test]
    async fn test_invoke_deadline_cancels_task_token() {
        let (seen_tx, seen_rx) = tokio::sync::oneshot::channel();
        let seen_tx = std::sync::Mutex::new(Some(seen_tx));
        let transform = move |ctx: TaskContext, _x: u32| {
            let token = ctx.cancellation_token().clone();
            if let Some(tx) = seen_tx.lock().unwrap().take() {
                let _ = tx.send(token);
            }
            async move {
                tokio::time::sleep(Duration::from_millis(100)).await;
                Ok::<u32, String>(1)
            }
        };

        let shutdown = CancellationToken::new();
        let outcome = invoke(
            &transform,
            task(0, 1),
            settings(PanicPolicy::Propagate, Some(Duration::from_millis(10))),
            &shutdown,
        )
        .await;

        assert!(matches!(
            outcome,
            Outcome::Completed(Err(TaskError::TimedOut(d))) if d == Duration::from_millis(10)
        ));
        let token = seen_rx.await.unwrap();
        assert!(token.is_cancelled());
        assert!(!shutdown.is_cancelled());
    }

    #[tokio::test]
    async fn test_invoke_unrepresentable_timeout_runs_without_deadline() {
        let transform = |ctx: TaskContext, x: u32| async move {
            assert!(ctx.deadline().is_none());
            Ok::<_, String>(x * 2)
        };

        let outcome = invoke(
            &transform,
            task(0, 21),
            settings(PanicPolicy::Propagate, Some(Duration::MAX)),
            &CancellationToken::new(),
        )
        .await;

        assert!(matches!(outcome, Outcome::Completed(Ok(42))));
    }

    #[tokio::test]
    async fn test_worker_drains_queue_then_exits() {
        let (task_tx, task_rx) = mpsc::channel(4);
        let (result_tx, mut result_rx) = mpsc::channel(4);
        for i in 0..3 {
            task_tx.send(task(i, i as u32)).await.unwrap();
        }
        drop(task_tx);

        let transform = Arc::new(|_ctx: TaskContext, x: u32| async move { Ok::<_, String>(x + 1) });
        run(
            0,
            Arc::new(Mutex::new(task_rx)),
            result_tx,
            transform,
            settings(PanicPolicy::Propagate, None),
            CancellationToken::new(),
        )
        .await;

        let mut values = Vec::new();
        while let Some(result) = result_rx.recv().await {
            match result.outcome {
                Outcome::Completed(Ok(v)) => values.push((result.index, v)),
                _ => panic!("unexpected outcome"),
            }
        }
        assert_eq!(values, vec![(0, 1), (1, 2), (2, 3)]);
    }

    #[tokio::test]
    async fn test_worker_blocked_on_full_results_exits_on_cancel() {
        let (task_tx, task_rx) = mpsc::channel(4);
        let (result_tx, _result_rx) = mpsc::channel(1);
        for i in 0..4 {
            task_tx.send(task(i, i as u32)).await.unwrap();
        }

        let shutdown = CancellationToken::new();
        let transform = Arc::new(|_ctx: TaskContext, x: u32| async move { Ok::<_, String>(x) });
        let handle = tokio::spawn(run(
            0,
            Arc::new(Mutex::new(task_rx)),
            result_tx,
            transform,
            settings(PanicPolicy::Propagate, None),
            shutdown.clone(),
        ));

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!handle.is_finished());

        shutdown.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("worker should exit after cancellation")
            .unwrap();
    }
}
