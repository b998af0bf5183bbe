//! Per-task context handed to the transform

use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Context for one invocation of the transform.
///
/// The token is a child of the pipeline token: it fires when the caller
/// cancels, when the pipeline stops early, or when this task's deadline
/// passes.
#[derive(Debug, Clone)]
pub struct TaskContext {
    index: usize,
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl TaskContext {
    pub(super) fn new(index: usize, token: CancellationToken, deadline: Option<Instant>) -> Self {
        Self {
            index,
            token,
            deadline,
        }
    }

    /// Zero-based position of this item in the input stream
    pub fn index(&self) -> usize {
        self.index
    }

    /// The task-scoped cancellation token
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.token
    }

    /// Check if the task has been cancelled
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Wait until the task is cancelled
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }

    /// When this task's deadline expires, if it has one
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_context_follows_parent_token() {
        let parent = CancellationToken::new();
        let ctx = TaskContext::new(3, parent.child_token(), None);

        assert_eq!(ctx.index(), 3);
        assert!(!ctx.is_cancelled());
        assert!(ctx.remaining().is_none());

        parent.cancel();
        ctx.cancelled().await;
        assert!(ctx.is_cancelled());
    }

    #[tokio::test]
    async fn test_remaining_time() {
        let deadline = Instant::now() + Duration::from_secs(60);
        let ctx = TaskContext::new(0, CancellationToken::new(), Some(deadline));

        assert_eq!(ctx.deadline(), Some(deadline));
        let remaining = ctx.remaining().unwrap();
        assert!(remaining <= Duration::from_secs(60));
        assert!(remaining > Duration::from_secs(59));
    }
}
