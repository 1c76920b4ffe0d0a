use std::{
    future::Future,
    time::{Duration, Instant},
};

use tokio_util::sync::CancellationToken;

/// Caller-controlled scope for the network operation a built request will eventually perform.
///
/// Building a request only attaches the context to it. Cancellation and the deadline matter once
/// the request is handed to a transport, which should drive its work through [`ExecutionContext::run`].
#[derive(Clone, Debug, Default)]
pub struct ExecutionContext {
    cancellation: CancellationToken,
    deadline: Option<Instant>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Interrupted {
    #[error("The operation was cancelled")]
    Cancelled,
    #[error("The operation timed out")]
    TimedOut,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses an existing token, so that cancelling it elsewhere also cancels this context.
    pub fn from_token(cancellation: CancellationToken) -> Self {
        ExecutionContext {
            cancellation,
            deadline: None,
        }
    }

    /// Sets the deadline `timeout` from now. A timeout too long to represent leaves the context
    /// without a new deadline.
    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self,
        }
    }

    /// Sets the deadline. An earlier deadline already in place is kept.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(current) => current.min(deadline),
            None => deadline,
        });
        self
    }

    /// A context cancelled together with this one, which can also be cancelled on its own.
    pub fn child(&self) -> Self {
        ExecutionContext {
            cancellation: self.cancellation.child_token(),
            deadline: self.deadline,
        }
    }

    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline, `None` without one. Zero once the deadline has passed.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Runs `future` until it completes, the context is cancelled or the deadline passes,
    /// whichever comes first.
    pub async fn run<F: Future>(&self, future: F) -> Result<F::Output, Interrupted> {
        if self.is_cancelled() {
            return Err(Interrupted::Cancelled);
        }

        let timeout = async {
            match self.remaining() {
                Some(remaining) => tokio::time::sleep(remaining).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.cancellation.cancelled() => Err(Interrupted::Cancelled),
            _ = timeout => Err(Interrupted::TimedOut),
            output = future => Ok(output),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn run_completes_without_deadline() {
        let ctx = ExecutionContext::new();
        assert_eq!(ctx.run(async { 42 }).await, Ok(42));
        assert_eq!(ctx.remaining(), None);
    }

    #[tokio::test]
    async fn unbounded_timeout_sets_no_deadline() {
        let ctx = ExecutionContext::new().with_timeout(Duration::MAX);
        assert_eq!(ctx.deadline(), None);
        assert_eq!(ctx.run(async { 1 }).await, Ok(1));

        let ctx = ExecutionContext::new()
            .with_timeout(Duration::from_secs(60))
            .with_timeout(Duration::MAX);
        assert!(ctx.remaining().is_some_and(|left| left <= Duration::from_secs(60)));
    }

    #[tokio::test]
    async fn run_is_interrupted_by_cancellation() {
        let ctx = ExecutionContext::new();
        let child = ctx.child();
        ctx.cancel();

        assert!(child.is_cancelled());
        let result = child.run(std::future::pending::<()>()).await;
        assert_eq!(result, Err(Interrupted::Cancelled));
    }

    #[tokio::test]
    async fn cancelling_a_child_leaves_the_parent_alone() {
        let ctx = ExecutionContext::new();
        let child = ctx.child();
        child.cancel();

        assert!(!ctx.is_cancelled());
        assert_eq!(ctx.run(async { "done" }).await, Ok("done"));
    }

    #[tokio::test]
    async fn run_times_out() {
        let ctx = ExecutionContext::new().with_timeout(Duration::from_millis(10));
        let result = ctx.run(std::future::pending::<()>()).await;
        assert_eq!(result, Err(Interrupted::TimedOut));
    }

    #[test]
    fn earliest_deadline_wins() {
        let now = Instant::now();
        let ctx = ExecutionContext::new()
            .with_deadline(now + Duration::from_secs(5))
            .with_deadline(now + Duration::from_secs(60));

        assert_eq!(ctx.deadline(), Some(now + Duration::from_secs(5)));
        assert!(ctx.remaining().unwrap() <= Duration::from_secs(5));
        assert_eq!(ctx.child().deadline(), ctx.deadline());
    }

    #[test]
    fn shared_token() {
        let token = CancellationToken::new();
        let ctx = ExecutionContext::from_token(token.clone());
        token.cancel();
        assert!(ctx.is_cancelled());
    }
}
