//! Cancellation and deadline context for potentially long operations.

use crate::ChainError;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Bounds the work performed by state loading and [`Chain::towards`](crate::Chain::towards).
///
/// Long operations call [`ExecutionContext::check`] between units of work (one
/// slot transition, one state load) and abort with [`ChainError::Cancelled`] or
/// [`ChainError::DeadlineExceeded`].
#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl ExecutionContext {
    /// Creates a context that is never cancelled and has no deadline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a context cancelled together with `cancel`.
    pub const fn with_cancellation(cancel: CancellationToken) -> Self {
        Self { cancel, deadline: None }
    }

    /// Sets an absolute deadline.
    pub const fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Sets a deadline `timeout` from now.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// The token cancelling this context.
    pub const fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// The deadline of this context, if any.
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns an error if the context was cancelled or its deadline passed.
    pub fn check(&self) -> Result<(), ChainError> {
        if self.cancel.is_cancelled() {
            return Err(ChainError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(ChainError::DeadlineExceeded),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_context_passes() {
        assert!(ExecutionContext::new().check().is_ok());
    }

    #[test]
    fn test_cancelled_context() {
        let token = CancellationToken::new();
        let ctx = ExecutionContext::with_cancellation(token.clone());
        token.cancel();
        assert!(matches!(ctx.check(), Err(ChainError::Cancelled)));
    }

    #[test]
    fn test_expired_deadline() {
        let ctx = ExecutionContext::new().with_deadline(Instant::now() - Duration::from_millis(1));
        assert!(matches!(ctx.check(), Err(ChainError::DeadlineExceeded)));
    }

    #[test]
    fn test_cancellation_wins_over_deadline() {
        let ctx = ExecutionContext::new().with_timeout(Duration::ZERO);
        ctx.cancellation_token().cancel();
        assert!(matches!(ctx.check(), Err(ChainError::Cancelled)));
    }
}
