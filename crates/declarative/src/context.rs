//! Operation context: deadline and cooperative cancellation.
//!
//! The host invokes one lifecycle operation at a time per resource instance
//! and owns the context's lifetime. Handlers check the context at their
//! suspension points (remote calls, retry sleeps); on cancel the in-flight
//! operation aborts and no computed state is written back.

use crate::error::ContextError;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Per-operation timeouts, user-configurable per resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub create: Duration,
    pub read: Duration,
    pub update: Duration,
    pub delete: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            create: Duration::from_secs(10 * 60),
            read: Duration::from_secs(5 * 60),
            update: Duration::from_secs(10 * 60),
            delete: Duration::from_secs(10 * 60),
        }
    }
}

/// Handle the host uses to cancel an in-flight operation.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation of every operation holding this token.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_canceled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// Context passed to every lifecycle operation.
#[derive(Debug, Clone)]
pub struct OpContext {
    started: Instant,
    deadline: Option<Instant>,
    cancel: CancelToken,
    timeouts: Timeouts,
}

impl Default for OpContext {
    fn default() -> Self {
        Self::new()
    }
}

impl OpContext {
    /// A context with default timeouts and no deadline.
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            deadline: None,
            cancel: CancelToken::new(),
            timeouts: Timeouts::default(),
        }
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn timeouts(&self) -> Timeouts {
        self.timeouts
    }

    pub fn is_canceled(&self) -> bool {
        self.cancel.is_canceled()
    }

    /// Error out when the context is canceled or past its deadline.
    ///
    /// Handlers call this before every remote call and between retry sleeps.
    pub fn checkpoint(&self) -> Result<(), ContextError> {
        if self.cancel.is_canceled() {
            return Err(ContextError::Canceled);
        }
        if let Some(deadline) = self.deadline
            && Instant::now() >= deadline
        {
            return Err(ContextError::DeadlineExceeded);
        }
        Ok(())
    }

    /// Wall time left before `budget` elapses, clipped by the deadline.
    pub fn remaining(&self, budget: Duration) -> Duration {
        let spent = self.started.elapsed();
        let by_budget = budget.saturating_sub(spent);
        match self.deadline {
            Some(deadline) => by_budget.min(deadline.saturating_duration_since(Instant::now())),
            None => by_budget,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkpoint_passes_by_default() {
        let ctx = OpContext::new();
        assert!(ctx.checkpoint().is_ok());
    }

    #[test]
    fn cancel_trips_checkpoint() {
        let token = CancelToken::new();
        let ctx = OpContext::new().with_cancel(token.clone());
        token.cancel();
        assert!(matches!(ctx.checkpoint(), Err(ContextError::Canceled)));
    }

    #[test]
    fn past_deadline_trips_checkpoint() {
        let ctx = OpContext::new().with_deadline(Instant::now() - Duration::from_secs(1));
        assert!(matches!(
            ctx.checkpoint(),
            Err(ContextError::DeadlineExceeded)
        ));
    }

    #[test]
    fn remaining_respects_deadline() {
        let ctx = OpContext::new().with_deadline(Instant::now() + Duration::from_millis(50));
        let left = ctx.remaining(Duration::from_secs(600));
        assert!(left <= Duration::from_millis(50));
    }

    #[test]
    fn default_timeouts_match_contract() {
        let t = Timeouts::default();
        assert_eq!(t.create, Duration::from_secs(600));
        assert_eq!(t.read, Duration::from_secs(300));
    }
}
