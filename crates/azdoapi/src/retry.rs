//! Retry kernel for eventually-consistent Azure DevOps endpoints.
//!
//! Structural edits to work-item processes propagate asynchronously, so some
//! follow-up calls fail with transient markers for a short window. Callers
//! wrap those calls in [`with_retry`] with a classifier that names the marker
//! they tolerate.

use std::thread;
use std::time::{Duration, Instant};

use declarative::OpContext;
use log::debug;
use rand::Rng;

use crate::error::{Error, Result};

const INITIAL_DELAY: Duration = Duration::from_secs(1);
const MAX_DELAY: Duration = Duration::from_secs(30);

/// Retry `op` while `classify` deems the error transient, with exponential
/// backoff, until `budget` is exhausted or the context is interrupted.
///
/// Delays start at one second, double each attempt, cap at thirty seconds,
/// and carry a uniform jitter factor in `[0.5, 1.5)`. The final transient
/// error is returned once the budget runs out.
pub fn with_retry<T, F, C>(ctx: &OpContext, budget: Duration, classify: C, mut op: F) -> Result<T>
where
    F: FnMut() -> Result<T>,
    C: Fn(&Error) -> bool,
{
    let deadline = Instant::now() + ctx.remaining(budget);
    let mut delay = INITIAL_DELAY;
    let mut attempt: u32 = 0;

    loop {
        ctx.checkpoint()?;
        attempt += 1;

        let err = match op() {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        if !classify(&err) {
            return Err(err);
        }

        let jittered = jitter(delay);
        if Instant::now() + jittered >= deadline {
            debug!("retry budget exhausted after {attempt} attempts: {err}");
            return Err(err);
        }

        debug!("attempt {attempt} failed transiently, retrying in {jittered:?}: {err}");
        thread::sleep(jittered);
        delay = (delay * 2).min(MAX_DELAY);
    }
}

fn jitter(delay: Duration) -> Duration {
    let factor = rand::rng().random_range(0.5..1.5);
    delay.mul_f64(factor)
}

/// Classifier for reads racing a structural edit: retry while the entity is
/// still reported absent.
pub fn retry_on_not_found(err: &Error) -> bool {
    err.is_not_found()
}

/// Classifier for writes racing a structural edit (`TF401349`).
pub fn retry_on_unexpected_exception(err: &Error) -> bool {
    err.is_unexpected_exception()
}

/// Classifier for calls racing contribution installation (`VS403120`).
/// Some endpoints surface the propagation window as a plain 404 instead.
pub fn retry_on_contribution_missing(err: &Error) -> bool {
    err.is_contribution_missing() || err.is_not_found()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn transient() -> Error {
        Error::from_response(
            500,
            r#"{"message":"TF401349: An unexpected error has occurred"}"#,
        )
    }

    #[test]
    fn returns_first_success() {
        let ctx = OpContext::new();
        let calls = Cell::new(0);
        let out = with_retry(&ctx, Duration::from_secs(5), retry_on_unexpected_exception, || {
            calls.set(calls.get() + 1);
            Ok(42)
        });
        assert_eq!(out.unwrap(), 42);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn retries_transient_then_succeeds() {
        let ctx = OpContext::new();
        let calls = Cell::new(0);
        let out = with_retry(&ctx, Duration::from_secs(30), retry_on_unexpected_exception, || {
            calls.set(calls.get() + 1);
            if calls.get() < 2 {
                Err(transient())
            } else {
                Ok("done")
            }
        });
        assert_eq!(out.unwrap(), "done");
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn non_matching_error_propagates_immediately() {
        let ctx = OpContext::new();
        let calls = Cell::new(0);
        let out: Result<()> = with_retry(
            &ctx,
            Duration::from_secs(30),
            retry_on_unexpected_exception,
            || {
                calls.set(calls.get() + 1);
                Err(Error::from_response(403, r#"{"message":"Access denied"}"#))
            },
        );
        assert!(out.is_err());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn exhausted_budget_returns_last_transient_error() {
        let ctx = OpContext::new();
        let out: Result<()> = with_retry(&ctx, Duration::from_millis(10), retry_on_not_found, || {
            Err(Error::NotFound {
                message: "still propagating".to_string(),
            })
        });
        assert!(out.unwrap_err().is_not_found());
    }

    #[test]
    fn canceled_context_stops_retrying() {
        let token = declarative::CancelToken::new();
        let ctx = OpContext::new().with_cancel(token.clone());
        token.cancel();
        let out: Result<()> = with_retry(&ctx, Duration::from_secs(30), retry_on_not_found, || {
            Ok(())
        });
        assert!(matches!(out, Err(Error::Interrupted(_))));
    }
}
