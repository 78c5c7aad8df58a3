//! Bounded retry and best-effort combinators
//!
//! `RetryPolicy::run` drives startup polling and `wait_until_ready`.
//! `best_effort` wraps sub-commands whose failure is an expected outcome
//! (e.g. killing a process that is not running).

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Fixed-interval retry with a hard attempt cap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

/// Result of a single attempt
#[derive(Debug)]
pub enum Attempt<T, E> {
    Ready(T),
    Pending,
    /// Stop retrying immediately
    Abort(E),
}

#[derive(Debug, PartialEq, Eq)]
pub enum RetryError<E> {
    Exhausted { attempts: u32 },
    Aborted(E),
}

impl RetryPolicy {
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }

    /// Sleeps `interval` before every attempt. `op` receives the 1-based
    /// attempt number.
    pub async fn run<T, E, F, Fut>(&self, mut op: F) -> Result<T, RetryError<E>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Attempt<T, E>>,
    {
        for attempt in 1..=self.max_attempts {
            tokio::time::sleep(self.interval).await;

            match op(attempt).await {
                Attempt::Ready(value) => return Ok(value),
                Attempt::Abort(err) => return Err(RetryError::Aborted(err)),
                Attempt::Pending => {
                    debug!(attempt, max_attempts = self.max_attempts, "Attempt pending");
                }
            }
        }

        Err(RetryError::Exhausted {
            attempts: self.max_attempts,
        })
    }
}

/// Await a fallible step, log a failure and carry on
pub async fn best_effort<T, E, Fut>(label: &str, step: Fut) -> Option<T>
where
    E: Display,
    Fut: Future<Output = Result<T, E>>,
{
    match step.await {
        Ok(value) => Some(value),
        Err(e) => {
            debug!(step = label, error = %e, "Best-effort step failed, continuing");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(Duration::from_millis(1), max_attempts)
    }

    #[tokio::test]
    async fn test_stops_on_first_ready() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, RetryError<()>> = fast(5)
            .run(|attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if attempt == 3 {
                        Attempt::Ready(attempt)
                    } else {
                        Attempt::Pending
                    }
                }
            })
            .await;

        assert_eq!(result, Ok(3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhausted_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<(), RetryError<()>> = fast(4)
            .run(|_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Attempt::Pending }
            })
            .await;

        assert_eq!(result, Err(RetryError::Exhausted { attempts: 4 }));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_abort_short_circuits() {
        let calls = AtomicU32::new(0);
        let result: Result<(), RetryError<&str>> = fast(10)
            .run(|attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if attempt == 2 {
                        Attempt::Abort("boom")
                    } else {
                        Attempt::Pending
                    }
                }
            })
            .await;

        assert_eq!(result, Err(RetryError::Aborted("boom")));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_best_effort_swallows_errors() {
        let failed = best_effort("fails", async { Err::<(), _>("no such process") }).await;
        assert!(failed.is_none());

        let ok = best_effort("works", async { Ok::<_, String>(7) }).await;
        assert_eq!(ok, Some(7));
    }

    #[test]
    fn test_zero_attempts_is_exhausted_without_calling() {
        let calls = AtomicU32::new(0);
        let result: Result<(), RetryError<()>> = tokio_test::block_on(fast(0).run(|_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Attempt::Pending }
        }));

        tokio_test::assert_err!(&result);
        assert_eq!(result, Err(RetryError::Exhausted { attempts: 0 }));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_best_effort_outside_runtime() {
        let value = tokio_test::block_on(best_effort("plain", async { Ok::<_, String>("up") }));
        assert_eq!(value, Some("up"));
    }
}
