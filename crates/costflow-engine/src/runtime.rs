//! Runtime patterns shared by the run coordinator: retry with bounded
//! exponential backoff, and cooperative run cancellation.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Notify;

/// Configuration for retrying a transient I/O failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
    /// Multiplier applied to the delay after each failed attempt.
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Computes the delay to wait before the given retry attempt
    /// (`0` = the first retry, after the initial failed call).
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base_ms = self.initial_delay.as_millis() as f64 * self.backoff_multiplier.powi(attempt as i32);
        let capped_ms = base_ms.min(self.max_delay.as_millis() as f64);
        Duration::from_millis(capped_ms as u64)
    }

    /// Executes `f`, retrying on `Err` up to `max_attempts` times with
    /// exponential backoff between attempts.
    ///
    /// # Errors
    ///
    /// Returns the last error once attempts are exhausted.
    pub async fn execute<F, Fut, T, E>(&self, mut f: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let mut attempt = 0;
        loop {
            match f().await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    attempt += 1;
                    if attempt >= self.max_attempts {
                        tracing::warn!(
                            attempt,
                            max_attempts = self.max_attempts,
                            error = %e,
                            "retry attempts exhausted"
                        );
                        return Err(e);
                    }
                    let delay = self.delay_for_attempt(attempt - 1);
                    tracing::debug!(attempt, delay_ms = delay.as_millis() as u64, error = %e, "retrying after transient failure");
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

/// A cooperative cancellation signal shared across a run's day-tasks.
///
/// Cancelling promptly stops dispatch of new daily tasks; in-flight tasks
/// observe cancellation at their next repository I/O boundary and abort
/// there rather than mid-computation.
#[derive(Clone)]
pub struct RunCancellation {
    flag: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl RunCancellation {
    /// Creates a new, not-yet-cancelled signal.
    #[must_use]
    pub fn new() -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            notify: Arc::new(Notify::new()),
        }
    }

    /// Requests cancellation. Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    /// Returns `true` if cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Resolves once cancellation has been requested. Callers typically
    /// race this against their own I/O future.
    pub async fn cancelled(&self) {
        if self.is_cancelled() {
            return;
        }
        self.notify.notified().await;
    }
}

impl Default for RunCancellation {
    fn default() -> Self {
        Self::new()
    }
}
