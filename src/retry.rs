use std::fmt;
use std::future::Future;
use std::time::Duration;

use tracing::error;

/// Bounded retry with a fixed delay between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Wait between two consecutive attempts
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(2),
        }
    }
}

#[derive(Debug)]
pub enum RetryError<E> {
    /// Every attempt failed; `last` is the error of the final one
    Exhausted { attempts: u32, last: E },
}

impl<E: fmt::Display> fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryError::Exhausted { attempts, last } => {
                write!(f, "gave up after {} attempt(s): {:#}", attempts, last)
            }
        }
    }
}

impl RetryPolicy {
    /// Run `op` until it succeeds or the attempts run out.
    ///
    /// Every failure is logged with the attempt number and `label`. The delay
    /// is only slept when another attempt follows.
    pub async fn run<F, Fut, T, E>(&self, label: &str, mut op: F) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    error!(
                        "[ERROR] Attempt {}/{} failed for {}: {:#}",
                        attempt, max_attempts, label, e
                    );

                    if attempt >= max_attempts {
                        return Err(RetryError::Exhausted {
                            attempts: attempt,
                            last: e,
                        });
                    }

                    tokio::time::sleep(self.delay).await;
                }
            }
        }
    }
}
