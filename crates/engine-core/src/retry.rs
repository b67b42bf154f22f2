use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

/// Whether an error is worth another attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDisposition {
    Retry,
    Stop,
}

/// Outcome of an operation that ran under the retry policy.
#[derive(Debug)]
pub enum RetryError<E> {
    /// The classifier ruled the error fatal; no further attempts were made.
    Fatal(E),
    /// The error was transient but the attempt budget ran out.
    AttemptsExceeded(E),
}

impl<E> RetryError<E> {
    pub fn into_inner(self) -> E {
        match self {
            RetryError::Fatal(e) | RetryError::AttemptsExceeded(e) => e,
        }
    }
}

/// Exponential-backoff retry for database reads and commits. The classifier
/// decides per error whether another attempt makes sense; everything else
/// about the policy is attempt count and delay shape.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: usize, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay: if max_delay.is_zero() {
                base_delay
            } else {
                max_delay
            },
        }
    }

    /// Preset for source reads and batch commits over the network.
    pub fn for_database() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(5),
        }
    }

    /// Single attempt, no delays. Keeps failure-path tests fast.
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO, Duration::ZERO)
    }

    pub async fn run<F, Fut, T, E, C>(&self, mut op: F, classify: C) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
        C: Fn(&E) -> RetryDisposition,
    {
        for attempt in 0..self.max_attempts {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    if classify(&err) == RetryDisposition::Stop {
                        return Err(RetryError::Fatal(err));
                    }
                    if attempt + 1 == self.max_attempts {
                        return Err(RetryError::AttemptsExceeded(err));
                    }

                    let delay = self.backoff_delay(attempt);
                    warn!(
                        attempt = attempt + 1,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis(),
                        error = %err,
                        "Transient failure, retrying"
                    );
                    sleep(delay).await;
                }
            }
        }

        unreachable!("retry loop always returns within max_attempts");
    }

    fn backoff_delay(&self, attempt: usize) -> Duration {
        if self.base_delay.is_zero() {
            return Duration::ZERO;
        }

        let factor = 1u128 << attempt.min(6);
        let delay_ms = self.base_delay.as_millis().saturating_mul(factor);
        Duration::from_millis(delay_ms.min(self.max_delay.as_millis()) as u64)
    }
}
