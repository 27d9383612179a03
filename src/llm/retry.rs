//! Retry with exponential backoff and jitter for upstream completion calls.

use std::future::Future;
use std::time::Duration;
use log::warn;

use super::chat::ChatError;

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, the first one included. `1` disables retrying.
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(10),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    pub fn no_retry() -> Self {
        Self { max_attempts: 1, ..Self::default() }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub async fn execute<F, Fut, T>(&self, mut operation: F) -> Result<T, ChatError>
        where F: FnMut() -> Fut, Fut: Future<Output = Result<T, ChatError>>
    {
        let attempts = self.max_attempts.max(1);
        let mut backoff = self.initial_backoff;
        let mut attempt = 0;

        loop {
            attempt += 1;
            match operation().await {
                Ok(value) => {
                    return Ok(value);
                }
                Err(e) if e.is_retryable() && attempt < attempts => {
                    warn!("Completion attempt {}/{} failed, retrying: {}", attempt, attempts, e);

                    // 75%..125% of the nominal backoff
                    let jitter = 0.75 + rand_factor() * 0.5;
                    tokio::time::sleep(Duration::from_secs_f64(backoff.as_secs_f64() * jitter)).await;

                    backoff = Duration::from_secs_f64(
                        (backoff.as_secs_f64() * self.multiplier).min(self.max_backoff.as_secs_f64())
                    );
                }
                Err(e) => {
                    return Err(e);
                }
            }
        }
    }
}

fn rand_factor() -> f64 {
    (uuid::Uuid::new_v4().as_u128() % 10_000) as f64 / 10_000.0
}
