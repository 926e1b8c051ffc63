//! Bounded retry with randomized exponential backoff.
//!
//! Only transient provider errors are retried (timeouts, rate limits,
//! connection failures, brief outages). Everything else, and the final
//! attempt's failure, is returned to the caller unchanged. Retry state is
//! local to each call; nothing is shared across requests.

use lorebase_core::error::ProviderError;
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Maximum attempts per call, counting the first.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 6;

/// Backoff cap in seconds.
const MAX_BACKOFF_SECS: f64 = 10.0;

/// Run `operation` until it succeeds, fails terminally, or exhausts
/// `max_attempts`. Each wait is drawn uniformly from
/// `[0, min(2^attempt, cap)]` seconds.
pub async fn retry_with_backoff<T, F, Fut>(
    max_attempts: u32,
    mut operation: F,
) -> Result<T, ProviderError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    let mut attempt: u32 = 0;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && attempt + 1 < max_attempts => {
                let delay = jittered_delay(attempt);
                warn!(
                    attempt = attempt + 1,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Transient provider error, backing off"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

/// Uniform random delay in `[0, min(2^attempt, cap)]` seconds.
fn jittered_delay(attempt: u32) -> Duration {
    let ceiling = 2f64.powi(attempt as i32).min(MAX_BACKOFF_SECS);
    let secs = rand::thread_rng().gen_range(0.0..=ceiling);
    Duration::from_secs_f64(secs)
}
