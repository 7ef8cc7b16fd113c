//! # Bounded Read Retry
//!
//! Retry helper for idempotent API reads (catalog, sale history,
//! reference data). Writes never come through here: the submission
//! protocol forbids silent replays of a sale POST.
//!
//! ## Policy
//! - at most [`MAX_READ_RETRIES`] retries after the first attempt
//! - exponential backoff with jitter between attempts
//! - auth failures (401/403) are returned immediately, never retried

use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use serde_json::Value;
use std::time::Duration;
use tracing::warn;

use crate::error::EngineResult;
use crate::ports::{ApiClient, RequestOptions};

/// Retries after the first attempt: three requests total, then the
/// caller falls back to whatever it has.
pub const MAX_READ_RETRIES: u32 = 2;

fn read_backoff() -> ExponentialBackoff {
    ExponentialBackoff {
        initial_interval: Duration::from_millis(300),
        max_interval: Duration::from_secs(5),
        max_elapsed_time: None,
        ..ExponentialBackoff::default()
    }
}

/// GET with bounded retry, returning the response body.
pub async fn get_with_retry(
    api: &dyn ApiClient,
    path: &str,
    options: RequestOptions,
) -> EngineResult<Value> {
    let mut backoff = read_backoff();
    let mut attempt: u32 = 0;

    loop {
        match api.get(path, options.clone()).await {
            Ok(response) => return Ok(response.data),
            Err(failure) => {
                if !failure.is_retryable() || attempt >= MAX_READ_RETRIES {
                    return Err(failure.into());
                }
                attempt += 1;
                let delay = backoff
                    .next_backoff()
                    .unwrap_or_else(|| Duration::from_secs(1));
                warn!(
                    path,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %failure,
                    "API read failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
