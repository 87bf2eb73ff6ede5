//! Exponential backoff for git commands that lose the race for `index.lock`.

use std::future::Future;
use std::time::Duration;

use backoff::ExponentialBackoff;
use backoff::backoff::Backoff;
use tracing::debug;

use crate::error::GitError;

/// Configuration: 3 total attempts, base 100ms, max 2s.
pub const MAX_ATTEMPTS: u32 = 3;
const INITIAL_INTERVAL_MS: u64 = 100;
const MAX_INTERVAL_MS: u64 = 2_000;

/// Retry a git operation while it fails on index lock contention.
///
/// Any other error is returned immediately. When every attempt hits the lock,
/// the last error is wrapped in [`GitError::RetriesExhausted`].
pub async fn retry_on_lock<T, Fut, F>(mut attempt: F) -> Result<T, GitError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, GitError>>,
{
    let mut backoff = ExponentialBackoff {
        initial_interval: Duration::from_millis(INITIAL_INTERVAL_MS),
        max_interval: Duration::from_millis(MAX_INTERVAL_MS),
        max_elapsed_time: None,
        ..Default::default()
    };

    let mut attempts = 0;
    loop {
        attempts += 1;

        match attempt().await {
            Ok(value) => return Ok(value),
            Err(e) if !e.is_lock_contention() => return Err(e),
            Err(e) if attempts >= MAX_ATTEMPTS => {
                return Err(GitError::RetriesExhausted(Box::new(e)));
            }
            Err(e) => {
                debug!("git index is locked (attempt {}): {}", attempts, e);
                if let Some(wait_duration) = backoff.next_backoff() {
                    tokio::time::sleep(wait_duration).await;
                }
            }
        }
    }
}
