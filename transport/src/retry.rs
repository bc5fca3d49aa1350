use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tokio_util::sync::CancellationToken;

use crate::error::TransportError;

/// Retries `attempt` up to `max_retries` additional times on a retryable
/// error, sleeping `base × 2^min(k,10) + jitter` between attempts where
/// `jitter ∈ [0.5·base/2, 1.0·base/2]` (spec.md §4.1). `cancel` aborts an
/// in-progress sleep and is surfaced as `TransportError::Cancelled`.
pub(crate) async fn with_retry<F, Fut>(
    max_retries: u32,
    base: Duration,
    cancel: &CancellationToken,
    mut attempt: F,
) -> Result<reqwest::Response, TransportError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<reqwest::Response, TransportError>>,
{
    let mut last_error = None;
    for k in 0..=max_retries {
        if cancel.is_cancelled() {
            return Err(TransportError::Cancelled);
        }

        match attempt().await {
            Ok(response) => {
                if response.status().is_server_error() && k < max_retries {
                    tracing::warn!(status = %response.status(), attempt = k, "retryable server error");
                } else {
                    return Ok(response);
                }
            }
            Err(error) if error.is_retryable() && k < max_retries => {
                tracing::warn!(attempt = k, error = %error, "retrying transient error");
                last_error = Some(error);
            }
            Err(error) => return Err(error),
        }

        let exponent = k.min(10);
        let backoff = base.saturating_mul(1u32 << exponent);
        let half = base / 2;
        let jitter = Duration::from_secs_f64(
            rand::thread_rng().gen_range((half.as_secs_f64() * 0.5)..=half.as_secs_f64()),
        );
        let sleep = backoff + jitter;

        tokio::select! {
            _ = tokio::time::sleep(sleep) => {}
            _ = cancel.cancelled() => return Err(TransportError::Cancelled),
        }
    }

    Err(match last_error {
        Some(error) => TransportError::RetriesExceeded { source: Box::new(error) },
        None => TransportError::Cancelled,
    })
}
