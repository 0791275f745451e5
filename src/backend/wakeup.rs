//! Backend wakeup: bounded-retry readiness gate used at startup.
//!
//! The hosted backend cold-starts, so the first request after idle can take
//! a while. The shell polls the liveness endpoint before unblocking the UI,
//! but proceeds regardless once the attempt budget is spent: an unreachable
//! backend degrades the experience, it does not gate the app.

use std::time::Duration;

use super::BackendClient;
use crate::config;

/// Poll `/healthz` with the default budget (60 attempts, 3 s apart).
///
/// Returns `true` as soon as the backend responds, `false` when the budget
/// is exhausted. Callers should proceed either way.
pub async fn wait_for_backend(client: &BackendClient) -> bool {
    wait_for_backend_with(
        client,
        config::WAKEUP_MAX_ATTEMPTS,
        config::WAKEUP_POLL_INTERVAL,
    )
    .await
}

/// Poll `/healthz` with an explicit attempt budget and spacing.
pub async fn wait_for_backend_with(
    client: &BackendClient,
    max_attempts: u32,
    interval: Duration,
) -> bool {
    for attempt in 1..=max_attempts {
        if client.health_check().await {
            tracing::info!(attempt, "Backend is awake");
            return true;
        }
        if attempt < max_attempts {
            tokio::time::sleep(interval).await;
        }
    }

    tracing::warn!(
        max_attempts,
        "Backend did not wake up in time, proceeding anyway"
    );
    false
}
