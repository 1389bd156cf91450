//! Single retry for read-then-act sequences that lost a constraint race.

use std::future::Future;

use interactions_common::{AppError, AppResult};

/// Run `attempt`, re-running it once if it fails with [`AppError::Conflict`].
///
/// Each attempt must start its own transaction so the second run re-reads
/// committed state. A second conflict is surfaced to the caller.
pub(crate) async fn retry_on_conflict<T, F, Fut>(
    operation: &'static str,
    mut attempt: F,
) -> AppResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    match attempt().await {
        Err(AppError::Conflict(reason)) => {
            tracing::debug!(operation, reason = %reason, "Lost a write race, retrying once");
            attempt().await
        }
        other => other,
    }
}
