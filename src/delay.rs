//! Optional latency for mocked responses.

use std::time::Duration;
use tracing::debug;

/// Run `callback` now when `delay_ms` is 0, otherwise after `delay_ms` on a
/// spawned task. There is no cancellation; every call gets its own timer.
///
/// A non-zero delay must be scheduled from within a tokio runtime.
pub fn schedule<F>(delay_ms: u64, callback: F)
where
    F: FnOnce() + Send + 'static,
{
    if delay_ms == 0 {
        callback();
        return;
    }

    debug!(delay_ms, "Scheduling delayed completion");
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        callback();
    });
}

/// Yield `value` after `delay_ms`, or immediately for 0.
pub async fn resolve_after<T>(delay_ms: u64, value: T) -> T {
    if delay_ms > 0 {
        debug!(delay_ms, "Applying delay");
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }
    value
}
