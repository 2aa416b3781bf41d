//! Bounded polling.
//!
//! Every wait in this crate is either a fixed sleep or a [`poll_until`] loop
//! with an explicit ceiling. Nothing blocks indefinitely.

use std::time::Duration;

use tokio::time::{Instant, sleep};

/// Polls `probe` every `interval` until it returns `Some`, giving up after
/// `ceiling`.
///
/// The probe runs immediately on entry, so a condition that already holds
/// costs no sleep. Returns `None` when the ceiling elapses first.
pub async fn poll_until<T, F, Fut>(interval: Duration, ceiling: Duration, mut probe: F) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<T>>,
{
    let deadline = Instant::now() + ceiling;
    loop {
        if let Some(value) = probe().await {
            return Some(value);
        }
        if Instant::now() >= deadline {
            return None;
        }
        sleep(interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_immediate_success_costs_no_sleep() {
        let start = Instant::now();
        let value = poll_until(Duration::from_millis(50), Duration::from_secs(5), || async {
            Some(7)
        })
        .await;
        assert_eq!(value, Some(7));
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_retries() {
        let calls = Arc::new(AtomicU32::new(0));
        let probe_calls = Arc::clone(&calls);
        let value = poll_until(Duration::from_millis(50), Duration::from_secs(5), move || {
            let calls = Arc::clone(&probe_calls);
            async move {
                if calls.fetch_add(1, Ordering::SeqCst) >= 3 {
                    Some("ready")
                } else {
                    None
                }
            }
        })
        .await;
        assert_eq!(value, Some("ready"));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_at_ceiling() {
        let start = Instant::now();
        let value: Option<()> =
            poll_until(Duration::from_millis(40), Duration::from_millis(200), || async {
                None
            })
            .await;
        assert_eq!(value, None);
        // Deadline check happens after the failed probe, before the sleep.
        assert!(start.elapsed() <= Duration::from_millis(240));
    }
}
