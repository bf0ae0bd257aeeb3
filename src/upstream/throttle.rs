//! Minimum-Interval Throttle
//!
//! Spaces out calls to a rate-limited endpoint. Callers `acquire()` before
//! each request; the throttle sleeps until at least `min_interval` has passed
//! since the previous acquisition. The internal lock is held across the sleep,
//! so concurrent callers are admitted strictly one after another.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

pub struct Throttle {
    min_interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl Throttle {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last: Mutex::new(None),
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Wait for the next slot. The first call never waits.
    pub async fn acquire(&self) {
        let mut last = self.last.lock().await;

        if let Some(previous) = *last {
            let ready_at = previous + self.min_interval;
            if ready_at > Instant::now() {
                tracing::trace!(
                    wait_ms = (ready_at - Instant::now()).as_millis() as u64,
                    "Throttling upstream call"
                );
                tokio::time::sleep_until(ready_at).await;
            }
        }

        *last = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_first_acquire_is_immediate() {
        let throttle = Throttle::new(Duration::from_secs(5));
        let start = Instant::now();
        throttle.acquire().await;
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_spacing_between_calls() {
        let throttle = Throttle::new(Duration::from_millis(40));
        let start = Instant::now();

        for _ in 0..3 {
            throttle.acquire().await;
        }

        assert!(start.elapsed() >= Duration::from_millis(80));
    }

    #[tokio::test]
    async fn test_concurrent_callers_are_serialized() {
        let throttle = Arc::new(Throttle::new(Duration::from_millis(30)));
        let start = Instant::now();

        let mut handles = Vec::new();
        for _ in 0..4 {
            let throttle = Arc::clone(&throttle);
            handles.push(tokio::spawn(async move {
                throttle.acquire().await;
                Instant::now()
            }));
        }

        let mut last_admitted = start;
        for handle in handles {
            last_admitted = last_admitted.max(handle.await.unwrap());
        }

        // four callers need three full gaps
        assert!(last_admitted - start >= Duration::from_millis(90));
    }
}
