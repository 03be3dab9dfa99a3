//! Outbound request limiter shared by every caller of a client.
//!
//! Caps the number of requests in flight and spaces dispatches at least
//! `min_interval` apart, across all tasks holding a clone of the limiter.

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::Instant;

pub const DEFAULT_MAX_CONCURRENT: usize = 5;
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(200);

#[derive(Debug, Clone)]
pub struct RateLimiter {
    permits: Arc<Semaphore>,
    min_interval: Duration,
    next_slot: Arc<Mutex<Option<Instant>>>,
    max_concurrent: usize,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONCURRENT, DEFAULT_MIN_INTERVAL)
    }
}

impl RateLimiter {
    pub fn new(max_concurrent: usize, min_interval: Duration) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self {
            permits: Arc::new(Semaphore::new(max_concurrent)),
            min_interval,
            next_slot: Arc::new(Mutex::new(None)),
            max_concurrent,
        }
    }

    /// Keeps the concurrency cap but drops the spacing between dispatches.
    pub fn unthrottled(max_concurrent: usize) -> Self {
        Self::new(max_concurrent, Duration::ZERO)
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Runs `task` once a concurrency permit and a dispatch slot are available.
    pub async fn run<F, T>(&self, task: F) -> T
    where
        F: Future<Output = T>,
    {
        // The semaphore is never closed, so acquire only fails if that changes.
        let _permit = self.permits.acquire().await.ok();

        let slot = self.reserve_slot();
        tokio::time::sleep_until(slot).await;

        task.await
    }

    fn reserve_slot(&self) -> Instant {
        let now = Instant::now();
        let mut next = self
            .next_slot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let slot = match *next {
            Some(reserved) if reserved > now => reserved,
            _ => now,
        };
        *next = Some(slot + self.min_interval);
        slot
    }
}
