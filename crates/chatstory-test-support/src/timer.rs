//! Test timers: deterministic `Timer` implementations for tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chatstory_core::timer::Timer;
use tokio::sync::Semaphore;

/// A timer that completes every sleep immediately (after yielding once) and
/// records the requested durations in order.
#[derive(Debug, Default)]
pub struct InstantTimer {
    requested: Mutex<Vec<Duration>>,
}

impl InstantTimer {
    /// Create a new instant timer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of every duration requested so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn requested(&self) -> Vec<Duration> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl Timer for InstantTimer {
    async fn sleep(&self, duration: Duration) {
        self.requested.lock().unwrap().push(duration);
        tokio::task::yield_now().await;
    }
}

/// A timer whose sleeps never complete on their own. Each call to
/// [`ManualTimer::release`] lets one pending (or future) sleep finish.
#[derive(Debug)]
pub struct ManualTimer {
    permits: Semaphore,
    waiting: AtomicUsize,
}

impl ManualTimer {
    /// Create a new manual timer with nothing released.
    #[must_use]
    pub fn new() -> Self {
        Self {
            permits: Semaphore::new(0),
            waiting: AtomicUsize::new(0),
        }
    }

    /// Allows `count` sleeps to complete.
    pub fn release(&self, count: usize) {
        self.permits.add_permits(count);
    }

    /// Number of sleeps currently blocked.
    pub fn waiting(&self) -> usize {
        self.waiting.load(Ordering::SeqCst)
    }
}

impl Default for ManualTimer {
    fn default() -> Self {
        Self::new()
    }
}

/// Decrements the waiting count even when the sleep future is dropped.
struct WaitGuard<'a>(&'a AtomicUsize);

impl Drop for WaitGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Timer for ManualTimer {
    async fn sleep(&self, _duration: Duration) {
        self.waiting.fetch_add(1, Ordering::SeqCst);
        let _guard = WaitGuard(&self.waiting);
        if let Ok(permit) = self.permits.acquire().await {
            permit.forget();
        }
    }
}
