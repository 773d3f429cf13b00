//! Timer abstraction used by playback to wait between stages.
//!
//! Playback never reads the clock to decide when to proceed; it asks a
//! `Timer` to sleep. Tests substitute timers that return immediately or
//! block until released.

use std::time::Duration;

use async_trait::async_trait;

/// Asynchronous sleep primitive.
///
/// Implementations must be cancel-safe: dropping the returned future before
/// it completes releases the underlying timer.
#[async_trait]
pub trait Timer: Send + Sync {
    /// Completes once `duration` has elapsed.
    async fn sleep(&self, duration: Duration);
}

/// Production timer backed by the Tokio time driver.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioTimer;

#[async_trait]
impl Timer for TokioTimer {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
