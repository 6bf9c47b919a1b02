use std::future::Future;
use std::time::Duration;

/// Minimum spacing between consecutive calls to one provider.
///
/// The delay is applied after the wrapped operation finishes, whether it
/// succeeded or not. A zero delay disables throttling.
#[derive(Debug, Clone, Copy)]
pub struct RateLimiter {
    delay: Duration,
}

impl RateLimiter {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn from_millis(millis: u64) -> Self {
        Self::new(Duration::from_millis(millis))
    }

    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn is_enabled(&self) -> bool {
        !self.delay.is_zero()
    }

    /// Run `operation`, then hold the caller for the configured delay.
    pub async fn throttle<F, Fut, T>(&self, operation: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let result = operation().await;
        if self.is_enabled() {
            tracing::debug!(
                "Rate limiter: waiting {}ms before next provider call",
                self.delay.as_millis()
            );
            tokio::time::sleep(self.delay).await;
        }
        result
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::from_millis(100)
    }
}
