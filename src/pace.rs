use std::time::Duration;

use async_trait::async_trait;

/// Cooperative pacing between externally-mutating calls. Calls are strictly
/// sequential within a run; this is a fixed pause, not a token bucket.
#[async_trait]
pub trait Pacer: Send + Sync {
    async fn pace(&self);
}

/// Sleep a fixed interval after each paced call.
pub struct FixedDelay {
    interval: Duration,
}

impl FixedDelay {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }
}

#[async_trait]
impl Pacer for FixedDelay {
    async fn pace(&self) {
        tokio::time::sleep(self.interval).await;
    }
}

/// No pacing, for tests.
pub struct NoDelay;

#[async_trait]
impl Pacer for NoDelay {
    async fn pace(&self) {}
}
