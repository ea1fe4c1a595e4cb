//! Pacing of consecutive remote calls

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use crate::config::RateLimitConfig;

/// Decides when the next remote call may start.
pub trait RateLimit {
    /// Waits until one more call is allowed.
    fn acquire(&mut self) -> impl Future<Output = ()> + Send;
}

/// At most one call per `interval`. The first call never waits.
#[derive(Debug, Clone)]
pub struct FixedInterval {
    interval: Duration,
    last: Option<Instant>,
}

impl FixedInterval {
    #[must_use]
    pub const fn new(interval: Duration) -> Self {
        Self { interval, last: None }
    }
}

impl RateLimit for FixedInterval {
    async fn acquire(&mut self) {
        if let Some(last) = self.last {
            tokio::time::sleep_until(last + self.interval).await;
        }
        self.last = Some(Instant::now());
    }
}

/// Allows bursts of `capacity` calls, regaining one token per `refill_interval`.
#[derive(Debug, Clone)]
pub struct TokenBucket {
    capacity: u32,
    tokens: u32,
    refill_interval: Duration,
    last_refill: Instant,
}

impl TokenBucket {
    #[must_use]
    pub fn new(capacity: u32, refill_interval: Duration) -> Self {
        let capacity = capacity.max(1);
        Self { capacity, tokens: capacity, refill_interval, last_refill: Instant::now() }
    }

    fn refill(&mut self, now: Instant) {
        if self.refill_interval.is_zero() {
            self.tokens = self.capacity;
            self.last_refill = now;
            return;
        }

        let elapsed = now.saturating_duration_since(self.last_refill);
        let earned = u32::try_from(elapsed.as_nanos() / self.refill_interval.as_nanos())
            .unwrap_or(u32::MAX);
        if earned == 0 {
            return;
        }

        self.tokens = self.tokens.saturating_add(earned).min(self.capacity);
        self.last_refill = if self.tokens == self.capacity {
            now
        } else {
            self.last_refill + self.refill_interval.saturating_mul(earned)
        };
    }
}

impl RateLimit for TokenBucket {
    async fn acquire(&mut self) {
        self.refill(Instant::now());
        if self.tokens == 0 {
            tokio::time::sleep_until(self.last_refill + self.refill_interval).await;
            self.refill(Instant::now());
        }
        self.tokens = self.tokens.saturating_sub(1);
    }
}

/// The policy selected in `markup.rateLimit`.
#[derive(Debug, Clone)]
pub enum ConfiguredRateLimit {
    FixedInterval(FixedInterval),
    TokenBucket(TokenBucket),
}

impl From<RateLimitConfig> for ConfiguredRateLimit {
    fn from(config: RateLimitConfig) -> Self {
        match config {
            RateLimitConfig::FixedInterval { interval_ms } => {
                Self::FixedInterval(FixedInterval::new(Duration::from_millis(interval_ms)))
            }
            RateLimitConfig::TokenBucket { capacity, refill_interval_ms } => Self::TokenBucket(
                TokenBucket::new(capacity, Duration::from_millis(refill_interval_ms)),
            ),
        }
    }
}

impl RateLimit for ConfiguredRateLimit {
    async fn acquire(&mut self) {
        match self {
            Self::FixedInterval(limit) => limit.acquire().await,
            Self::TokenBucket(limit) => limit.acquire().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_fixed_interval_spaces_calls() {
        let mut limit = FixedInterval::new(Duration::from_millis(100));
        let start = Instant::now();

        limit.acquire().await;
        assert_eq!(start.elapsed(), Duration::ZERO);

        limit.acquire().await;
        limit.acquire().await;
        assert!(start.elapsed() >= Duration::from_millis(200));
    }

    #[tokio::test(start_paused = true)]
    async fn test_token_bucket_allows_burst_then_waits() {
        let mut limit = TokenBucket::new(2, Duration::from_millis(100));
        let start = Instant::now();

        limit.acquire().await;
        limit.acquire().await;
        assert_eq!(start.elapsed(), Duration::ZERO);

        limit.acquire().await;
        assert!(start.elapsed() >= Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_token_bucket_refills_while_idle() {
        let mut limit = TokenBucket::new(2, Duration::from_millis(50));
        limit.acquire().await;
        limit.acquire().await;

        tokio::time::sleep(Duration::from_millis(500)).await;
        let resumed = Instant::now();
        limit.acquire().await;
        limit.acquire().await;

        assert_eq!(resumed.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_configured_rate_limit_from_config() {
        let mut limit =
            ConfiguredRateLimit::from(RateLimitConfig::FixedInterval { interval_ms: 0 });
        let start = Instant::now();

        for _ in 0..5 {
            limit.acquire().await;
        }

        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
