//! # Scheduler Configuration

use std::env;
use std::time::Duration;

use rand::Rng;

/// Prefix of the per-entity import gate counter.
pub const DEFAULT_IMPORT_KEY_PREFIX: &str = "import__";

/// Exponential backoff with full jitter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Delay ceiling before jitter for the first retry.
    pub base: Duration,
    /// Upper bound on any single delay.
    pub cap: Duration,
    /// Retries after the first attempt.
    pub max_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base: Duration::from_secs(1),
            cap: Duration::from_secs(600),
            max_retries: 4,
        }
    }
}

impl RetryPolicy {
    /// Ceiling for retry number `retry` (0-based): `min(cap, base * 2^retry)`.
    pub fn ceiling(&self, retry: u32) -> Duration {
        let factor = 1u32.checked_shl(retry).unwrap_or(u32::MAX);
        self.base.saturating_mul(factor).min(self.cap)
    }

    /// Delay before retry number `retry`, uniform in `[0, ceiling]`.
    pub fn delay<R: Rng + ?Sized>(&self, retry: u32, rng: &mut R) -> Duration {
        let ceiling = self.ceiling(retry);
        if ceiling.is_zero() {
            return ceiling;
        }
        Duration::from_millis(rng.gen_range(0..=ceiling.as_millis() as u64))
    }

    /// No waiting between attempts. Used by tests.
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            base: Duration::ZERO,
            cap: Duration::ZERO,
            max_retries,
        }
    }
}

/// Configuration for the update scheduler.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Number of worker tasks pulling from the queue.
    pub worker_count: usize,
    /// Import retry policy.
    pub retry: RetryPolicy,
    /// Counter key prefix for the import gate.
    pub import_key_prefix: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            worker_count: 4,
            retry: RetryPolicy::default(),
            import_key_prefix: DEFAULT_IMPORT_KEY_PREFIX.to_string(),
        }
    }
}

impl SchedulerConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `KG_WORKERS`: Worker task count (default: 4)
    /// - `KG_IMPORT_MAX_RETRIES`: Import retries after the first attempt (default: 4)
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(workers) = env::var("KG_WORKERS").ok().and_then(|v| v.parse().ok()) {
            config.worker_count = workers;
        }
        if let Some(retries) = env::var("KG_IMPORT_MAX_RETRIES")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.retry.max_retries = retries;
        }
        config
    }

    /// Gate counter key for an entity.
    pub fn import_key(&self, entity: &str) -> String {
        format!("{}{}", self.import_key_prefix, entity)
    }
}
