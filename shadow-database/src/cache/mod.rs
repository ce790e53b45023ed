mod window;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

pub use window::{BucketStatus, RateLimitDecision, RateLimitPolicy};
use window::Bucket;

/// In-process store of fixed-window rate-limit buckets. Buckets are never
/// persisted; a restart starts every key fresh.
#[derive(Clone, Debug)]
pub struct CacheService {
    key_prefix: String,
    buckets: Arc<Mutex<HashMap<String, Bucket>>>,
}

impl CacheService {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            key_prefix: prefix.into(),
            buckets: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn key(&self, suffix: impl AsRef<str>) -> String {
        format!("{}:{}", self.key_prefix, suffix.as_ref())
    }

    fn buckets(&self) -> MutexGuard<'_, HashMap<String, Bucket>> {
        self.buckets.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn consume(&self, key: &str, policy: RateLimitPolicy) -> RateLimitDecision {
        self.consume_at(key, policy, Instant::now())
    }

    pub fn consume_at(&self, key: &str, policy: RateLimitPolicy, now: Instant) -> RateLimitDecision {
        let mut buckets = self.buckets();
        let bucket = buckets
            .entry(key.to_owned())
            .or_insert_with(|| Bucket::new(now, policy.window));
        bucket.consume(policy, now)
    }

    pub fn get(&self, key: &str, policy: RateLimitPolicy) -> Option<BucketStatus> {
        self.get_at(key, policy, Instant::now())
    }

    pub fn get_at(&self, key: &str, policy: RateLimitPolicy, now: Instant) -> Option<BucketStatus> {
        self.buckets()
            .get(key)
            .and_then(|bucket| bucket.status(policy, now))
    }

    pub fn delete(&self, key: &str) -> bool {
        self.buckets().remove(key).is_some()
    }

    /// Drop every bucket whose window and block have both run out.
    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(Instant::now())
    }

    pub fn purge_expired_at(&self, now: Instant) -> usize {
        let mut buckets = self.buckets();
        let before = buckets.len();
        buckets.retain(|_, bucket| !bucket.is_expired(now));
        before - buckets.len()
    }

    pub fn len(&self) -> usize {
        self.buckets().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub fn duration_secs_ceil(duration: Duration) -> u64 {
    let secs = duration.as_secs();
    if duration.subsec_nanos() > 0 {
        secs + 1
    } else {
        secs
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::{CacheService, RateLimitPolicy, duration_secs_ceil};

    const POLICY: RateLimitPolicy = RateLimitPolicy {
        max_hits: 2,
        window: Duration::from_secs(10),
        block: Duration::from_secs(30),
    };

    #[test]
    fn keys_are_prefixed() {
        let cache = CacheService::new("shadow");
        assert_eq!(cache.key("cmd:1"), "shadow:cmd:1");
    }

    #[test]
    fn keys_are_independent() {
        let cache = CacheService::new("test");
        let now = Instant::now();

        assert!(cache.consume_at("a", POLICY, now).allowed);
        assert!(cache.consume_at("a", POLICY, now).allowed);
        assert!(!cache.consume_at("a", POLICY, now).allowed);
        assert!(cache.consume_at("b", POLICY, now).allowed);
    }

    #[test]
    fn delete_resets_a_key() {
        let cache = CacheService::new("test");
        let now = Instant::now();
        for _ in 0..3 {
            cache.consume_at("a", POLICY, now);
        }

        assert!(cache.delete("a"));
        assert!(!cache.delete("a"));
        assert!(cache.get_at("a", POLICY, now).is_none());
        assert!(cache.consume_at("a", POLICY, now).allowed);
    }

    #[test]
    fn purge_keeps_live_and_blocked_buckets() {
        let cache = CacheService::new("test");
        let now = Instant::now();

        cache.consume_at("idle", POLICY, now);
        for _ in 0..3 {
            cache.consume_at("blocked", POLICY, now);
        }
        cache.consume_at("fresh", POLICY, now + Duration::from_secs(15));

        assert_eq!(cache.purge_expired_at(now + Duration::from_secs(20)), 1);
        assert_eq!(cache.len(), 2);

        assert_eq!(cache.purge_expired_at(now + Duration::from_secs(60)), 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn rounds_partial_seconds_up() {
        assert_eq!(duration_secs_ceil(Duration::from_millis(1500)), 2);
        assert_eq!(duration_secs_ceil(Duration::from_secs(3)), 3);
        assert_eq!(duration_secs_ceil(Duration::ZERO), 0);
    }
}
