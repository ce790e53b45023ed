use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub max_hits: u32,
    pub window: Duration,
    /// How long a key stays rejected once it goes over the limit.
    pub block: Duration,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub hits: u32,
    pub remaining: u32,
    /// Time until the next hit can succeed. Zero when allowed.
    pub retry_after: Duration,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BucketStatus {
    pub hits: u32,
    pub remaining: u32,
    pub resets_in: Duration,
    pub blocked: bool,
}

#[derive(Clone, Debug)]
pub(crate) struct Bucket {
    window_start: Instant,
    window: Duration,
    hits: u32,
    blocked_until: Option<Instant>,
}

impl Bucket {
    pub(crate) fn new(now: Instant, window: Duration) -> Self {
        Self {
            window_start: now,
            window,
            hits: 0,
            blocked_until: None,
        }
    }

    fn window_end(&self) -> Instant {
        self.window_start + self.window
    }

    fn blocked_for(&self, now: Instant) -> Option<Duration> {
        self.blocked_until
            .filter(|until| *until > now)
            .map(|until| until - now)
    }

    pub(crate) fn consume(&mut self, policy: RateLimitPolicy, now: Instant) -> RateLimitDecision {
        if let Some(wait) = self.blocked_for(now) {
            return RateLimitDecision {
                allowed: false,
                hits: self.hits,
                remaining: 0,
                retry_after: wait,
            };
        }

        if self.blocked_until.is_some() || now >= self.window_end() {
            self.window_start = now;
            self.window = policy.window;
            self.hits = 0;
            self.blocked_until = None;
        }

        self.hits = self.hits.saturating_add(1);
        if self.hits <= policy.max_hits {
            return RateLimitDecision {
                allowed: true,
                hits: self.hits,
                remaining: policy.max_hits - self.hits,
                retry_after: Duration::ZERO,
            };
        }

        let retry_after = if policy.block.is_zero() {
            self.window_end().saturating_duration_since(now)
        } else {
            self.blocked_until = Some(now + policy.block);
            policy.block
        };

        RateLimitDecision {
            allowed: false,
            hits: self.hits,
            remaining: 0,
            retry_after,
        }
    }

    /// `None` once the window has lapsed without a live block.
    pub(crate) fn status(&self, policy: RateLimitPolicy, now: Instant) -> Option<BucketStatus> {
        if let Some(wait) = self.blocked_for(now) {
            return Some(BucketStatus {
                hits: self.hits,
                remaining: 0,
                resets_in: wait,
                blocked: true,
            });
        }

        if self.is_expired(now) {
            return None;
        }

        Some(BucketStatus {
            hits: self.hits,
            remaining: policy.max_hits.saturating_sub(self.hits),
            resets_in: self.window_end().saturating_duration_since(now),
            blocked: false,
        })
    }

    pub(crate) fn is_expired(&self, now: Instant) -> bool {
        match self.blocked_until {
            Some(until) => until <= now,
            None => now >= self.window_end(),
        }
    }
}
