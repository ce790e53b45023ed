use std::time::Duration;

use crate::cache::{BucketStatus, RateLimitPolicy};

/// Commands charged against the heavy bucket instead of the normal one.
pub const HEAVY_COMMANDS: [&str; 5] = [
    "تحويل_صوت",
    "تحويل_فيديو",
    "تحميل_يوتيوب",
    "بحث_صور",
    "ذكاء_اصطناعي",
];

pub fn is_heavy_command(name: &str) -> bool {
    HEAVY_COMMANDS.contains(&name)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LimitKind {
    Command,
    Heavy,
    Message,
}

impl LimitKind {
    pub const ALL: [LimitKind; 3] = [Self::Command, Self::Heavy, Self::Message];

    pub fn key_segment(self) -> &'static str {
        match self {
            Self::Command => "cmd",
            Self::Heavy => "heavy",
            Self::Message => "msg",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RateLimitSettings {
    pub command: RateLimitPolicy,
    pub heavy: RateLimitPolicy,
    pub message: RateLimitPolicy,
}

impl RateLimitSettings {
    pub fn policy(&self, kind: LimitKind) -> RateLimitPolicy {
        match kind {
            LimitKind::Command => self.command,
            LimitKind::Heavy => self.heavy,
            LimitKind::Message => self.message,
        }
    }
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            command: RateLimitPolicy {
                max_hits: 30,
                window: Duration::from_secs(60),
                block: Duration::from_secs(60),
            },
            heavy: RateLimitPolicy {
                max_hits: 5,
                window: Duration::from_secs(300),
                block: Duration::from_secs(300),
            },
            message: RateLimitPolicy {
                max_hits: 100,
                window: Duration::from_secs(60),
                block: Duration::from_secs(30),
            },
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LimitCheck {
    pub kind: LimitKind,
    pub allowed: bool,
    pub remaining: u32,
    /// Whole seconds to wait, at least 1 when denied.
    pub retry_after_secs: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LimitUsage {
    pub used: u32,
    pub remaining: u32,
    pub resets_in: Duration,
}

impl LimitUsage {
    pub(crate) fn from_status(status: Option<BucketStatus>, policy: RateLimitPolicy) -> Self {
        match status {
            Some(status) => Self {
                used: status.hits,
                remaining: status.remaining,
                resets_in: status.resets_in,
            },
            None => Self {
                used: 0,
                remaining: policy.max_hits,
                resets_in: Duration::ZERO,
            },
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UserLimitStatus {
    pub commands: LimitUsage,
    pub heavy_commands: LimitUsage,
    pub messages: LimitUsage,
}
