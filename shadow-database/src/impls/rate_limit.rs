use tracing::{debug, warn};

use crate::{
    cache::{CacheService, duration_secs_ceil},
    database::Database,
    model::rate_limit::{
        LimitCheck, LimitKind, LimitUsage, RateLimitSettings, UserLimitStatus, is_heavy_command,
    },
};

fn limit_key(cache: &CacheService, kind: LimitKind, identity: &str) -> String {
    cache.key(format!("{}:{identity}", kind.key_segment()))
}

fn consume(
    db: &Database,
    settings: &RateLimitSettings,
    kind: LimitKind,
    identity: &str,
) -> LimitCheck {
    let cache = db.cache();
    let key = limit_key(cache, kind, identity);
    let decision = cache.consume(&key, settings.policy(kind));

    LimitCheck {
        kind,
        allowed: decision.allowed,
        remaining: decision.remaining,
        retry_after_secs: if decision.allowed {
            0
        } else {
            duration_secs_ceil(decision.retry_after).max(1)
        },
    }
}

/// Charge a command against the heavy or normal bucket of `identity`.
pub fn check_command_limit(
    db: &Database,
    settings: &RateLimitSettings,
    identity: &str,
    command: &str,
) -> LimitCheck {
    let kind = if is_heavy_command(command) {
        LimitKind::Heavy
    } else {
        LimitKind::Command
    };

    let check = consume(db, settings, kind, identity);
    if !check.allowed {
        warn!(user = %identity, command, retry_after = check.retry_after_secs, "command rate limited");
    }
    check
}

pub fn check_message_limit(db: &Database, settings: &RateLimitSettings, identity: &str) -> LimitCheck {
    let check = consume(db, settings, LimitKind::Message, identity);
    if !check.allowed {
        warn!(user = %identity, retry_after = check.retry_after_secs, "message rate limited");
    }
    check
}

/// Forget every bucket of `identity`. Returns how many existed.
pub fn reset_user_limits(db: &Database, identity: &str) -> usize {
    let cache = db.cache();
    let removed = LimitKind::ALL
        .into_iter()
        .filter(|kind| cache.delete(&limit_key(cache, *kind, identity)))
        .count();

    debug!(user = %identity, removed, "rate limits reset");
    removed
}

pub fn user_limit_status(db: &Database, settings: &RateLimitSettings, identity: &str) -> UserLimitStatus {
    let cache = db.cache();
    let usage = |kind: LimitKind| {
        let policy = settings.policy(kind);
        LimitUsage::from_status(cache.get(&limit_key(cache, kind, identity), policy), policy)
    };

    UserLimitStatus {
        commands: usage(LimitKind::Command),
        heavy_commands: usage(LimitKind::Heavy),
        messages: usage(LimitKind::Message),
    }
}

pub fn purge_expired_limits(db: &Database) -> usize {
    db.cache().purge_expired()
}
