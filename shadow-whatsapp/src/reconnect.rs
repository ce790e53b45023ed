use std::time::Duration;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
pub const DEFAULT_DELAY: Duration = Duration::from_secs(5);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReconnectDecision {
    /// Try again after the delay.
    Retry { attempt: u32, delay: Duration },
    /// The session was logged out on the device; reconnecting cannot help.
    LoggedOut,
    /// The attempt budget is spent.
    GiveUp { attempts: u32 },
}

/// Bounded reconnect budget for a closed connection. A successful open resets it.
#[derive(Clone, Debug)]
pub struct ReconnectPolicy {
    max_attempts: u32,
    delay: Duration,
    attempts: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_DELAY)
    }
}

impl ReconnectPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
            attempts: 0,
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn on_open(&mut self) {
        self.attempts = 0;
    }

    pub fn on_close(&mut self, logged_out: bool) -> ReconnectDecision {
        if logged_out {
            return ReconnectDecision::LoggedOut;
        }

        self.attempts = self.attempts.saturating_add(1);
        if self.attempts <= self.max_attempts {
            ReconnectDecision::Retry {
                attempt: self.attempts,
                delay: self.delay,
            }
        } else {
            ReconnectDecision::GiveUp {
                attempts: self.max_attempts,
            }
        }
    }
}
