use std::time::Duration;

use crate::config::{
    LESSONS_PREMIUM_SYNC_ATTEMPTS, LESSONS_PREMIUM_SYNC_DELAY, LESSONS_PREMIUM_SYNC_ON_EXHAUSTED,
    LESSONS_REVALIDATE_ON_START, LESSONS_STORE_KEY_PREFIX,
};

/// What a retry-refresh reports when every attempt ran without the
/// predicate being satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExhaustedBehavior {
    /// Report the wait as still pending; the caller keeps showing progress.
    #[default]
    KeepPending,
    /// Report the wait as failed; the caller shows an explicit error.
    ReportFailure,
}

impl ExhaustedBehavior {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(Self::KeepPending),
            "failed" | "failure" => Some(Self::ReportFailure),
            _ => None,
        }
    }
}

/// Fixed-delay, fixed-ceiling schedule for repeated refreshes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of refreshes, the first one included. Zero is treated as one.
    pub attempts: u32,
    /// Pause between two attempts.
    pub delay: Duration,
    pub on_exhausted: ExhaustedBehavior,
}

impl RetryPolicy {
    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self {
            attempts,
            delay,
            on_exhausted: ExhaustedBehavior::default(),
        }
    }

    pub fn with_exhausted_behavior(mut self, on_exhausted: ExhaustedBehavior) -> Self {
        self.on_exhausted = on_exhausted;
        self
    }

    /// Schedule used after returning from the payment provider, from
    /// `LESSONS_PREMIUM_SYNC_*`.
    pub fn premium_sync() -> Self {
        let on_exhausted = ExhaustedBehavior::parse(LESSONS_PREMIUM_SYNC_ON_EXHAUSTED.as_str())
            .unwrap_or_else(|| {
                tracing::warn!(
                    "Unknown LESSONS_PREMIUM_SYNC_ON_EXHAUSTED value '{}', using 'pending'",
                    LESSONS_PREMIUM_SYNC_ON_EXHAUSTED.as_str()
                );
                ExhaustedBehavior::KeepPending
            });

        Self::new(*LESSONS_PREMIUM_SYNC_ATTEMPTS, *LESSONS_PREMIUM_SYNC_DELAY)
            .with_exhausted_behavior(on_exhausted)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(5, Duration::from_millis(2000))
    }
}

/// Settings of one session manager instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Namespace of the token and user keys in the persistent store.
    pub store_key_prefix: String,
    /// Re-validate a restored session against the backend right away.
    pub revalidate_on_start: bool,
    pub premium_sync: RetryPolicy,
}

impl SessionConfig {
    pub fn from_env() -> Self {
        Self {
            store_key_prefix: LESSONS_STORE_KEY_PREFIX.to_string(),
            revalidate_on_start: *LESSONS_REVALIDATE_ON_START,
            premium_sync: RetryPolicy::premium_sync(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            store_key_prefix: "lessons".to_string(),
            revalidate_on_start: true,
            premium_sync: RetryPolicy::default(),
        }
    }
}
