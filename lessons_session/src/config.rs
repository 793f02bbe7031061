//! Central configuration for the lessons_session crate

use std::sync::LazyLock;
use std::time::Duration;

/// Base URL of the lessons REST backend
///
/// The identity endpoint path is appended to this URL.
/// Default: "http://127.0.0.1:5000"
pub static LESSONS_API_BASE_URL: LazyLock<String> = LazyLock::new(|| {
    std::env::var("LESSONS_API_BASE_URL").unwrap_or_else(|_| "http://127.0.0.1:5000".to_string())
});

/// Path of the "current identity" endpoint, relative to the base URL
pub static LESSONS_IDENTITY_PATH: LazyLock<String> = LazyLock::new(|| {
    std::env::var("LESSONS_IDENTITY_PATH").unwrap_or_else(|_| "/users/me".to_string())
});

/// Request timeout of the identity client, in seconds
pub static LESSONS_IDENTITY_TIMEOUT: LazyLock<Duration> = LazyLock::new(|| {
    let secs = std::env::var("LESSONS_IDENTITY_TIMEOUT_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(30);
    Duration::from_secs(secs)
});

/// Backend of the persistent store: "memory", "file" or "redis"
pub static LESSONS_STORE_TYPE: LazyLock<String> = LazyLock::new(|| {
    std::env::var("LESSONS_STORE_TYPE").unwrap_or_else(|_| "file".to_string())
});

/// Location of the persistent store (file path or redis URL)
pub static LESSONS_STORE_URL: LazyLock<String> = LazyLock::new(|| {
    std::env::var("LESSONS_STORE_URL").unwrap_or_else(|_| "./lessons-session.json".to_string())
});

/// Namespace of the keys the session manager writes to the store
pub static LESSONS_STORE_KEY_PREFIX: LazyLock<String> = LazyLock::new(|| {
    std::env::var("LESSONS_STORE_KEY_PREFIX").unwrap_or_else(|_| "lessons".to_string())
});

/// Number of refresh attempts made while waiting for the premium flag after payment
pub static LESSONS_PREMIUM_SYNC_ATTEMPTS: LazyLock<u32> = LazyLock::new(|| {
    std::env::var("LESSONS_PREMIUM_SYNC_ATTEMPTS")
        .ok()
        .and_then(|s| s.parse().ok())
        .filter(|n| *n > 0)
        .unwrap_or(5)
});

/// Delay between two premium sync attempts
pub static LESSONS_PREMIUM_SYNC_DELAY: LazyLock<Duration> = LazyLock::new(|| {
    let millis = std::env::var("LESSONS_PREMIUM_SYNC_DELAY_MS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(2000);
    Duration::from_millis(millis)
});

/// What an exhausted premium sync reports: "pending" or "failed"
pub static LESSONS_PREMIUM_SYNC_ON_EXHAUSTED: LazyLock<String> = LazyLock::new(|| {
    std::env::var("LESSONS_PREMIUM_SYNC_ON_EXHAUSTED").unwrap_or_else(|_| "pending".to_string())
});

/// Whether a restored session is re-validated against the backend right away
pub static LESSONS_REVALIDATE_ON_START: LazyLock<bool> = LazyLock::new(|| {
    std::env::var("LESSONS_REVALIDATE_ON_START")
        .ok()
        .and_then(|s| parse_bool(&s))
        .unwrap_or(true)
});

pub(crate) fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
