//! Time utilities with a clock abstraction for testability.
//!
//! History records carry server-side ISO timestamps; entries created
//! locally (live chat, system notices) are stamped from a [`Clock`] so
//! tests can pin time.

use chrono::{DateTime, TimeZone, Utc};

/// Clock trait for dependency injection and testing.
pub trait Clock: Send + Sync {
    /// Current Unix timestamp in milliseconds (UTC).
    fn now_millis(&self) -> i64;
}

/// System clock backed by the actual wall clock.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Fixed clock for tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    fixed_millis: i64,
}

impl FixedClock {
    pub fn new(fixed_millis: i64) -> Self {
        Self { fixed_millis }
    }
}

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.fixed_millis
    }
}

/// Convert a Unix timestamp in milliseconds to an RFC 3339 string (UTC).
pub fn millis_to_rfc3339(timestamp_millis: i64) -> String {
    let seconds = timestamp_millis.div_euclid(1000);
    let nanos = (timestamp_millis.rem_euclid(1000) * 1_000_000) as u32;
    match Utc.timestamp_opt(seconds, nanos) {
        chrono::LocalResult::Single(dt) => dt.to_rfc3339(),
        _ => DateTime::<Utc>::UNIX_EPOCH.to_rfc3339(),
    }
}
