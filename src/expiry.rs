//! Expiration policy.
//!
//! Every consumer of a cached record decides staleness here, against a UTC
//! clock. The freshness an upstream provider reports about its own
//! credentials is never used as a substitute: static credentials built from
//! a cached record always claim to be valid.

use crate::CredentialRecord;
use chrono::{DateTime, Duration, Utc};

/// Returns true iff `now` is at or past the record's expiration.
///
/// # Example
///
/// ```
/// use chrono::{Duration, TimeZone, Utc};
/// use mfacache::{expiry, CredentialRecord};
///
/// let expires = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
/// let record = CredentialRecord::new("a", "b", "c", expires);
///
/// assert!(!expiry::is_expired(&record, expires - Duration::seconds(1)));
/// assert!(expiry::is_expired(&record, expires));
/// ```
pub fn is_expired(record: &CredentialRecord, now: DateTime<Utc>) -> bool {
    now >= record.expiration()
}

/// Time left until the record expires, rounded to the second.
///
/// Negative once the record has expired.
pub fn remaining(record: &CredentialRecord, now: DateTime<Utc>) -> Duration {
    let millis = (record.expiration() - now).num_milliseconds();
    let secs = (millis as f64 / 1000.0).round() as i64;
    Duration::seconds(secs)
}

/// Formats a (possibly negative) duration as `1h2m3s`.
pub fn format_remaining(d: Duration) -> String {
    let total = d.num_seconds();
    let sign = if total < 0 { "-" } else { "" };
    let total = total.abs();
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);

    if h > 0 {
        format!("{sign}{h}h{m}m{s}s")
    } else if m > 0 {
        format!("{sign}{m}m{s}s")
    } else {
        format!("{sign}{s}s")
    }
}

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock in UTC.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock stopped at a fixed instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
