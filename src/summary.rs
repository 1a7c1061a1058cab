//! Human-readable description of a cached record.

use crate::expiry::{format_remaining, remaining};
use crate::{CacheKey, CredentialRecord};
use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt;
use std::path::Path;

/// Describes a cached record without revealing its secrets.
///
/// Only the first four characters of the secret key and session token are
/// shown.
///
/// ```
/// use chrono::{Duration, TimeZone, Utc};
/// use mfacache::{CacheKey, CacheSummary, CredentialRecord};
/// use std::path::Path;
///
/// let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
/// let record = CredentialRecord::new("ASIAEXAMPLE", "wJalrXUt", "FwoGZXIv", now + Duration::minutes(10));
/// let key = CacheKey::profile("dev").unwrap();
///
/// let text = CacheSummary::new(&key, Path::new("/c.json"), &record, now).to_string();
/// assert!(text.contains("SecretAccessKey wJal..."));
/// assert!(text.contains("(10m0s)"));
/// ```
pub struct CacheSummary<'a> {
    key: &'a CacheKey,
    path: &'a Path,
    record: &'a CredentialRecord,
    now: DateTime<Utc>,
}

impl<'a> CacheSummary<'a> {
    pub fn new(
        key: &'a CacheKey,
        path: &'a Path,
        record: &'a CredentialRecord,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            key,
            path,
            record,
            now,
        }
    }
}

fn head(secret: &str) -> String {
    secret.chars().take(4).collect()
}

impl fmt::Display for CacheSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Profile         {}", self.key.profile_name())?;
        if let Some(role) = self.key.role() {
            writeln!(f, "Role            {role}")?;
        }
        writeln!(f, "Cache           {}", self.path.display())?;
        writeln!(f, "AccessKeyId     {}", self.record.access_key_id())?;
        writeln!(f, "SecretAccessKey {}...", head(self.record.secret_access_key()))?;
        writeln!(f, "SessionToken    {}...", head(self.record.session_token()))?;
        write!(
            f,
            "Expiration      {} ({})",
            self.record
                .expiration()
                .to_rfc3339_opts(SecondsFormat::Secs, true),
            format_remaining(remaining(self.record, self.now))
        )
    }
}
