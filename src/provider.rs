//! Read-through, write-back credential provider.
//!
//! [`CachingProvider`] decorates an [`UpstreamSource`] with a [`CacheStore`]:
//!
//! 1. Read the cached record. If present and unexpired, return it (one file
//!    read, no upstream call, no write).
//! 2. Otherwise mint through the upstream source. Upstream failures propagate
//!    verbatim; a stale record is never used as a fallback.
//! 3. If the fresh record is a temporary session credential, stamp it with
//!    `now + duration` and write it back before returning. A failed write is
//!    reported as a warning alongside the still-usable record.
//!
//! There is no background refresh. Minting may need a human, so it only ever
//! happens inside a caller's `retrieve`.

use crate::expiry::{self, Clock, SystemClock};
use crate::{CacheKey, CacheStore, CachedSession, CredentialRecord, MfaCacheError, Result};
use crate::source::UpstreamSource;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Where a retrieved record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Served from the cache file.
    Cache,
    /// Minted by the upstream source during this call.
    Minted,
}

/// Result of [`CachingProvider::retrieve`].
#[derive(Debug)]
pub struct Retrieval {
    /// Usable credentials.
    pub record: CredentialRecord,
    /// Whether they were cached or freshly minted.
    pub origin: Origin,
    /// Cache file written after a mint, if any.
    pub cached_at: Option<PathBuf>,
    /// Non-fatal failure to persist a freshly minted record.
    pub warning: Option<MfaCacheError>,
}

/// Credential provider that serves cached records until they expire.
///
/// # Example
///
/// ```
/// use mfacache::backends::mock::MockSource;
/// use mfacache::{CacheKey, CacheStore, CachingProvider, Origin};
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() -> mfacache::Result<()> {
///     let dir = std::env::temp_dir().join(format!("mfacache-doc-{}", std::process::id()));
///     let mut provider = CachingProvider::new(
///         CacheStore::new(&dir),
///         MockSource::new(),
///         Duration::from_secs(900),
///     );
///     let key = CacheKey::profile("doc")?;
///
///     assert_eq!(provider.retrieve(&key).await?.origin, Origin::Minted);
///     assert_eq!(provider.retrieve(&key).await?.origin, Origin::Cache);
///     assert_eq!(provider.source().mint_count(), 1);
///
///     provider.store().delete(&key).await?;
///     Ok(())
/// }
/// ```
pub struct CachingProvider<S> {
    store: CacheStore,
    source: S,
    duration: Duration,
    clock: Arc<dyn Clock>,
    current: Option<CredentialRecord>,
}

impl<S: UpstreamSource> CachingProvider<S> {
    /// Creates a provider minting credentials valid for `duration`.
    pub fn new(store: CacheStore, source: S, duration: Duration) -> Self {
        Self {
            store,
            source,
            duration,
            clock: Arc::new(SystemClock),
            current: None,
        }
    }

    /// Replaces the wall clock, e.g. with a [`FixedClock`](crate::FixedClock).
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub(crate) fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    /// The record returned by the most recent successful retrieval.
    pub fn current(&self) -> Option<&CredentialRecord> {
        self.current.as_ref()
    }

    /// Returns valid credentials for `key`, minting only when the cache has
    /// nothing usable.
    ///
    /// A corrupt or unreadable cache file is treated like a missing one.
    ///
    /// # Errors
    ///
    /// - [`MfaCacheError::UpstreamAuth`]: minting failed
    /// - [`MfaCacheError::Configuration`]: the duration cannot be represented
    pub async fn retrieve(&mut self, key: &CacheKey) -> Result<Retrieval> {
        let now = self.clock.now();

        match self.store.read(key).await {
            Ok(cached) if !expiry::is_expired(&cached.credentials, now) => {
                debug!(identity = %key, expires = %cached.credentials.expiration(), "using cached credentials");
                self.current = Some(cached.credentials.clone());
                return Ok(Retrieval {
                    record: cached.credentials,
                    origin: Origin::Cache,
                    cached_at: None,
                    warning: None,
                });
            }
            Ok(cached) => {
                info!(identity = %key, expired = %cached.credentials.expiration(), "cached credentials expired");
            }
            Err(e) if e.is_not_found() => {
                debug!(identity = %key, "no cached credentials");
            }
            Err(e) if e.is_cache_miss() => {
                warn!(identity = %key, error = %e, "ignoring unusable cache file");
            }
            Err(e) => return Err(e),
        }

        self.current = None;
        self.mint(key).await
    }

    async fn mint(&mut self, key: &CacheKey) -> Result<Retrieval> {
        debug!(identity = %key, source = self.source.name(), "minting credentials");
        let minted = self.source.mint(key, self.duration).await?;

        if let Err(field) = minted.ensure_complete() {
            return Err(MfaCacheError::UpstreamAuth(format!(
                "{} returned credentials without {field}",
                self.source.name()
            )));
        }

        if !minted.is_cacheable() {
            debug!(identity = %key, provider = ?minted.provider_name(), "not caching long-lived credentials");
            self.current = Some(minted.clone());
            return Ok(Retrieval {
                record: minted,
                origin: Origin::Minted,
                cached_at: None,
                warning: None,
            });
        }

        let lifetime = chrono::Duration::from_std(self.duration).map_err(|e| {
            MfaCacheError::Configuration(format!("invalid credential duration: {e}"))
        })?;
        let record = minted.with_expiration(self.clock.now() + lifetime);
        self.current = Some(record.clone());

        let (cached_at, warning) = match self
            .store
            .write(key, &CachedSession::new(record.clone()))
            .await
        {
            Ok(path) => {
                info!(identity = %key, expires = %record.expiration(), "credentials cached");
                (Some(path), None)
            }
            Err(e) => {
                warn!(identity = %key, error = %e, "credentials minted but not cached");
                (None, Some(e))
            }
        };

        Ok(Retrieval {
            record,
            origin: Origin::Minted,
            cached_at,
            warning,
        })
    }

    /// Reads the cached record for `key` without ever minting.
    ///
    /// The record becomes [`current`](Self::current) even if it is stale;
    /// deciding whether it is usable is left to the caller.
    ///
    /// # Errors
    ///
    /// Whatever [`CacheStore::read`] returns.
    pub async fn read_cached(&mut self, key: &CacheKey) -> Result<CredentialRecord> {
        let cached = self.store.read(key).await?;
        self.current = Some(cached.credentials.clone());
        Ok(cached.credentials)
    }

    /// Whether the current credentials are stale.
    ///
    /// Uses the last retrieved record when there is one, otherwise defers to
    /// the upstream source.
    pub fn is_expired(&self) -> bool {
        match &self.current {
            Some(record) => expiry::is_expired(record, self.clock.now()),
            None => self.source.is_expired(),
        }
    }
}

#[cfg(all(test, feature = "mock"))]
mod tests {
    use super::*;
    use crate::backends::mock::MockSource;
    use crate::{FixedClock, STATIC_PROVIDER};
    use chrono::{TimeZone, Utc};
    use tempfile::tempdir;

    fn provider_at(
        dir: &std::path::Path,
        now: chrono::DateTime<Utc>,
    ) -> CachingProvider<MockSource> {
        CachingProvider::new(CacheStore::new(dir), MockSource::new(), Duration::from_secs(900))
            .with_clock(Arc::new(FixedClock(now)))
    }

    #[tokio::test]
    async fn test_miss_mints_and_caches() {
        let dir = tempdir().unwrap();
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut provider = provider_at(dir.path(), now);
        let key = CacheKey::profile("dev").unwrap();

        let got = provider.retrieve(&key).await.unwrap();
        assert_eq!(got.origin, Origin::Minted);
        assert!(got.warning.is_none());
        assert_eq!(got.record.expiration(), now + chrono::Duration::seconds(900));
        assert_eq!(provider.source().mint_count(), 1);

        let stored = provider.store().read(&key).await.unwrap();
        assert_eq!(stored.credentials, got.record);
    }

    #[tokio::test]
    async fn test_hit_skips_upstream() {
        let dir = tempdir().unwrap();
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut provider = provider_at(dir.path(), now);
        let key = CacheKey::profile("dev").unwrap();

        let first = provider.retrieve(&key).await.unwrap();
        let second = provider.retrieve(&key).await.unwrap();

        assert_eq!(second.origin, Origin::Cache);
        assert_eq!(second.record, first.record);
        assert_eq!(provider.source().mint_count(), 1);
        assert!(!provider.is_expired());
    }

    #[tokio::test]
    async fn test_upstream_failure_never_falls_back_to_stale() {
        let dir = tempdir().unwrap();
        let key = CacheKey::profile("dev").unwrap();
        let then = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        let mut provider = provider_at(dir.path(), then);
        provider.retrieve(&key).await.unwrap();

        let later = then + chrono::Duration::hours(1);
        let mut provider = CachingProvider::new(
            CacheStore::new(dir.path()),
            MockSource::new().failing_with("token rejected"),
            Duration::from_secs(900),
        )
        .with_clock(Arc::new(FixedClock(later)));

        let err = provider.retrieve(&key).await.unwrap_err();
        assert!(matches!(err, MfaCacheError::UpstreamAuth(ref m) if m.contains("token rejected")));
        assert!(provider.current().is_none());
    }

    #[tokio::test]
    async fn test_static_credentials_are_not_cached() {
        let dir = tempdir().unwrap();
        let mut provider = CachingProvider::new(
            CacheStore::new(dir.path()),
            MockSource::new().with_provider_name(STATIC_PROVIDER),
            Duration::from_secs(900),
        );
        let key = CacheKey::profile("dev").unwrap();

        let got = provider.retrieve(&key).await.unwrap();
        assert_eq!(got.origin, Origin::Minted);
        assert!(got.cached_at.is_none());
        assert!(provider.store().read(&key).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_is_expired_defers_to_source_before_first_retrieve() {
        let dir = tempdir().unwrap();
        let provider = provider_at(dir.path(), Utc::now());
        assert!(provider.current().is_none());
        assert_eq!(provider.is_expired(), provider.source().is_expired());
    }

    #[tokio::test]
    async fn test_write_failure_is_a_warning() {
        let dir = tempdir().unwrap();
        // a regular file where the cache directory should be
        std::fs::write(dir.path().join(".aws"), b"").unwrap();

        let mut provider = provider_at(dir.path(), Utc::now());
        let key = CacheKey::profile("dev").unwrap();

        let got = provider.retrieve(&key).await.unwrap();
        assert_eq!(got.origin, Origin::Minted);
        assert!(matches!(got.warning, Some(MfaCacheError::CacheWrite { .. })));
        assert_eq!(provider.current(), Some(&got.record));
    }
}
