//! Client sessions built on cached credentials.
//!
//! [`SessionFactory`] is where cached credentials meet the cloud client. It
//! resolves a record (through the [`CachingProvider`] in interactive mode, or
//! straight from the [`CacheStore`] otherwise), re-checks expiry, hands the
//! secret triple to a [`ClientConnector`] in place of the client's own
//! credential chain, and makes one validation call before returning.

use crate::expiry::{self, Clock};
use crate::provider::CachingProvider;
use crate::source::UpstreamSource;
use crate::{CacheKey, CacheStore, Config, CredentialRecord, MfaCacheError, Mode, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info};

/// The account and principal the cloud API reports for a set of credentials.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallerIdentity {
    pub account: Option<String>,
    pub arn: Option<String>,
    pub user_id: Option<String>,
}

/// Builds a cloud client from explicit credentials and checks them.
///
/// This is the only point where the cache touches the client library.
/// Implementations must use the given credentials instead of whatever the
/// library would resolve on its own.
#[async_trait]
pub trait ClientConnector: Send + Sync {
    /// Configured client handed to callers.
    type Client: Send + Sync;

    /// Creates a client bound to `credentials`.
    async fn connect(&self, credentials: &CredentialRecord) -> Result<Self::Client>;

    /// Makes one cheap, side-effect-free authenticated call.
    ///
    /// # Errors
    ///
    /// Returns [`MfaCacheError::Validation`] if the API rejects the credentials.
    async fn validate(&self, client: &Self::Client) -> Result<CallerIdentity>;
}

/// An authenticated client plus the credentials it is bound to.
pub struct Session<C> {
    key: CacheKey,
    credentials: CredentialRecord,
    caller: CallerIdentity,
    client: C,
    warning: Option<MfaCacheError>,
}

impl<C> Session<C> {
    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    pub fn credentials(&self) -> &CredentialRecord {
        &self.credentials
    }

    /// Identity confirmed by the validation call.
    pub fn caller(&self) -> &CallerIdentity {
        &self.caller
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn into_client(self) -> C {
        self.client
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.credentials.expiration()
    }

    /// Whether the bound credentials are still usable at `now`.
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        !expiry::is_expired(&self.credentials, now)
    }

    /// Failure to cache freshly minted credentials, if one occurred.
    pub fn warning(&self) -> Option<&MfaCacheError> {
        self.warning.as_ref()
    }
}

/// Builds validated client sessions from cached credentials.
///
/// # Example
///
/// ```
/// use mfacache::backends::mock::{MockConnector, MockSource};
/// use mfacache::{CacheStore, Config, Mode, SessionFactory};
///
/// #[tokio::main]
/// async fn main() -> mfacache::Result<()> {
///     let dir = std::env::temp_dir().join(format!("mfacache-factory-doc-{}", std::process::id()));
///     let config = Config::new("doc").with_mode(Mode::Interactive);
///     let key = config.cache_key()?;
///
///     let mut factory = SessionFactory::new(
///         &config,
///         CacheStore::new(&dir),
///         MockSource::new(),
///         MockConnector::new(),
///     );
///
///     let session = factory.build_session(&key).await?;
///     println!("authenticated as {:?}", session.caller().arn);
///
///     factory.provider().store().delete(&key).await?;
///     Ok(())
/// }
/// ```
pub struct SessionFactory<S, C> {
    mode: Mode,
    provider: CachingProvider<S>,
    connector: C,
}

impl<S: UpstreamSource, C: ClientConnector> SessionFactory<S, C> {
    /// Creates a factory using the mode and credential duration from `config`.
    pub fn new(config: &Config, store: CacheStore, source: S, connector: C) -> Self {
        Self {
            mode: config.mode,
            provider: CachingProvider::new(store, source, config.duration),
            connector,
        }
    }

    /// Replaces the wall clock used for every expiry decision.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.provider = self.provider.with_clock(clock);
        self
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn provider(&self) -> &CachingProvider<S> {
        &self.provider
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Resolves credentials for `key` and returns a validated session.
    ///
    /// Interactive mode mints on a miss. Non-interactive mode only reads the
    /// cache and never calls the upstream source.
    ///
    /// # Errors
    ///
    /// - [`MfaCacheError::UpstreamAuth`]: minting failed, or nothing is cached
    ///   in non-interactive mode
    /// - [`MfaCacheError::Expired`]: the resolved record is already stale
    /// - [`MfaCacheError::Decode`]: corrupt cache in non-interactive mode
    /// - [`MfaCacheError::Validation`]: the API rejected the credentials
    pub async fn build_session(&mut self, key: &CacheKey) -> Result<Session<C::Client>> {
        let (credentials, warning) = match self.mode {
            Mode::Interactive => {
                let retrieval = self.provider.retrieve(key).await?;
                (retrieval.record, retrieval.warning)
            }
            Mode::NonInteractive => (self.cached_credentials(key).await?, None),
        };

        self.open(key, credentials, warning).await
    }

    async fn cached_credentials(&mut self, key: &CacheKey) -> Result<CredentialRecord> {
        match self.provider.read_cached(key).await {
            Ok(record) => Ok(record),
            Err(e) if e.is_not_found() => Err(MfaCacheError::UpstreamAuth(format!(
                "authentication required for {key}: no cached credentials and prompting is disabled"
            ))),
            Err(e) => Err(e),
        }
    }

    async fn open(
        &self,
        key: &CacheKey,
        credentials: CredentialRecord,
        warning: Option<MfaCacheError>,
    ) -> Result<Session<C::Client>> {
        // The client library treats explicit credentials as always valid.
        if expiry::is_expired(&credentials, self.provider.clock().now()) {
            return Err(MfaCacheError::Expired {
                identity: key.to_string(),
                expired_at: credentials.expiration(),
            });
        }

        let client = self.connector.connect(&credentials).await?;
        let caller = self.connector.validate(&client).await?;
        debug!(identity = %key, arn = ?caller.arn, "credentials accepted");
        info!(identity = %key, expires = %credentials.expiration(), "session ready");

        Ok(Session {
            key: key.clone(),
            credentials,
            caller,
            client,
            warning,
        })
    }
}
