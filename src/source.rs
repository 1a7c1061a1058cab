//! Upstream credential sources.
//!
//! A source is whatever can mint brand-new credentials for an identity,
//! usually after an interactive MFA step. The caching layer composes with a
//! source through this trait and never reaches into the SDK's own credential
//! chain.

use crate::{CacheKey, CredentialRecord, Result};
use async_trait::async_trait;
use std::time::Duration;

/// Mints fresh credentials.
///
/// # Implementations
///
/// - [`StsSource`](crate::backends::aws::StsSource): STS `GetSessionToken` /
///   `AssumeRole` with an MFA code (feature `aws`)
/// - [`MockSource`](crate::backends::mock::MockSource): in-memory source with
///   a call counter and error injection (feature `mock`)
#[async_trait]
pub trait UpstreamSource: Send + Sync {
    /// Short name for logs (e.g. "sts", "mock").
    fn name(&self) -> &str;

    /// Obtains a new credential record for `key`, valid for `duration`.
    ///
    /// Implementations tag temporary credentials with a provider name such as
    /// [`SESSION_TOKEN_PROVIDER`](crate::SESSION_TOKEN_PROVIDER); untagged
    /// or static records are returned to callers but never cached.
    ///
    /// # Errors
    ///
    /// Returns [`MfaCacheError::UpstreamAuth`](crate::MfaCacheError::UpstreamAuth)
    /// when the token is rejected or cannot be obtained. Callers never retry
    /// automatically.
    async fn mint(&self, key: &CacheKey, duration: Duration) -> Result<CredentialRecord>;

    /// The source's own view of whether its credentials are stale.
    ///
    /// Only consulted when nothing has been retrieved yet in this process.
    fn is_expired(&self) -> bool;
}
