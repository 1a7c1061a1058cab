//! Mock backend for testing.
//!
//! An in-memory upstream source and client connector with call counters and
//! error injection, for testing code that uses mfacache without touching a
//! cloud provider.

use crate::prompt::TokenPrompt;
use crate::session::{CallerIdentity, ClientConnector};
use crate::source::UpstreamSource;
use crate::*;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Mock upstream source.
///
/// Every successful mint returns distinct credentials (`ASIAMOCK1`,
/// `ASIAMOCK2`, ...) tagged as session-token credentials unless configured
/// otherwise.
///
/// # Example
///
/// ```
/// use mfacache::backends::mock::MockSource;
/// use mfacache::{CacheKey, MfaCacheError, UpstreamSource};
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() -> mfacache::Result<()> {
///     let key = CacheKey::profile("test")?;
///
///     let source = MockSource::new();
///     let record = source.mint(&key, Duration::from_secs(60)).await?;
///     assert_eq!(record.access_key_id(), "ASIAMOCK1");
///     assert_eq!(source.mint_count(), 1);
///
///     // Simulate a rejected MFA code
///     let failing = MockSource::new().failing_with("MultiFactorAuthentication failed");
///     assert!(matches!(
///         failing.mint(&key, Duration::from_secs(60)).await,
///         Err(MfaCacheError::UpstreamAuth(_))
///     ));
///
///     Ok(())
/// }
/// ```
pub struct MockSource {
    provider_name: String,
    mints: AtomicUsize,
    prompt: Option<(Box<dyn TokenPrompt>, String)>,

    /// Message of the [`MfaCacheError::UpstreamAuth`] returned by every `mint()`
    pub mint_error: Option<String>,
}

impl MockSource {
    /// Creates a source minting session-token credentials.
    pub fn new() -> Self {
        Self {
            provider_name: SESSION_TOKEN_PROVIDER.to_string(),
            mints: AtomicUsize::new(0),
            prompt: None,
            mint_error: None,
        }
    }

    /// Tags minted credentials with a different provider name.
    pub fn with_provider_name(mut self, name: impl Into<String>) -> Self {
        self.provider_name = name.into();
        self
    }

    /// Makes every mint fail with `message`.
    pub fn failing_with(mut self, message: impl Into<String>) -> Self {
        self.mint_error = Some(message.into());
        self
    }

    /// Requires a code from `prompt` on every mint, accepting only `expected`.
    pub fn with_prompt(mut self, prompt: Box<dyn TokenPrompt>, expected: impl Into<String>) -> Self {
        self.prompt = Some((prompt, expected.into()));
        self
    }

    /// Number of mint attempts, successful or not.
    pub fn mint_count(&self) -> usize {
        self.mints.load(Ordering::SeqCst)
    }
}

impl Default for MockSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UpstreamSource for MockSource {
    fn name(&self) -> &str {
        "mock"
    }

    async fn mint(&self, _key: &CacheKey, duration: Duration) -> Result<CredentialRecord> {
        let n = self.mints.fetch_add(1, Ordering::SeqCst) + 1;

        if let Some(message) = &self.mint_error {
            return Err(MfaCacheError::UpstreamAuth(message.clone()));
        }

        if let Some((prompt, expected)) = &self.prompt {
            let code = prompt.read_token("arn:aws:iam::000000000000:mfa/mock").await?;
            if &code != expected {
                return Err(MfaCacheError::UpstreamAuth(
                    "MultiFactorAuthentication failed with invalid MFA one time pass code".to_string(),
                ));
            }
        }

        let lifetime = chrono::Duration::from_std(duration)
            .map_err(|e| MfaCacheError::Configuration(e.to_string()))?;

        Ok(CredentialRecord::new(
            format!("ASIAMOCK{n}"),
            format!("mock-secret-{n}"),
            format!("mock-token-{n}"),
            Utc::now() + lifetime,
        )
        .with_provider_name(self.provider_name.clone()))
    }

    fn is_expired(&self) -> bool {
        self.mint_count() == 0
    }
}

/// Client returned by [`MockConnector`].
#[derive(Debug, Clone)]
pub struct MockClient {
    /// Access key the client was bound to
    pub access_key_id: String,
}

/// Mock client connector.
///
/// Accepts every credential unless configured with [`rejecting`](Self::rejecting).
pub struct MockConnector {
    connects: AtomicUsize,
    validations: AtomicUsize,

    /// Message of the [`MfaCacheError::Validation`] returned by `validate()`
    pub validate_error: Option<String>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self {
            connects: AtomicUsize::new(0),
            validations: AtomicUsize::new(0),
            validate_error: None,
        }
    }

    /// Makes validation fail with `message`.
    pub fn rejecting(mut self, message: impl Into<String>) -> Self {
        self.validate_error = Some(message.into());
        self
    }

    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn validate_count(&self) -> usize {
        self.validations.load(Ordering::SeqCst)
    }
}

impl Default for MockConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ClientConnector for MockConnector {
    type Client = MockClient;

    async fn connect(&self, credentials: &CredentialRecord) -> Result<MockClient> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(MockClient {
            access_key_id: credentials.access_key_id().to_string(),
        })
    }

    async fn validate(&self, client: &MockClient) -> Result<CallerIdentity> {
        self.validations.fetch_add(1, Ordering::SeqCst);

        if let Some(message) = &self.validate_error {
            return Err(MfaCacheError::Validation(message.clone()));
        }

        Ok(CallerIdentity {
            account: Some("000000000000".to_string()),
            arn: Some("arn:aws:iam::000000000000:user/mock".to_string()),
            user_id: Some(client.access_key_id.clone()),
        })
    }
}
