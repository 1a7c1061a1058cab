//! AWS client connector.

use crate::session::{CallerIdentity, ClientConnector};
use crate::{Config, CredentialRecord, MfaCacheError, Result};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_sts::config::Credentials;
use aws_sdk_sts::error::DisplayErrorContext;

/// Builds an [`SdkConfig`] whose credential provider is the cached record.
///
/// The profile is still loaded for region and endpoint settings, but its
/// credential chain is replaced. Service clients built from the returned
/// config (`aws_sdk_iam::Client::new(&config)`, ...) sign with the cached
/// session credentials.
pub struct StsConnector {
    profile: String,
    region: Option<String>,
}

impl StsConnector {
    pub fn from_config(config: &Config) -> Self {
        Self {
            profile: config.profile.clone(),
            region: config.region.clone(),
        }
    }
}

#[async_trait]
impl ClientConnector for StsConnector {
    type Client = SdkConfig;

    async fn connect(&self, record: &CredentialRecord) -> Result<SdkConfig> {
        let credentials = Credentials::new(
            record.access_key_id(),
            record.secret_access_key(),
            Some(record.session_token().to_string()),
            Some(std::time::SystemTime::from(record.expiration())),
            "mfacache",
        );

        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .profile_name(&self.profile)
            .credentials_provider(credentials);

        if let Some(ref region) = self.region {
            loader = loader.region(aws_config::Region::new(region.clone()));
        }

        Ok(loader.load().await)
    }

    async fn validate(&self, config: &SdkConfig) -> Result<CallerIdentity> {
        let out = aws_sdk_sts::Client::new(config)
            .get_caller_identity()
            .send()
            .await
            .map_err(|e| {
                MfaCacheError::Validation(format!("GetCallerIdentity: {}", DisplayErrorContext(&e)))
            })?;

        Ok(CallerIdentity {
            account: out.account().map(str::to_string),
            arn: out.arn().map(str::to_string),
            user_id: out.user_id().map(str::to_string),
        })
    }
}
