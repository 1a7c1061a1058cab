//! STS upstream source.

use crate::prompt::TokenPrompt;
use crate::source::UpstreamSource;
use crate::{
    CacheKey, Config, CredentialRecord, MfaCacheError, Result, ASSUME_ROLE_PROVIDER,
    SESSION_TOKEN_PROVIDER,
};
use async_trait::async_trait;
use aws_sdk_sts::error::DisplayErrorContext;
use aws_sdk_sts::Client;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::debug;

/// Mints MFA session credentials through AWS STS.
///
/// The profile's long-lived keys come from the SDK's normal configuration
/// (`~/.aws/credentials`, environment). With a role configured the source
/// calls `AssumeRole`, otherwise `GetSessionToken`; both carry the MFA device
/// serial and a code read from the [`TokenPrompt`].
pub struct StsSource {
    profile: String,
    region: Option<String>,
    mfa_serial: String,
    role_arn: Option<String>,
    prompt: Box<dyn TokenPrompt>,
    minted: AtomicBool,
}

impl StsSource {
    /// Creates a source from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`MfaCacheError::Configuration`] if no MFA device serial is
    /// configured.
    pub fn from_config(config: &Config, prompt: Box<dyn TokenPrompt>) -> Result<Self> {
        let mfa_serial = config.mfa_serial.clone().ok_or_else(|| {
            MfaCacheError::Configuration(
                "no MFA device configured (set AWS_MFA_SERIAL or pass --serial-number)".to_string(),
            )
        })?;

        Ok(Self {
            profile: config.profile.clone(),
            region: config.region.clone(),
            mfa_serial,
            role_arn: config.role_arn.clone(),
            prompt,
            minted: AtomicBool::new(false),
        })
    }

    async fn client(&self) -> Client {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .profile_name(&self.profile);

        if let Some(ref region) = self.region {
            loader = loader.region(aws_config::Region::new(region.clone()));
        }

        Client::new(&loader.load().await)
    }
}

/// Role session names only allow `[\w+=,.@-]`.
fn role_session_name(profile: &str) -> String {
    let name: String = profile
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || "+=,.@-_".contains(c) {
                c
            } else {
                '-'
            }
        })
        .collect();
    format!("mfacache-{name}").chars().take(64).collect()
}

fn to_record(
    creds: Option<&aws_sdk_sts::types::Credentials>,
    provider: &str,
) -> Result<CredentialRecord> {
    let creds = creds
        .ok_or_else(|| MfaCacheError::UpstreamAuth("STS returned no credentials".to_string()))?;

    let expires = creds.expiration();
    let expiration = chrono::DateTime::from_timestamp(expires.secs(), expires.subsec_nanos())
        .ok_or_else(|| {
            MfaCacheError::UpstreamAuth("STS returned an out-of-range expiration".to_string())
        })?;

    Ok(CredentialRecord::new(
        creds.access_key_id(),
        creds.secret_access_key(),
        creds.session_token(),
        expiration,
    )
    .with_provider_name(provider))
}

#[async_trait]
impl UpstreamSource for StsSource {
    fn name(&self) -> &str {
        "sts"
    }

    async fn mint(&self, key: &CacheKey, duration: Duration) -> Result<CredentialRecord> {
        let seconds = i32::try_from(duration.as_secs()).map_err(|_| {
            MfaCacheError::Configuration(format!("duration too long: {}s", duration.as_secs()))
        })?;

        let client = self.client().await;
        let code = self.prompt.read_token(&self.mfa_serial).await?;

        let record = match &self.role_arn {
            Some(arn) => {
                debug!(identity = %key, role = %arn, "calling sts:AssumeRole");
                let out = client
                    .assume_role()
                    .role_arn(arn)
                    .role_session_name(role_session_name(key.profile_name()))
                    .serial_number(&self.mfa_serial)
                    .token_code(code)
                    .duration_seconds(seconds)
                    .send()
                    .await
                    .map_err(|e| {
                        MfaCacheError::UpstreamAuth(format!("AssumeRole: {}", DisplayErrorContext(&e)))
                    })?;
                to_record(out.credentials(), ASSUME_ROLE_PROVIDER)?
            }
            None => {
                debug!(identity = %key, "calling sts:GetSessionToken");
                let out = client
                    .get_session_token()
                    .serial_number(&self.mfa_serial)
                    .token_code(code)
                    .duration_seconds(seconds)
                    .send()
                    .await
                    .map_err(|e| {
                        MfaCacheError::UpstreamAuth(format!(
                            "GetSessionToken: {}",
                            DisplayErrorContext(&e)
                        ))
                    })?;
                to_record(out.credentials(), SESSION_TOKEN_PROVIDER)?
            }
        };

        self.minted.store(true, Ordering::SeqCst);
        Ok(record)
    }

    fn is_expired(&self) -> bool {
        !self.minted.load(Ordering::SeqCst)
    }
}
