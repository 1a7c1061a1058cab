//! Credential records and their on-disk document forms.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Provider name for credentials minted by STS `GetSessionToken`.
pub const SESSION_TOKEN_PROVIDER: &str = "SessionTokenProvider";

/// Provider name for credentials minted by STS `AssumeRole`.
pub const ASSUME_ROLE_PROVIDER: &str = "AssumeRoleProvider";

/// Provider name for long-lived keys. Records tagged with it are never cached.
pub const STATIC_PROVIDER: &str = "StaticProvider";

/// Temporary session credentials plus the time they stop being valid.
///
/// Records are only ever built whole. There are no setters; refreshing a
/// cached record means writing a new one over it.
///
/// The secret key and session token are not printed in `Debug` output.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
    #[serde(rename = "AccessKeyId")]
    access_key_id: String,

    #[serde(rename = "SecretAccessKey")]
    secret_access_key: String,

    #[serde(rename = "SessionToken")]
    session_token: String,

    #[serde(rename = "Expiration")]
    expiration: DateTime<Utc>,

    #[serde(
        rename = "ProviderName",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    provider_name: Option<String>,
}

impl CredentialRecord {
    /// Creates a record from the secret triple and its expiration.
    ///
    /// # Example
    ///
    /// ```
    /// use chrono::{TimeZone, Utc};
    /// use mfacache::CredentialRecord;
    ///
    /// let expires = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    /// let record = CredentialRecord::new("ASIAEXAMPLE", "secret", "token", expires)
    ///     .with_provider_name("SessionTokenProvider");
    ///
    /// assert_eq!(record.access_key_id(), "ASIAEXAMPLE");
    /// assert!(record.is_cacheable());
    /// ```
    pub fn new(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        session_token: impl Into<String>,
        expiration: DateTime<Utc>,
    ) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token: session_token.into(),
            expiration,
            provider_name: None,
        }
    }

    /// Tags the record with the provider that minted it.
    pub fn with_provider_name(mut self, name: impl Into<String>) -> Self {
        self.provider_name = Some(name.into());
        self
    }

    /// Returns the same credentials with a different expiration.
    pub fn with_expiration(mut self, expiration: DateTime<Utc>) -> Self {
        self.expiration = expiration;
        self
    }

    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    pub fn secret_access_key(&self) -> &str {
        &self.secret_access_key
    }

    pub fn session_token(&self) -> &str {
        &self.session_token
    }

    /// Absolute UTC time after which the record is invalid.
    pub fn expiration(&self) -> DateTime<Utc> {
        self.expiration
    }

    pub fn provider_name(&self) -> Option<&str> {
        self.provider_name.as_deref()
    }

    /// Whether the record is a temporary session credential worth caching.
    ///
    /// Long-lived keys (static or untagged) are handed back to the caller but
    /// never written to the cache.
    pub fn is_cacheable(&self) -> bool {
        matches!(
            self.provider_name.as_deref(),
            Some(SESSION_TOKEN_PROVIDER) | Some(ASSUME_ROLE_PROVIDER)
        )
    }

    /// Checks that every secret field is populated.
    ///
    /// Returns the name of the first empty field.
    pub fn ensure_complete(&self) -> std::result::Result<(), &'static str> {
        if self.access_key_id.is_empty() {
            return Err("AccessKeyId");
        }
        if self.secret_access_key.is_empty() {
            return Err("SecretAccessKey");
        }
        if self.session_token.is_empty() {
            return Err("SessionToken");
        }
        Ok(())
    }
}

impl fmt::Debug for CredentialRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialRecord")
            .field("access_key_id", &self.access_key_id)
            .field("expiration", &self.expiration)
            .field("provider_name", &self.provider_name)
            .finish_non_exhaustive()
    }
}

/// How a cached session is laid out in its JSON file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheLayout {
    /// Credential fields at the top level of the object.
    Flat,
    /// AWS CLI cache layout: credential fields nested under `Credentials`.
    CliEnvelope,
}

/// A cached record plus opaque metadata blobs.
///
/// The metadata is preserved across read and write but never interpreted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedSession {
    #[serde(rename = "Credentials")]
    pub credentials: CredentialRecord,

    #[serde(
        rename = "AssumedRoleUser",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub assumed_role_user: Option<Value>,

    #[serde(
        rename = "ResponseMetadata",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub response_metadata: Option<Value>,
}

#[derive(Serialize, Deserialize)]
struct FlatDocument {
    #[serde(flatten)]
    credentials: CredentialRecord,

    #[serde(
        rename = "AssumedRoleUser",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    assumed_role_user: Option<Value>,

    #[serde(
        rename = "ResponseMetadata",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    response_metadata: Option<Value>,
}

impl CachedSession {
    /// Wraps a record with no metadata.
    pub fn new(credentials: CredentialRecord) -> Self {
        Self {
            credentials,
            assumed_role_user: None,
            response_metadata: None,
        }
    }

    /// Decodes either layout. The envelope is recognised by its
    /// `Credentials` key; anything else must be a flat record.
    pub fn from_json(bytes: &[u8]) -> serde_json::Result<Self> {
        let value: Value = serde_json::from_slice(bytes)?;

        if value.get("Credentials").is_some() {
            return serde_json::from_value(value);
        }

        let flat: FlatDocument = serde_json::from_value(value)?;
        Ok(Self {
            credentials: flat.credentials,
            assumed_role_user: flat.assumed_role_user,
            response_metadata: flat.response_metadata,
        })
    }

    /// Encodes the session in the requested layout.
    pub fn to_json(&self, layout: CacheLayout) -> serde_json::Result<Vec<u8>> {
        match layout {
            CacheLayout::CliEnvelope => serde_json::to_vec_pretty(self),
            CacheLayout::Flat => serde_json::to_vec_pretty(&FlatDocument {
                credentials: self.credentials.clone(),
                assumed_role_user: self.assumed_role_user.clone(),
                response_metadata: self.response_metadata.clone(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> CredentialRecord {
        CredentialRecord::new(
            "ASIAEXAMPLE",
            "wJalrXUtnFEMI",
            "FwoGZXIvYXdz",
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        )
        .with_provider_name(SESSION_TOKEN_PROVIDER)
    }

    #[test]
    fn test_field_names_on_disk() {
        let value = serde_json::to_value(sample()).unwrap();

        assert_eq!(value["AccessKeyId"], "ASIAEXAMPLE");
        assert_eq!(value["SecretAccessKey"], "wJalrXUtnFEMI");
        assert_eq!(value["SessionToken"], "FwoGZXIvYXdz");
        assert_eq!(value["Expiration"], "2024-01-01T00:00:00Z");
        assert_eq!(value["ProviderName"], SESSION_TOKEN_PROVIDER);
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let out = format!("{:?}", sample());
        assert!(out.contains("ASIAEXAMPLE"));
        assert!(!out.contains("wJalrXUtnFEMI"));
        assert!(!out.contains("FwoGZXIvYXdz"));
    }

    #[test]
    fn test_cacheable_provenance() {
        assert!(sample().is_cacheable());
        assert!(sample().with_provider_name(ASSUME_ROLE_PROVIDER).is_cacheable());
        assert!(!sample().with_provider_name(STATIC_PROVIDER).is_cacheable());

        let untagged = CredentialRecord::new("a", "b", "c", Utc::now());
        assert!(!untagged.is_cacheable());
    }

    #[test]
    fn test_ensure_complete() {
        assert!(sample().ensure_complete().is_ok());

        let missing = CredentialRecord::new("AKIA", "secret", "", Utc::now());
        assert_eq!(missing.ensure_complete(), Err("SessionToken"));
    }

    #[test]
    fn test_decode_cli_envelope_keeps_metadata() {
        let raw = br#"{
            "Credentials": {
                "AccessKeyId": "ASIAROLE",
                "SecretAccessKey": "s",
                "SessionToken": "t",
                "Expiration": "2024-01-01T00:00:00Z"
            },
            "AssumedRoleUser": {"Arn": "arn:aws:sts::123:assumed-role/admin/me"},
            "ResponseMetadata": {"RequestId": "abc"}
        }"#;

        let session = CachedSession::from_json(raw).unwrap();
        assert_eq!(session.credentials.access_key_id(), "ASIAROLE");
        assert_eq!(session.credentials.provider_name(), None);
        assert_eq!(
            session.assumed_role_user.as_ref().unwrap()["Arn"],
            "arn:aws:sts::123:assumed-role/admin/me"
        );

        let rewritten = session.to_json(CacheLayout::CliEnvelope).unwrap();
        assert_eq!(CachedSession::from_json(&rewritten).unwrap(), session);
    }

    #[test]
    fn test_flat_layout_has_top_level_fields() {
        let session = CachedSession::new(sample());
        let bytes = session.to_json(CacheLayout::Flat).unwrap();
        let value: Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(value["AccessKeyId"], "ASIAEXAMPLE");
        assert!(value.get("Credentials").is_none());
        assert_eq!(CachedSession::from_json(&bytes).unwrap(), session);
    }

    #[test]
    fn test_missing_field_is_rejected() {
        let raw = br#"{"AccessKeyId": "a", "SecretAccessKey": "b", "Expiration": "2024-01-01T00:00:00Z"}"#;
        let err = CachedSession::from_json(raw).unwrap_err();
        assert!(err.to_string().contains("SessionToken"));
    }

    #[test]
    fn test_wrong_type_is_rejected() {
        let raw = br#"{"Credentials": {"AccessKeyId": 7, "SecretAccessKey": "b", "SessionToken": "c", "Expiration": "2024-01-01T00:00:00Z"}}"#;
        assert!(CachedSession::from_json(raw).is_err());
    }
}
