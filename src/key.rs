//! Cache identities.

use crate::credential::CacheLayout;
use crate::validation::{validate_profile_name, validate_role_arn};
use crate::Result;
use std::fmt;
use std::path::PathBuf;

/// Which naming scheme a key uses.
///
/// The two schemes live in different directories and are not
/// key-compatible: a record cached under one is not found under the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyScheme {
    /// `.aws/mfacache/aws-profile-<profile>.json`, flat layout.
    Profile,
    /// `.aws/cli/cache/<profile>--<role>.json`, AWS CLI envelope layout.
    ProfileAndRole,
}

/// The identity a record is cached under.
///
/// Keys compare by exact string equality of their file stem; nothing else
/// about them is interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    profile: String,
    role: Option<String>,
}

impl CacheKey {
    /// Key for a plain MFA session of `profile`.
    ///
    /// # Errors
    ///
    /// Returns [`MfaCacheError::Configuration`](crate::MfaCacheError::Configuration)
    /// if the profile name is malformed.
    pub fn profile(profile: impl Into<String>) -> Result<Self> {
        let profile = profile.into();
        validate_profile_name(&profile)?;
        Ok(Self {
            profile,
            role: None,
        })
    }

    /// Key for `profile` assuming `role_arn`.
    ///
    /// # Example
    ///
    /// ```
    /// use mfacache::CacheKey;
    ///
    /// let key = CacheKey::with_role("dev", "arn:aws:iam::123456789012:role/admin").unwrap();
    /// assert_eq!(key.file_stem(), "dev--arn_aws_iam__123456789012_role-admin");
    /// ```
    pub fn with_role(profile: impl Into<String>, role_arn: &str) -> Result<Self> {
        let profile = profile.into();
        validate_profile_name(&profile)?;
        validate_role_arn(role_arn)?;
        Ok(Self {
            profile,
            role: Some(normalize_role(role_arn)),
        })
    }

    pub fn profile_name(&self) -> &str {
        &self.profile
    }

    /// The normalized role identifier, if the key is role-qualified.
    pub fn role(&self) -> Option<&str> {
        self.role.as_deref()
    }

    pub fn scheme(&self) -> KeyScheme {
        match self.role {
            Some(_) => KeyScheme::ProfileAndRole,
            None => KeyScheme::Profile,
        }
    }

    /// Layout the cache file for this key is written in.
    pub fn layout(&self) -> CacheLayout {
        match self.scheme() {
            KeyScheme::Profile => CacheLayout::Flat,
            KeyScheme::ProfileAndRole => CacheLayout::CliEnvelope,
        }
    }

    /// Directory under the base directory holding files of this scheme.
    pub fn relative_dir(&self) -> PathBuf {
        match self.scheme() {
            KeyScheme::Profile => PathBuf::from(".aws").join("mfacache"),
            KeyScheme::ProfileAndRole => PathBuf::from(".aws").join("cli").join("cache"),
        }
    }

    /// File name without the `.json` extension.
    pub fn file_stem(&self) -> String {
        match &self.role {
            Some(role) => format!("{}--{}", self.profile, role),
            None => format!("aws-profile-{}", self.profile),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.role {
            Some(role) => write!(f, "{} ({})", self.profile, role),
            None => write!(f, "{}", self.profile),
        }
    }
}

/// Makes a role ARN safe to embed in a file name.
fn normalize_role(arn: &str) -> String {
    arn.replace(':', "_").replace('/', "-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_key() {
        let key = CacheKey::profile("dev").unwrap();
        assert_eq!(key.file_stem(), "aws-profile-dev");
        assert_eq!(key.scheme(), KeyScheme::Profile);
        assert_eq!(key.layout(), CacheLayout::Flat);
        assert_eq!(key.relative_dir(), PathBuf::from(".aws/mfacache"));
        assert_eq!(key.to_string(), "dev");
    }

    #[test]
    fn test_role_key_normalization() {
        let key = CacheKey::with_role("dev", "arn:aws:iam::123456789012:role/path/admin").unwrap();
        assert_eq!(key.role(), Some("arn_aws_iam__123456789012_role-path-admin"));
        assert_eq!(key.scheme(), KeyScheme::ProfileAndRole);
        assert_eq!(key.layout(), CacheLayout::CliEnvelope);
        assert_eq!(key.relative_dir(), PathBuf::from(".aws/cli/cache"));
        assert!(!key.file_stem().contains('/'));
        assert!(!key.file_stem().contains(':'));
    }

    #[test]
    fn test_different_roles_do_not_collide() {
        let admin = CacheKey::with_role("dev", "arn:aws:iam::1:role/admin").unwrap();
        let reader = CacheKey::with_role("dev", "arn:aws:iam::1:role/reader").unwrap();
        let plain = CacheKey::profile("dev").unwrap();

        assert_ne!(admin.file_stem(), reader.file_stem());
        assert_ne!(admin, plain);
    }

    #[test]
    fn test_malformed_identity() {
        assert!(CacheKey::profile("").is_err());
        assert!(CacheKey::profile("../escape").is_err());
        assert!(CacheKey::with_role("dev", "not-an-arn").is_err());
    }
}
