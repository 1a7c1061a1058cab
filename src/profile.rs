//! Lookups in the shared AWS config file (`~/.aws/config`).
//!
//! Only the role a profile assumes is read. It decides which cache key a
//! profile uses, so it has to be known before any cache file is touched.

use crate::{MfaCacheError, Result};
use ini::Ini;
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

/// Key holding the role a profile assumes.
pub const ROLE_ARN_KEY: &str = "role_arn";

/// Section names a profile may appear under.
///
/// Named profiles live in `[profile <name>]`; the default profile is
/// conventionally `[default]` but `[profile default]` is accepted too.
fn section_names(profile: &str) -> Vec<String> {
    let named = format!("profile {profile}");
    if profile == crate::config::DEFAULT_PROFILE {
        vec![profile.to_string(), named]
    } else {
        vec![named]
    }
}

/// Returns the `role_arn` configured for `profile` in the config file at
/// `path`.
///
/// A missing file, a missing section or an empty value all yield `None`.
///
/// # Errors
///
/// Returns [`MfaCacheError::Configuration`] if the file exists but cannot be
/// read or parsed.
pub async fn read_role_arn(path: &Path, profile: &str) -> Result<Option<String>> {
    let text = match tokio::fs::read_to_string(path).await {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "no AWS config file");
            return Ok(None);
        }
        Err(e) => {
            return Err(MfaCacheError::Configuration(format!(
                "cannot read {}: {e}",
                path.display()
            )))
        }
    };

    let ini = Ini::load_from_str(&text).map_err(|e| {
        MfaCacheError::Configuration(format!("cannot parse {}: {e}", path.display()))
    })?;

    let role = section_names(profile).iter().find_map(|name| {
        ini.section(Some(name.as_str()))
            .and_then(|section| section.get(ROLE_ARN_KEY))
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    });

    debug!(profile, role = ?role, "resolved profile role");
    Ok(role)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const CONFIG: &str = "\
[default]
region = us-east-1
role_arn = arn:aws:iam::111111111111:role/base

[profile dev]
region = eu-west-1
role_arn = arn:aws:iam::123456789012:role/admin
mfa_serial = arn:aws:iam::123456789012:mfa/me

[profile plain]
region = eu-west-1

[profile blank]
role_arn =
";

    async fn lookup(profile: &str) -> Option<String> {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config");
        std::fs::write(&path, CONFIG).unwrap();
        read_role_arn(&path, profile).await.unwrap()
    }

    #[tokio::test]
    async fn test_named_profile_role() {
        assert_eq!(
            lookup("dev").await.as_deref(),
            Some("arn:aws:iam::123456789012:role/admin")
        );
    }

    #[tokio::test]
    async fn test_default_profile_section() {
        assert_eq!(
            lookup("default").await.as_deref(),
            Some("arn:aws:iam::111111111111:role/base")
        );
    }

    #[tokio::test]
    async fn test_absent_or_empty_role() {
        assert_eq!(lookup("plain").await, None);
        assert_eq!(lookup("blank").await, None);
        assert_eq!(lookup("unknown").await, None);
    }

    #[tokio::test]
    async fn test_missing_file() {
        let dir = tempdir().unwrap();
        let role = read_role_arn(&dir.path().join("config"), "dev").await.unwrap();
        assert!(role.is_none());
    }

    #[tokio::test]
    async fn test_unreadable_file_is_configuration_error() {
        let dir = tempdir().unwrap();
        let err = read_role_arn(dir.path(), "dev").await.unwrap_err();
        assert!(matches!(err, MfaCacheError::Configuration(_)));
    }
}
