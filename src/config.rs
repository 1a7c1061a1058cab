//! Configuration for the credential cache.
//!
//! Process environment is read in exactly one place, [`Config::from_env`].
//! Everything below it receives the resolved values explicitly.

use crate::{CacheKey, MfaCacheError, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Profile used when none is selected.
pub const DEFAULT_PROFILE: &str = "default";

/// Lifetime given to freshly minted credentials (15 minutes).
pub const DEFAULT_DURATION: Duration = Duration::from_secs(15 * 60);

/// What to do when no usable cached record exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Mint fresh credentials, prompting for a one-time MFA code.
    Interactive,
    /// Fail with an authentication-required error without prompting.
    #[default]
    NonInteractive,
}

/// Cache configuration.
///
/// Use the builder pattern:
///
/// ```
/// use mfacache::{Config, Mode};
/// use std::time::Duration;
///
/// let config = Config::new("dev")
///     .with_mfa_serial("arn:aws:iam::123456789012:mfa/me")
///     .with_region("eu-west-1")
///     .with_duration(Duration::from_secs(3600))
///     .with_mode(Mode::Interactive);
///
/// assert_eq!(config.profile, "dev");
/// assert_eq!(config.cache_key().unwrap().file_stem(), "aws-profile-dev");
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Profile name (default: "default")
    pub profile: String,

    /// Role to assume; switches the cache key to the role-qualified scheme
    pub role_arn: Option<String>,

    /// MFA device serial number or ARN
    pub mfa_serial: Option<String>,

    /// Region for the STS client
    pub region: Option<String>,

    /// Base directory for cache files (default: home directory)
    pub cache_dir: Option<PathBuf>,

    /// Shared AWS config file (default: `<base>/.aws/config`)
    pub config_file: Option<PathBuf>,

    /// Lifetime of newly minted credentials (default: 15 minutes)
    pub duration: Duration,

    /// Behaviour on a cache miss (default: non-interactive)
    pub mode: Mode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            profile: DEFAULT_PROFILE.to_string(),
            role_arn: None,
            mfa_serial: None,
            region: None,
            cache_dir: None,
            config_file: None,
            duration: DEFAULT_DURATION,
            mode: Mode::default(),
        }
    }
}

impl Config {
    /// Creates a configuration for the named profile.
    pub fn new(profile: impl Into<String>) -> Self {
        Self {
            profile: profile.into(),
            ..Default::default()
        }
    }

    /// Builds a configuration from the process environment.
    ///
    /// Reads `AWS_PROFILE` (unset or empty selects `"default"`),
    /// `AWS_REGION`, `AWS_MFA_SERIAL` and `AWS_CONFIG_FILE`.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds a configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.is_empty());

        Self {
            profile: non_empty("AWS_PROFILE").unwrap_or_else(|| DEFAULT_PROFILE.to_string()),
            region: non_empty("AWS_REGION"),
            mfa_serial: non_empty("AWS_MFA_SERIAL"),
            config_file: non_empty("AWS_CONFIG_FILE").map(PathBuf::from),
            ..Default::default()
        }
    }

    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = profile.into();
        self
    }

    /// Sets the role to assume.
    ///
    /// Role-qualified keys are stored in the AWS CLI cache directory, so
    /// profiles assuming different roles never share a cache file.
    pub fn with_role_arn(mut self, arn: impl Into<String>) -> Self {
        self.role_arn = Some(arn.into());
        self
    }

    pub fn with_mfa_serial(mut self, serial: impl Into<String>) -> Self {
        self.mfa_serial = Some(serial.into());
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Overrides the base directory cache files are resolved under.
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    pub fn with_config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    /// Sets the lifetime of newly minted credentials.
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Directory cache paths are resolved under: the configured cache
    /// directory, else the home directory.
    ///
    /// # Errors
    ///
    /// Returns [`MfaCacheError::Configuration`] if neither is available.
    pub fn base_dir(&self) -> Result<PathBuf> {
        match &self.cache_dir {
            Some(dir) => Ok(dir.clone()),
            None => dirs::home_dir().ok_or_else(|| {
                MfaCacheError::Configuration("unable to determine home directory".to_string())
            }),
        }
    }

    /// Path of the shared AWS config file.
    pub fn config_file_path(&self) -> Result<PathBuf> {
        match &self.config_file {
            Some(path) => Ok(path.clone()),
            None => Ok(self.base_dir()?.join(".aws").join("config")),
        }
    }

    /// Fills in the role from the profile's `role_arn` in the shared config
    /// file, unless a role is already set.
    ///
    /// A profile that assumes a role is then cached under the role-qualified
    /// key in the AWS CLI cache directory.
    ///
    /// ```
    /// # #[tokio::main]
    /// # async fn main() -> mfacache::Result<()> {
    /// use mfacache::{Config, KeyScheme};
    ///
    /// let dir = std::env::temp_dir().join(format!("mfacache-role-doc-{}", std::process::id()));
    /// std::fs::create_dir_all(&dir)?;
    /// let file = dir.join("config");
    /// std::fs::write(&file, "[profile dev]\nrole_arn = arn:aws:iam::1:role/admin\n")?;
    ///
    /// let config = Config::new("dev").with_config_file(&file).with_role_from_profile().await?;
    /// assert_eq!(config.cache_key()?.scheme(), KeyScheme::ProfileAndRole);
    /// # std::fs::remove_dir_all(&dir)?;
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`MfaCacheError::Configuration`] if the config file exists but
    /// cannot be read or parsed. A missing file leaves the config unchanged.
    pub async fn with_role_from_profile(mut self) -> Result<Self> {
        if self.role_arn.is_some() {
            return Ok(self);
        }
        let path = self.config_file_path()?;
        self.role_arn = crate::profile::read_role_arn(&path, &self.profile).await?;
        Ok(self)
    }

    /// Derives the cache identity from profile and optional role.
    ///
    /// # Errors
    ///
    /// Returns [`MfaCacheError::Configuration`](crate::MfaCacheError::Configuration)
    /// if the profile or role is malformed.
    pub fn cache_key(&self) -> Result<CacheKey> {
        match &self.role_arn {
            Some(arn) => CacheKey::with_role(self.profile.clone(), arn),
            None => CacheKey::profile(self.profile.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::KeyScheme;
    use std::collections::HashMap;

    #[test]
    fn test_config_builder() {
        let config = Config::new("prod")
            .with_role_arn("arn:aws:iam::1:role/admin")
            .with_region("us-west-2")
            .with_duration(Duration::from_secs(3600))
            .with_mode(Mode::Interactive);

        assert_eq!(config.profile, "prod");
        assert_eq!(config.region.as_deref(), Some("us-west-2"));
        assert_eq!(config.duration, Duration::from_secs(3600));
        assert_eq!(config.mode, Mode::Interactive);
        assert_eq!(config.cache_key().unwrap().scheme(), KeyScheme::ProfileAndRole);
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.profile, "default");
        assert_eq!(config.duration, Duration::from_secs(900));
        assert_eq!(config.mode, Mode::NonInteractive);
        assert!(config.cache_dir.is_none());
    }

    #[test]
    fn test_from_lookup() {
        let vars: HashMap<&str, &str> = [("AWS_PROFILE", "staging"), ("AWS_REGION", "eu-central-1")]
            .into_iter()
            .collect();
        let config = Config::from_lookup(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.profile, "staging");
        assert_eq!(config.region.as_deref(), Some("eu-central-1"));
        assert!(config.mfa_serial.is_none());
    }

    #[test]
    fn test_empty_profile_falls_back_to_default() {
        let config = Config::from_lookup(|k| (k == "AWS_PROFILE").then(String::new));
        assert_eq!(config.profile, DEFAULT_PROFILE);

        let config = Config::from_lookup(|_| None);
        assert_eq!(config.profile, DEFAULT_PROFILE);
    }

    #[test]
    fn test_config_file_defaults_under_base_dir() {
        let config = Config::new("dev").with_cache_dir("/srv/home");
        assert_eq!(
            config.config_file_path().unwrap(),
            PathBuf::from("/srv/home/.aws/config")
        );

        let config = Config::from_lookup(|k| (k == "AWS_CONFIG_FILE").then(|| "/etc/aws".to_string()));
        assert_eq!(config.config_file_path().unwrap(), PathBuf::from("/etc/aws"));
    }

    #[tokio::test]
    async fn test_role_from_profile() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(".aws")).unwrap();
        std::fs::write(
            dir.path().join(".aws").join("config"),
            "[profile dev]\nrole_arn = arn:aws:iam::123456789012:role/admin\n\n[profile plain]\nregion = us-east-1\n",
        )
        .unwrap();

        let dev = Config::new("dev")
            .with_cache_dir(dir.path())
            .with_role_from_profile()
            .await
            .unwrap();
        assert_eq!(
            dev.cache_key().unwrap().file_stem(),
            "dev--arn_aws_iam__123456789012_role-admin"
        );

        let plain = Config::new("plain")
            .with_cache_dir(dir.path())
            .with_role_from_profile()
            .await
            .unwrap();
        assert_eq!(plain.cache_key().unwrap().scheme(), KeyScheme::Profile);
    }

    #[tokio::test]
    async fn test_explicit_role_wins_over_profile() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("config");
        std::fs::write(&file, "[profile dev]\nrole_arn = arn:aws:iam::1:role/other\n").unwrap();

        let config = Config::new("dev")
            .with_config_file(&file)
            .with_role_arn("arn:aws:iam::1:role/admin")
            .with_role_from_profile()
            .await
            .unwrap();
        assert_eq!(config.role_arn.as_deref(), Some("arn:aws:iam::1:role/admin"));
    }

    #[tokio::test]
    async fn test_missing_config_file_keeps_profile_key() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::new("dev")
            .with_cache_dir(dir.path())
            .with_role_from_profile()
            .await
            .unwrap();
        assert!(config.role_arn.is_none());
    }

    #[test]
    fn test_malformed_profile_is_configuration_error() {
        let err = Config::new("a/b").cache_key().unwrap_err();
        assert!(matches!(err, crate::MfaCacheError::Configuration(_)));
    }
}
