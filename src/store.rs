//! File-backed credential store.
//!
//! One JSON file per identity under a fixed base directory (the user's home
//! directory by default):
//!
//! - `~/.aws/mfacache/aws-profile-<profile>.json` for plain MFA sessions
//! - `~/.aws/cli/cache/<profile>--<role>.json` for role-qualified sessions
//!
//! # Security
//!
//! - Cache directories are created with mode 0700 (owner access only)
//! - Cache files are created with mode 0600 (owner read/write only)
//! - Secrets never appear in logs or error messages
//!
//! Writes go to a temporary file in the same directory which is then renamed
//! over the target, so a reader sees either the old record or the new one.
//! There is no cross-process locking: concurrent writers race and the last
//! rename wins.

use crate::{CacheKey, CachedSession, Config, MfaCacheError, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Persists cached sessions keyed by [`CacheKey`].
///
/// # Example
///
/// ```no_run
/// use chrono::{Duration, Utc};
/// use mfacache::{CacheKey, CacheStore, CachedSession, CredentialRecord};
///
/// #[tokio::main]
/// async fn main() -> mfacache::Result<()> {
///     let store = CacheStore::new("/tmp/mfacache-demo");
///     let key = CacheKey::profile("dev")?;
///
///     let record = CredentialRecord::new("ASIA...", "secret", "token", Utc::now() + Duration::hours(1));
///     store.write(&key, &CachedSession::new(record)).await?;
///
///     let cached = store.read(&key).await?;
///     println!("cached until {}", cached.credentials.expiration());
///
///     store.delete(&key).await?;
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CacheStore {
    base_dir: PathBuf,
}

impl CacheStore {
    /// Creates a store rooted at `base_dir`.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Creates a store rooted at the configured cache directory, or the
    /// home directory when none is configured.
    ///
    /// # Errors
    ///
    /// Returns [`MfaCacheError::Configuration`] if no cache directory is
    /// configured and the home directory cannot be determined.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(config.base_dir()?))
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Maps an identity to its cache file. Pure; touches nothing on disk.
    pub fn resolve_path(&self, key: &CacheKey) -> PathBuf {
        self.base_dir
            .join(key.relative_dir())
            .join(format!("{}.json", key.file_stem()))
    }

    /// Reads the cached session for `key`.
    ///
    /// # Errors
    ///
    /// - [`MfaCacheError::NotFound`]: no cache file exists
    /// - [`MfaCacheError::Decode`]: the file exists but is not a complete record
    /// - [`MfaCacheError::Unreadable`]: the path exists but could not be read
    pub async fn read(&self, key: &CacheKey) -> Result<CachedSession> {
        let path = self.resolve_path(key);

        let data = match fs::read(&path).await {
            Ok(d) => d,
            Err(e) if is_absent(&e) => {
                return Err(MfaCacheError::NotFound {
                    identity: key.to_string(),
                    path,
                })
            }
            Err(source) => return Err(MfaCacheError::Unreadable { path, source }),
        };

        let session =
            CachedSession::from_json(&data).map_err(|e| MfaCacheError::decode(&path, e))?;

        if let Err(field) = session.credentials.ensure_complete() {
            return Err(MfaCacheError::invalid_record(
                &path,
                format!("{field} is empty"),
            ));
        }

        debug!(identity = %key, path = %path.display(), "read cached credentials");
        Ok(session)
    }

    /// Writes `session` as the cached record for `key`, replacing any
    /// previous record.
    ///
    /// Missing directories are created; an existing directory is not an
    /// error. Returns the path written.
    ///
    /// # Errors
    ///
    /// Returns [`MfaCacheError::CacheWrite`] if encoding or any filesystem step
    /// fails.
    pub async fn write(&self, key: &CacheKey, session: &CachedSession) -> Result<PathBuf> {
        let path = self.resolve_path(key);
        let json = session
            .to_json(key.layout())
            .map_err(|e| MfaCacheError::cache_write(&path, e))?;

        let dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.base_dir.clone());
        create_private_dir(&dir)
            .await
            .map_err(|e| MfaCacheError::cache_write(&dir, e))?;

        let tmp = dir.join(format!(".{}.{}.tmp", key.file_stem(), uuid::Uuid::new_v4()));
        if let Err(source) = write_private_file(&tmp, &json).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(MfaCacheError::cache_write(path, source));
        }

        if let Err(source) = fs::rename(&tmp, &path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(MfaCacheError::cache_write(path, source));
        }

        debug!(
            identity = %key,
            path = %path.display(),
            expires = %session.credentials.expiration(),
            "cached credentials"
        );
        Ok(path)
    }

    /// Removes the cached record for `key`.
    ///
    /// Idempotent: deleting an absent record is not an error. Returns
    /// whether a file was actually removed.
    pub async fn delete(&self, key: &CacheKey) -> Result<bool> {
        let path = self.resolve_path(key);
        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!(identity = %key, path = %path.display(), "deleted cached credentials");
                Ok(true)
            }
            Err(e) if is_absent(&e) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

/// A missing file, or a path component that is not a directory.
fn is_absent(e: &std::io::Error) -> bool {
    matches!(e.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory)
}

async fn create_private_dir(dir: &Path) -> std::io::Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);

    #[cfg(unix)]
    builder.mode(0o700);

    builder.create(dir).await?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(dir, std::fs::Permissions::from_mode(0o700)).await?;
    }

    Ok(())
}

async fn write_private_file(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);

    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options.open(path).await?;
    file.write_all(contents).await?;
    file.flush().await?;
    file.sync_all().await?;
    Ok(())
}
