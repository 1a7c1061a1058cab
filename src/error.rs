//! Error types for mfacache operations.

use chrono::{DateTime, Utc};
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using [`MfaCacheError`].
pub type Result<T> = std::result::Result<T, MfaCacheError>;

/// Errors that can occur while resolving, caching, or validating credentials.
///
/// None of these variants ever carry secret material in their messages.
#[derive(Debug, Error)]
pub enum MfaCacheError {
    /// The environment cannot support the operation (no home directory,
    /// malformed profile or role identifier). Never retried.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// No cached record exists for the identity.
    #[error("no cached credentials for {identity} ({})", path.display())]
    NotFound {
        /// Cache identity
        identity: String,
        /// File that was looked up
        path: PathBuf,
    },

    /// The cache file exists but does not hold a usable record.
    #[error("cache file {} is unreadable: {reason}", path.display())]
    Decode {
        /// Offending cache file
        path: PathBuf,
        /// What was wrong with it
        reason: String,
        /// Parser error, when the failure came from JSON decoding
        #[source]
        source: Option<serde_json::Error>,
    },

    /// The cache file exists but could not be read (permissions, a directory
    /// in its place, an I/O fault).
    #[error("cache file {} could not be read: {source}", path.display())]
    Unreadable {
        /// Offending cache file
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// The record exists but its expiration has passed.
    #[error("cached credentials for {identity} expired at {expired_at}")]
    Expired {
        /// Cache identity
        identity: String,
        /// When the record stopped being valid
        expired_at: DateTime<Utc>,
    },

    /// Minting fresh credentials failed (token rejected, no prompt available).
    #[error("authentication failed: {0}")]
    UpstreamAuth(String),

    /// Persisting a freshly minted record failed.
    #[error("failed to write cache file {}: {source}", path.display())]
    CacheWrite {
        /// Target cache file
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// The cloud API rejected credentials that looked valid locally.
    #[error("credential validation failed: {0}")]
    Validation(String),

    /// I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other error (catch-all).
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MfaCacheError {
    /// Creates a decode error from a JSON parse failure.
    pub fn decode(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Decode {
            path: path.into(),
            reason: source.to_string(),
            source: Some(source),
        }
    }

    /// Creates a decode error for a structurally valid but unusable record.
    pub fn invalid_record(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Decode {
            path: path.into(),
            reason: reason.into(),
            source: None,
        }
    }

    /// Creates a cache write error. Encoding failures are accepted too, so
    /// every failure on the write path classifies the same way.
    pub fn cache_write(path: impl Into<PathBuf>, source: impl Into<std::io::Error>) -> Self {
        Self::CacheWrite {
            path: path.into(),
            source: source.into(),
        }
    }

    /// True when no cached record exists.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// True for the read failures a refresh-capable caller may treat as an
    /// absent record: nothing cached, a file that cannot be read, or one that
    /// cannot be decoded.
    pub fn is_cache_miss(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. } | Self::Unreadable { .. } | Self::Decode { .. }
        )
    }

    /// True for errors that must abort the whole operation.
    ///
    /// Only [`CacheWrite`](Self::CacheWrite) is downgraded to a warning, and
    /// only by the provider after a successful mint.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::CacheWrite { .. })
    }
}
