//! mfacache - Expiring on-disk cache for MFA session credentials.
//!
//! Command-line tools that authenticate with an MFA device would otherwise
//! prompt for a one-time code on every run. mfacache mints temporary session
//! credentials once, stores them on disk tagged with an expiration time, and
//! serves them until they go stale.
//!
//! # Features
//!
//! - **Read-through cache**: one file read on the hot path, minting only on a
//!   miss or after expiry
//! - **Explicit expiry**: staleness is always decided against a UTC clock,
//!   never by the client library's view of its own credentials
//! - **Safe on disk**: owner-only permissions, atomic replace, strict decode
//! - **Two modes**: interactive (prompt for a code) or non-interactive (fail
//!   fast with an authentication-required error)
//! - **Feature Flags**: optional AWS STS integration and CLI
//!
//! # Quick Start
//!
//! ```
//! use mfacache::backends::mock::{MockConnector, MockSource};
//! use mfacache::{CacheStore, Config, Mode, SessionFactory};
//!
//! #[tokio::main]
//! async fn main() -> mfacache::Result<()> {
//!     let dir = std::env::temp_dir().join(format!("mfacache-quickstart-{}", std::process::id()));
//!     let config = Config::new("dev")
//!         .with_cache_dir(&dir)
//!         .with_mode(Mode::Interactive);
//!     let key = config.cache_key()?;
//!
//!     let mut factory = SessionFactory::new(
//!         &config,
//!         CacheStore::from_config(&config)?,
//!         MockSource::new(),
//!         MockConnector::new(),
//!     );
//!
//!     // First call mints and caches, the second is served from disk.
//!     factory.build_session(&key).await?;
//!     factory.build_session(&key).await?;
//!     assert_eq!(factory.provider().source().mint_count(), 1);
//!
//!     factory.provider().store().delete(&key).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Feature Flags
//!
//! | Feature | Default | Provides |
//! |---------|---------|----------|
//! | `mock` | yes | In-memory source and connector for tests |
//! | `aws` | no | STS source and SDK connector |
//! | `cli` | no | The `mfa` binary (also needs `aws`) |

pub mod backends;
pub mod config;
pub mod credential;
pub mod error;
pub mod expiry;
pub mod key;
pub mod profile;
pub mod prompt;
pub mod provider;
pub mod session;
pub mod source;
pub mod store;
pub mod summary;
pub mod validation;

pub use config::{Config, Mode};
pub use credential::{
    CacheLayout, CachedSession, CredentialRecord, ASSUME_ROLE_PROVIDER, SESSION_TOKEN_PROVIDER,
    STATIC_PROVIDER,
};
pub use error::{MfaCacheError, Result};
pub use expiry::{Clock, FixedClock, SystemClock};
pub use key::{CacheKey, KeyScheme};
pub use provider::{CachingProvider, Origin, Retrieval};
pub use session::{CallerIdentity, ClientConnector, Session, SessionFactory};
pub use source::UpstreamSource;
pub use store::CacheStore;
pub use summary::CacheSummary;
