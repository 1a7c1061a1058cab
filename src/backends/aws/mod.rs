//! AWS backend.
//!
//! Mints MFA session credentials through AWS STS and builds SDK
//! configurations that sign with the cached credentials.
//!
//! # Requirements
//!
//! - Long-lived credentials for the profile, configured via:
//!   - Shared credentials file (`~/.aws/credentials`)
//!   - Environment variables (`AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY`)
//! - An MFA device serial number (`AWS_MFA_SERIAL` or `--serial-number`)
//!
//! # Example
//!
//! ```no_run
//! use mfacache::backends::aws::{StsConnector, StsSource};
//! use mfacache::prompt::StdinPrompt;
//! use mfacache::{CacheStore, Config, Mode, SessionFactory};
//!
//! #[tokio::main]
//! async fn main() -> mfacache::Result<()> {
//!     let config = Config::from_env().with_mode(Mode::Interactive);
//!     let key = config.cache_key()?;
//!
//!     let mut factory = SessionFactory::new(
//!         &config,
//!         CacheStore::from_config(&config)?,
//!         StsSource::from_config(&config, Box::new(StdinPrompt))?,
//!         StsConnector::from_config(&config),
//!     );
//!
//!     let session = factory.build_session(&key).await?;
//!     let sdk_config = session.into_client();
//!     // aws_sdk_iam::Client::new(&sdk_config) ...
//!     # let _ = sdk_config;
//!     Ok(())
//! }
//! ```

mod connector;
mod source;

pub use connector::StsConnector;
pub use source::StsSource;
