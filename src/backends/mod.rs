//! Backend implementations: upstream sources paired with client connectors.

#[cfg(feature = "mock")]
pub mod mock;

#[cfg(feature = "aws")]
pub mod aws;
