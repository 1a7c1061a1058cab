//! AWS STS integration tests.
//!
//! These tests mint real credentials and need a profile with long-lived keys,
//! an MFA device and a current one-time code.
//!
//! Run with:
//!   MFA_TEST_PROFILE=dev AWS_MFA_SERIAL=arn:aws:iam::123:mfa/me MFA_TEST_CODE=123456 \
//!     cargo test --test integration_sts --features aws -- --ignored

#![cfg(feature = "aws")]

use mfacache::backends::aws::{StsConnector, StsSource};
use mfacache::prompt::StaticPrompt;
use mfacache::{CacheStore, Config, Mode, SessionFactory};

fn live_config(dir: &std::path::Path) -> Config {
    let profile = std::env::var("MFA_TEST_PROFILE").unwrap_or_else(|_| "default".to_string());
    let serial = std::env::var("AWS_MFA_SERIAL").expect("AWS_MFA_SERIAL must be set");

    Config::new(profile)
        .with_mfa_serial(serial)
        .with_cache_dir(dir)
        .with_mode(Mode::Interactive)
}

#[tokio::test]
#[ignore] // Run only with real AWS credentials and a fresh MFA code
async fn test_sts_set_then_reuse() {
    let dir = tempfile::tempdir().unwrap();
    let config = live_config(dir.path());
    let key = config.cache_key().unwrap();
    let code = std::env::var("MFA_TEST_CODE").expect("MFA_TEST_CODE must be set");

    let mut factory = SessionFactory::new(
        &config,
        CacheStore::from_config(&config).unwrap(),
        StsSource::from_config(&config, Box::new(StaticPrompt::new(code))).unwrap(),
        StsConnector::from_config(&config),
    );

    let session = factory.build_session(&key).await.expect("failed to mint");
    assert!(session.caller().arn.is_some());

    // Served from cache: the one-time code must not be needed again.
    let again = factory.build_session(&key).await.expect("failed to reuse");
    assert_eq!(again.credentials(), session.credentials());
}
