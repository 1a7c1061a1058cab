//! One-time MFA code prompts.

use crate::{MfaCacheError, Result};
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

/// Obtains a one-time MFA code for a device.
#[async_trait]
pub trait TokenPrompt: Send + Sync {
    /// Returns a validated six-digit code for the device `serial`.
    async fn read_token(&self, serial: &str) -> Result<String>;
}

/// Prompts on stderr and reads the code from stdin.
///
/// Blocks until a line is entered or stdin closes; there is no timeout.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdinPrompt;

#[async_trait]
impl TokenPrompt for StdinPrompt {
    async fn read_token(&self, serial: &str) -> Result<String> {
        let mut stderr = tokio::io::stderr();
        stderr
            .write_all(format!("Enter MFA code for {serial}: ").as_bytes())
            .await?;
        stderr.flush().await?;

        let mut line = String::new();
        let read = BufReader::new(tokio::io::stdin()).read_line(&mut line).await?;
        if read == 0 {
            return Err(MfaCacheError::UpstreamAuth(
                "no MFA code provided (stdin closed)".to_string(),
            ));
        }

        validate_token_code(&line)
    }
}

/// Refuses to prompt. Used by unattended callers that must never block.
#[derive(Debug, Clone, Copy, Default)]
pub struct NonInteractivePrompt;

#[async_trait]
impl TokenPrompt for NonInteractivePrompt {
    async fn read_token(&self, serial: &str) -> Result<String> {
        Err(MfaCacheError::UpstreamAuth(format!(
            "authentication required: an MFA code for {serial} is needed but prompting is disabled"
        )))
    }
}

/// Returns a code supplied up front (e.g. from a `--token-code` flag).
#[derive(Debug, Clone)]
pub struct StaticPrompt {
    code: String,
}

impl StaticPrompt {
    pub fn new(code: impl Into<String>) -> Self {
        Self { code: code.into() }
    }
}

#[async_trait]
impl TokenPrompt for StaticPrompt {
    async fn read_token(&self, _serial: &str) -> Result<String> {
        validate_token_code(&self.code)
    }
}

/// Trims and checks that `raw` is a six-digit code.
///
/// # Example
///
/// ```
/// use mfacache::prompt::validate_token_code;
///
/// assert_eq!(validate_token_code(" 123456\n").unwrap(), "123456");
/// assert!(validate_token_code("12345").is_err());
/// ```
pub fn validate_token_code(raw: &str) -> Result<String> {
    let code = raw.trim();
    if code.len() != 6 || !code.chars().all(|c| c.is_ascii_digit()) {
        return Err(MfaCacheError::UpstreamAuth(
            "MFA code must be exactly six digits".to_string(),
        ));
    }
    Ok(code.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_token_code() {
        assert_eq!(validate_token_code("000111").unwrap(), "000111");
        assert_eq!(validate_token_code("  987654\r\n").unwrap(), "987654");
        assert!(validate_token_code("").is_err());
        assert!(validate_token_code("1234567").is_err());
        assert!(validate_token_code("12a456").is_err());
    }

    #[tokio::test]
    async fn test_non_interactive_prompt_fails_fast() {
        let err = NonInteractivePrompt
            .read_token("arn:aws:iam::1:mfa/me")
            .await
            .unwrap_err();
        assert!(matches!(err, MfaCacheError::UpstreamAuth(_)));
        assert!(err.to_string().contains("authentication required"));
    }

    #[tokio::test]
    async fn test_static_prompt() {
        assert_eq!(StaticPrompt::new("123456").read_token("x").await.unwrap(), "123456");
        assert!(StaticPrompt::new("nope").read_token("x").await.is_err());
    }
}
