//! Identity validation, so a profile or role can never escape the cache
//! directory once it becomes part of a file name.

use crate::{MfaCacheError, Result};

/// Characters that must not appear in a profile name.
const FORBIDDEN_CHARS: &str = "/\\:*?\"<>|";

/// Maximum allowed length for profile names and role identifiers.
const MAX_NAME_LENGTH: usize = 255;

/// Validates a profile name.
///
/// Rejects:
/// - Empty names
/// - Excessive length (>255 characters)
/// - Null bytes and control characters
/// - Path separators and characters that are not portable in file names
/// - The relative path components `.` and `..`
///
/// # Errors
///
/// Returns [`MfaCacheError::Configuration`] if validation fails.
///
/// # Example
///
/// ```
/// use mfacache::validation::validate_profile_name;
///
/// assert!(validate_profile_name("default").is_ok());
/// assert!(validate_profile_name("prod.admin_mfa").is_ok());
///
/// assert!(validate_profile_name("").is_err());
/// assert!(validate_profile_name("../../etc/passwd").is_err());
/// ```
pub fn validate_profile_name(name: &str) -> Result<()> {
    check_common("profile name", name)?;

    if name == "." || name == ".." {
        return Err(MfaCacheError::Configuration(format!(
            "invalid profile name: {name:?} is a relative path component"
        )));
    }

    if name.chars().any(|c| FORBIDDEN_CHARS.contains(c) || c.is_whitespace()) {
        return Err(MfaCacheError::Configuration(format!(
            "invalid profile name: {name:?} contains forbidden characters (not allowed: whitespace {FORBIDDEN_CHARS})"
        )));
    }

    Ok(())
}

/// Validates a role identifier.
///
/// Only ARN-shaped values are accepted; the separators inside them are
/// normalized away when the identifier becomes part of a cache key.
pub fn validate_role_arn(arn: &str) -> Result<()> {
    check_common("role ARN", arn)?;

    if !arn.starts_with("arn:") {
        return Err(MfaCacheError::Configuration(format!(
            "invalid role ARN: {arn:?} does not start with \"arn:\""
        )));
    }

    if arn.chars().any(char::is_whitespace) {
        return Err(MfaCacheError::Configuration(format!(
            "invalid role ARN: {arn:?} contains whitespace"
        )));
    }

    Ok(())
}

fn check_common(what: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(MfaCacheError::Configuration(format!(
            "invalid {what}: cannot be empty"
        )));
    }

    if value.len() > MAX_NAME_LENGTH {
        return Err(MfaCacheError::Configuration(format!(
            "invalid {what}: exceeds maximum length of {MAX_NAME_LENGTH} characters"
        )));
    }

    if value.contains('\0') {
        return Err(MfaCacheError::Configuration(format!(
            "invalid {what}: contains null byte"
        )));
    }

    if value.chars().any(char::is_control) {
        return Err(MfaCacheError::Configuration(format!(
            "invalid {what}: contains control characters"
        )));
    }

    Ok(())
}
