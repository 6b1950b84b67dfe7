pub mod string;

pub use string::SecretString;

use sdk::errors::EngineError;

/// Reads an API key from the environment variable named in config.
///
/// # Errors
/// Returns `EngineError::Config` if the variable is unset or blank. The
/// message names the variable, never its value.
pub fn secret_from_env(var: &str) -> Result<SecretString, EngineError> {
    match std::env::var(var) {
        Ok(value) if !value.trim().is_empty() => {
            tracing::debug!("Loaded secret from ${}", var);
            Ok(SecretString::new(value.trim()))
        }
        Ok(_) => Err(EngineError::Config(format!(
            "Environment variable {} is empty",
            var
        ))),
        Err(_) => Err(EngineError::Config(format!(
            "Environment variable {} is not set",
            var
        ))),
    }
}

/// Scrubs a known secret from text by replacing it with [REDACTED].
///
/// Provider error bodies sometimes echo the request headers back, so every
/// upstream message passes through here before it is logged or surfaced.
///
/// # Examples
/// ```
/// use augur_engine::secrets::{scrub, SecretString};
///
/// let key = SecretString::new("esecret_1234567890");
/// let scrubbed = scrub("invalid key esecret_1234567890", Some(&key));
/// assert_eq!(scrubbed, "invalid key [REDACTED]");
/// ```
pub fn scrub(text: &str, secret: Option<&SecretString>) -> String {
    match secret {
        Some(secret) if !secret.is_empty() => text.replace(secret.unsecure(), "[REDACTED]"),
        _ => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_from_env_missing() {
        let err = secret_from_env("AUGUR_TEST_SURELY_UNSET_KEY").unwrap_err();
        assert!(matches!(
            err,
            EngineError::Config(ref m) if m.contains("AUGUR_TEST_SURELY_UNSET_KEY")
        ));
    }

    #[test]
    fn test_secret_from_env_present() {
        std::env::set_var("AUGUR_TEST_SECRET_PRESENT", " sk-test-value ");
        let secret = secret_from_env("AUGUR_TEST_SECRET_PRESENT").unwrap();
        assert_eq!(secret.unsecure(), "sk-test-value");
        std::env::remove_var("AUGUR_TEST_SECRET_PRESENT");
    }

    #[test]
    fn test_secret_from_env_blank() {
        std::env::set_var("AUGUR_TEST_SECRET_BLANK", "   ");
        assert!(secret_from_env("AUGUR_TEST_SECRET_BLANK").is_err());
        std::env::remove_var("AUGUR_TEST_SECRET_BLANK");
    }

    #[test]
    fn test_scrub_replaces_every_occurrence() {
        let key = SecretString::new("sk-abcdefghijklmnop");
        let text = "key sk-abcdefghijklmnop rejected (sk-abcdefghijklmnop)";
        assert_eq!(
            scrub(text, Some(&key)),
            "key [REDACTED] rejected ([REDACTED])"
        );
    }

    #[test]
    fn test_scrub_without_secret_is_identity() {
        assert_eq!(scrub("plain text", None), "plain text");
        let blank = SecretString::new("");
        assert_eq!(scrub("plain text", Some(&blank)), "plain text");
    }
}
