//! Credential handling with secure memory.
//!
//! Uses the `secrecy` crate so API keys for search backends never end up
//! in logs, debug output, or error messages.

use secrecy::{ExposeSecret, SecretBox};
use std::fmt;

use crate::error::{ConfigError, ConfigResult};

/// A secret string that won't be logged or displayed.
pub struct SecretString(SecretBox<str>);

impl SecretString {
    pub fn new(value: impl Into<String>) -> Self {
        Self(SecretBox::new(Box::from(value.into().as_str())))
    }

    /// Expose the secret value for use.
    ///
    /// Only call this when actually sending the secret (e.g. in a request body).
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    pub fn is_empty(&self) -> bool {
        self.expose().trim().is_empty()
    }
}

impl Clone for SecretString {
    fn clone(&self) -> Self {
        Self::new(self.expose())
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// An API key for a hosted knowledge source, tagged with the variable it came from.
#[derive(Clone)]
pub struct ApiKey {
    pub key: SecretString,

    /// Environment variable name, kept for error messages.
    pub env_var: Option<String>,
}

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: SecretString::new(key),
            env_var: None,
        }
    }

    /// Read the key from an environment variable (after loading `.env`).
    ///
    /// Missing and blank values are both rejected.
    pub fn from_env(var: &str) -> ConfigResult<Self> {
        let _ = dotenvy::dotenv();

        let value = std::env::var(var).map_err(|_| ConfigError::InvalidValue {
            key: var.to_string(),
            value: String::new(),
            reason: "not set".to_string(),
        })?;

        let key = SecretString::new(value);
        if key.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: var.to_string(),
                value: String::new(),
                reason: "empty".to_string(),
            });
        }

        Ok(Self {
            key,
            env_var: Some(var.to_string()),
        })
    }

    pub fn expose(&self) -> &str {
        self.key.expose()
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiKey")
            .field("key", &"[REDACTED]")
            .field("env_var", &self.env_var)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_not_in_debug() {
        let secret = SecretString::new("tvly-super-secret-key");
        let debug = format!("{:?}", secret);
        assert!(!debug.contains("tvly-super"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_secret_not_in_display() {
        let secret = SecretString::new("tvly-super-secret-key");
        assert_eq!(format!("{}", secret), "[REDACTED]");
    }

    #[test]
    fn test_expose_works() {
        let secret = SecretString::new("tvly-super-secret-key");
        assert_eq!(secret.expose(), "tvly-super-secret-key");
        assert!(!secret.is_empty());
        assert!(SecretString::new("  ").is_empty());
    }

    #[test]
    fn test_api_key_debug() {
        let key = ApiKey::new("tvly-secret");
        let debug = format!("{:?}", key);
        assert!(!debug.contains("tvly-secret"));
        assert!(debug.contains("ApiKey"));
    }

    #[test]
    fn test_api_key_from_missing_env() {
        let err = ApiKey::from_env("VERIFICATION_TEST_KEY_THAT_IS_NEVER_SET").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref reason, .. } if reason == "not set"));
    }
}
