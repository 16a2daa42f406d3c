//! Wrapper for sensitive values.
//!
//! [`Secret`] holds passwords and bearer tokens. It never prints its value
//! through `Debug` or `Display`, and the buffer is zeroed when dropped.
//!
//! # Example
//!
//! ```
//! use tsscred_core::Secret;
//!
//! let password = Secret::new("s3cret");
//! assert_eq!(format!("{password:?}"), "Secret([REDACTED])");
//! assert_eq!(password.expose(), "s3cret");
//! ```

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A secret value that prevents accidental exposure in logs.
///
/// The inner value is only accessible via [`expose()`](Secret::expose).
/// Serializing a `Secret` writes the raw value, so only types handed to the
/// host platform should serialize one.
#[derive(Clone, Default, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    /// Create a new secret from a string value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Expose the secret value.
    ///
    /// Use sparingly and never log the result.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Whether the secret is the empty string.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Secret([REDACTED])")
    }
}

impl std::fmt::Display for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl PartialEq for Secret {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Secret {}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_redacted_in_debug_and_display() {
        let secret = Secret::new("hunter2");
        assert_eq!(format!("{:?}", secret), "Secret([REDACTED])");
        assert_eq!(format!("{}", secret), "[REDACTED]");
        assert!(!format!("{:?} {}", secret, secret).contains("hunter2"));
    }

    #[test]
    fn test_secret_serializes_transparently() {
        let secret = Secret::new("abc123");
        assert_eq!(serde_json::to_string(&secret).unwrap(), "\"abc123\"");

        let parsed: Secret = serde_json::from_str("\"abc123\"").unwrap();
        assert_eq!(parsed, secret);
    }

    #[test]
    fn test_secret_zeroize_clears_value() {
        let mut secret = Secret::new("abc123");
        secret.zeroize();
        assert!(secret.is_empty());
    }
}
