//! Redacting wrapper for credentials.

use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer};

/// A credential value that never prints itself.
///
/// Client secrets, access keys, passwords and bearer tokens are held in a
/// `SecretString`, so `Debug` output and tracing fields show `[REDACTED]`
/// and memory is zeroed on drop.
#[derive(Clone)]
pub struct SecretValue {
    inner: SecretString,
}

impl SecretValue {
    /// Creates a new secret value from a string.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            inner: SecretString::from(value.into()),
        }
    }

    /// Exposes the secret value for use.
    ///
    /// The returned reference must not be logged or persisted.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.inner.expose_secret()
    }

    /// Returns true if the secret value is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.expose_secret().is_empty()
    }

    /// A short masked preview suitable for console tables.
    ///
    /// Shows the first four characters followed by an ellipsis; values of
    /// eight characters or fewer are fully masked.
    #[must_use]
    pub fn preview(&self) -> String {
        let value = self.inner.expose_secret();
        if value.chars().count() <= 8 {
            return "********".to_owned();
        }
        let head: String = value.chars().take(4).collect();
        format!("{head}...")
    }
}

impl fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl From<String> for SecretValue {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for SecretValue {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl<'de> Deserialize<'de> for SecretValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::new)
    }
}
