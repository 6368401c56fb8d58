//! Credential wrappers built on the secrecy crate
//!
//! The provider API key, the InfluxDB token and the optional InfluxDB 1.x
//! password are held as [`SecretString`]. The value is zeroed on drop, Debug
//! output is redacted, and reading it requires an explicit `expose_secret()`.
//!
//! ```rust
//! use octograph::config::secret_string;
//! use secrecy::ExposeSecret;
//!
//! let api_key = secret_string("sk_live_abc".to_string());
//! assert_eq!(api_key.expose_secret().as_ref(), "sk_live_abc");
//! assert!(!format!("{api_key:?}").contains("sk_live_abc"));
//! ```

use secrecy::{CloneableSecret, DebugSecret, Secret};
use serde::{Deserialize, Deserializer};
use zeroize::Zeroize;

/// String payload of a secret
#[derive(Clone, Debug, Zeroize)]
#[zeroize(drop)]
pub struct SecretValue(String);

impl CloneableSecret for SecretValue {}
impl DebugSecret for SecretValue {}

impl From<String> for SecretValue {
    fn from(s: String) -> Self {
        SecretValue(s)
    }
}

impl PartialEq<str> for SecretValue {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl AsRef<str> for SecretValue {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl SecretValue {
    /// Whether the secret is empty or only whitespace
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl<'de> Deserialize<'de> for SecretValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(SecretValue)
    }
}

/// A string that is zeroed on drop and redacted in Debug output
pub type SecretString = Secret<SecretValue>;

/// Wrap a plain string as a [`SecretString`]
#[inline]
pub fn secret_string(value: String) -> SecretString {
    Secret::new(SecretValue::from(value))
}
