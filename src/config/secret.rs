//! Secret handling for the PII hashing key
//!
//! The key is held in a `secrecy::Secret`, so it is zeroed on drop, redacted
//! in `Debug` output and only readable through `expose_secret()`. It is never
//! serialized back out.
//!
//! ```rust
//! use mailprep::config::pii_key;
//! use secrecy::ExposeSecret;
//!
//! let key = pii_key("k3y-material-with-enough-entropy".to_string());
//! assert_eq!(key.expose_secret().as_ref(), "k3y-material-with-enough-entropy");
//! assert!(!format!("{key:?}").contains("k3y"));
//! ```

use rand::distributions::Alphanumeric;
use rand::Rng;
use secrecy::{CloneableSecret, DebugSecret, Secret};
use serde::{Deserialize, Deserializer};
use zeroize::Zeroize;

/// Minimum key length in characters
pub const MIN_KEY_LENGTH: usize = 16;

/// Values that must never be used as a key
const PLACEHOLDER_KEYS: &[&str] = &[
    "changeme",
    "change-me",
    "example",
    "test",
    "placeholder",
    "secret",
    "your-salt-here",
    "your-key-here",
    "insert-key-here",
];

/// Raw key material
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct KeyMaterial(String);

impl CloneableSecret for KeyMaterial {}
impl DebugSecret for KeyMaterial {}

impl From<String> for KeyMaterial {
    fn from(s: String) -> Self {
        KeyMaterial(s)
    }
}

impl AsRef<str> for KeyMaterial {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl KeyMaterial {
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl<'de> Deserialize<'de> for KeyMaterial {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(KeyMaterial)
    }
}

/// Secret hashing key
pub type PiiKey = Secret<KeyMaterial>;

/// Wrap a string as a [`PiiKey`]
#[inline]
pub fn pii_key(value: String) -> PiiKey {
    Secret::new(KeyMaterial::from(value))
}

/// Check a key against the length and placeholder rules
///
/// The error message never contains the key.
pub fn validate_pii_key(key: &str) -> Result<(), String> {
    let trimmed = key.trim();
    if trimmed.is_empty() {
        return Err("pii_key cannot be empty".to_string());
    }

    let lowered = trimmed.to_lowercase();
    if PLACEHOLDER_KEYS
        .iter()
        .any(|placeholder| lowered == *placeholder)
        || lowered.contains("changeme")
        || lowered.contains("your-salt")
        || lowered.contains("your-key")
    {
        return Err("pii_key is a placeholder value, generate a real key".to_string());
    }

    if trimmed.chars().count() < MIN_KEY_LENGTH {
        return Err(format!(
            "pii_key must be at least {MIN_KEY_LENGTH} characters"
        ));
    }

    Ok(())
}

/// Generate a random alphanumeric key
pub fn generate_pii_key(length: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length.max(MIN_KEY_LENGTH))
        .map(char::from)
        .collect()
}
