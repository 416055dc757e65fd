//! Content digests
//!
//! Redactions carry a keyed digest of the text they replaced so that equal
//! values can be correlated across messages without storing them. The raw
//! input is fingerprinted with an unkeyed SHA-256.

use crate::config::PiiKey;
use crate::domain::{MailprepError, Result};
use hmac::{Hmac, Mac};
use secrecy::ExposeSecret;
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

/// Hex characters kept from the keyed digest
pub const CONTENT_HASH_LEN: usize = 16;

/// Keyed HMAC-SHA256 hasher
#[derive(Clone)]
pub struct ContentHasher {
    mac: HmacSha256,
}

impl std::fmt::Debug for ContentHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentHasher").finish_non_exhaustive()
    }
}

impl ContentHasher {
    /// Build a hasher for `key`
    pub fn new(key: &PiiKey) -> Result<Self> {
        let material = key.expose_secret();
        if material.is_empty() {
            return Err(MailprepError::Configuration(
                "PII hashing key cannot be empty".to_string(),
            ));
        }
        let mac = HmacSha256::new_from_slice(material.as_bytes())
            .map_err(|e| MailprepError::Configuration(format!("Invalid PII hashing key: {e}")))?;
        Ok(Self { mac })
    }

    /// HMAC-SHA256 of `value`, hex, truncated to [`CONTENT_HASH_LEN`]
    pub fn hash(&self, value: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(value.as_bytes());
        let digest = format!("{:x}", mac.finalize().into_bytes());
        digest[..CONTENT_HASH_LEN].to_string()
    }
}

/// Unkeyed SHA-256 hex of raw input bytes
pub fn original_hash(input: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input);
    let result = hasher.finalize();
    format!("{result:x}")
}
