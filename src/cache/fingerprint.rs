//! Content fingerprints for the embedding cache.
//!
//! A fingerprint is a SHA-256 digest over the embedding provider's
//! identity and the normalized content, so the same text embedded by two
//! different providers (or model versions) never collides into one cache
//! slot.

use sha2::{Digest, Sha256};
use std::fmt;

/// A deterministic cache key for (content, provider) pairs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Compute the fingerprint of `content` as embedded by `provider`.
    ///
    /// Content is normalized first: surrounding whitespace trimmed,
    /// internal whitespace runs collapsed to a single space. Formatting
    /// noise should not defeat the cache.
    pub fn compute(content: &str, provider: &str) -> Self {
        let normalized = normalize(content);
        let mut hasher = Sha256::new();
        hasher.update(provider.as_bytes());
        hasher.update([0u8]);
        hasher.update(normalized.as_bytes());
        let digest = hasher.finalize();
        let hex = digest.iter().fold(String::with_capacity(64), |mut s, b| {
            use fmt::Write;
            let _ = write!(s, "{:02x}", b);
            s
        });
        Fingerprint(hex)
    }

    /// The hex digest, used as the store field name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn normalize(content: &str) -> String {
    content.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic() {
        let a = Fingerprint::compute("hello world", "prov/1");
        let b = Fingerprint::compute("hello world", "prov/1");
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 64);
    }

    #[test]
    fn whitespace_noise_is_normalized_away() {
        let a = Fingerprint::compute("  hello   world \n", "prov/1");
        let b = Fingerprint::compute("hello world", "prov/1");
        assert_eq!(a, b);
    }

    #[test]
    fn provider_identity_separates_keys() {
        let a = Fingerprint::compute("hello", "prov/1");
        let b = Fingerprint::compute("hello", "prov/2");
        assert_ne!(a, b);
    }

    #[test]
    fn content_is_not_confusable_with_identity() {
        let a = Fingerprint::compute("b", "a");
        let b = Fingerprint::compute("a", "b");
        assert_ne!(a, b);
    }
}
