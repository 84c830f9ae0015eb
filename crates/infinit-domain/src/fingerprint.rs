//! Content fingerprint value type

use serde::{Deserialize, Serialize};
use std::fmt;

/// A fixed-size digest over normalized document text, hex encoded.
///
/// Two documents with equal fingerprints carry the same content regardless
/// of whitespace or casing differences at scrape time.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Wrap an already-computed hex digest. Lowercases for stable equality.
    pub fn from_hex(hex: impl Into<String>) -> Self {
        let s: String = hex.into();
        Self(s.to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short prefix for log messages.
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(8)]
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_insensitive_equality() {
        assert_eq!(Fingerprint::from_hex("ABCD12"), Fingerprint::from_hex("abcd12"));
    }

    #[test]
    fn test_short_prefix() {
        assert_eq!(Fingerprint::from_hex("0123456789abcdef").short(), "01234567");
        assert_eq!(Fingerprint::from_hex("0af").short(), "0af");
    }
}
