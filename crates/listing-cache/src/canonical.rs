//! Canonical byte encoding fed straight into SHA-256

use sha2::{Digest, Sha256};

/// Streams length-prefixed fields into a SHA-256 digest
///
/// Every field is written as its byte length (u64, big-endian) followed by
/// its bytes, so `("ab", "c")` and `("a", "bc")` never encode the same.
/// Single-byte tags mark optional values and record boundaries.
pub struct CanonicalEncoder {
    hasher: Sha256,
}

impl CanonicalEncoder {
    pub fn new() -> Self {
        Self {
            hasher: Sha256::new(),
        }
    }

    /// Encoder whose output is scoped to a domain label
    pub fn with_domain(domain: &str) -> Self {
        let mut encoder = Self::new();
        encoder.field(domain);
        encoder
    }

    pub fn field(&mut self, value: &str) {
        self.hasher.update((value.len() as u64).to_be_bytes());
        self.hasher.update(value.as_bytes());
    }

    pub fn optional_field(&mut self, value: Option<&str>) {
        match value {
            Some(v) => {
                self.tag(1);
                self.field(v);
            }
            None => self.tag(0),
        }
    }

    pub fn tag(&mut self, tag: u8) {
        self.hasher.update([tag]);
    }

    /// Finish and return the lowercase hex digest
    pub fn finish(self) -> String {
        hex::encode(self.hasher.finalize())
    }
}

impl Default for CanonicalEncoder {
    fn default() -> Self {
        Self::new()
    }
}
