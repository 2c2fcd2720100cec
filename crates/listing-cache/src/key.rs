//! Cache key derivation

use crate::canonical::CanonicalEncoder;

const KEY_DOMAIN: &str = "listing-key/v1";

/// Derive the cache key for one listing page
///
/// Covers exactly `(namespace, page_size, cursor)`; an absent cursor is
/// encoded distinctly from an empty one.
pub fn cache_key(namespace: &str, page_size: u32, cursor: Option<&str>) -> String {
    let mut encoder = CanonicalEncoder::with_domain(KEY_DOMAIN);
    encoder.field(namespace);
    encoder.field(&page_size.to_string());
    encoder.optional_field(cursor);
    encoder.finish()
}
