//! Content fingerprints used as ETags

use crate::canonical::CanonicalEncoder;

/// Fingerprint of an empty listing: SHA-256 of zero bytes, quoted
pub const EMPTY_FINGERPRINT: &str =
    "\"e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855\"";

const RECORD_START: u8 = 0x1e;

/// A record that knows its own canonical field order
pub trait CanonicalRecord {
    fn write_canonical(&self, encoder: &mut CanonicalEncoder);
}

/// Quoted strong ETag over an ordered sequence of records
pub fn fingerprint<R: CanonicalRecord>(records: &[R]) -> String {
    if records.is_empty() {
        return EMPTY_FINGERPRINT.to_string();
    }

    let mut encoder = CanonicalEncoder::new();
    for record in records {
        encoder.tag(RECORD_START);
        record.write_canonical(&mut encoder);
    }
    format!("\"{}\"", encoder.finish())
}
