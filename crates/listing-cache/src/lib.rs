//! In-memory listing cache
//!
//! Stores listing payloads under deterministic keys with a fresh TTL and a
//! stale retention window, bounded to a maximum number of entries. Eviction
//! runs lazily when callers ask for it; there is no background sweeper.
//! Also provides the canonical hashing used for cache keys and ETags.

mod canonical;
mod error;
mod fingerprint;
mod key;
mod store;
mod types;

pub use canonical::CanonicalEncoder;
pub use error::{CacheError, Result};
pub use fingerprint::{fingerprint, CanonicalRecord, EMPTY_FINGERPRINT};
pub use key::cache_key;
pub use store::CacheStore;
pub use types::CacheEntry;
