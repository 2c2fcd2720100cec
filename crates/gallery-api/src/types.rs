//! Core types for the gallery listing API

use listing_cache::{CanonicalEncoder, CanonicalRecord};
use serde::Serialize;

/// One listed image with its public URLs
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaRecord {
    pub name: String,
    pub full_url: String,
    pub thumb_url: String,
}

impl CanonicalRecord for MediaRecord {
    fn write_canonical(&self, encoder: &mut CanonicalEncoder) {
        encoder.field(&self.name);
        encoder.field(&self.full_url);
        encoder.field(&self.thumb_url);
    }
}

/// One page of listed records, in upstream order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingResult {
    pub files: Vec<MediaRecord>,
    pub is_truncated: bool,
    pub next_cursor: Option<String>,
}

/// Where a listing response came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
    Stale,
}

impl CacheStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
            CacheStatus::Stale => "STALE",
        }
    }
}

/// Statistics about the listing cache
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub max_entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub stale: u64,
    pub evictions: u64,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_secs: u64,
    pub cache: CacheStats,
}
