//! Request handling for `GET /images`
//!
//! Checks run in a fixed order: method, configuration, then caller input.
//! After that the cache is consulted, upstream is called on a miss or an
//! expired entry, and an upstream failure falls back to the expired entry
//! for the same key when one is still retained.

use crate::conditional::if_none_match_satisfied;
use crate::config::ListingSettings;
use crate::error::ListingError;
use crate::fetcher::ListingFetcher;
use crate::types::{CacheStats, CacheStatus, ListingResult};
use crate::validation::{ListImagesParams, ListingQuery};
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use listing_cache::{cache_key, fingerprint, CacheStore};
use s3_listing_client::ObjectLister;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const LISTING_VERSION: &str = "1";

const X_CACHE: &str = "x-cache";
const X_LISTING_VERSION: &str = "x-listing-version";
const X_PAGINATION_HAS_MORE: &str = "x-pagination-has-more";
const X_PAGINATION_NEXT_TOKEN: &str = "x-pagination-next-token";

/// One inbound listing call
#[derive(Debug, Clone)]
pub struct ListingRequest {
    pub method: Method,
    /// Parsed query, or the parser's rejection text
    pub params: Result<ListImagesParams, String>,
    pub if_none_match: Option<String>,
}

#[derive(Debug)]
pub enum ListingOutcome {
    Listing {
        result: Arc<ListingResult>,
        fingerprint: String,
        status: CacheStatus,
    },
    NotModified {
        fingerprint: String,
        status: CacheStatus,
    },
}

/// Owns the upstream fetcher and the listing cache for one process
pub struct ListingService {
    settings: ListingSettings,
    fetcher: ListingFetcher,
    cache: CacheStore<Arc<ListingResult>>,
    hits: AtomicU64,
    misses: AtomicU64,
    stale: AtomicU64,
}

impl ListingService {
    pub fn new(settings: ListingSettings, lister: Arc<dyn ObjectLister>) -> Self {
        let cache = CacheStore::new(settings.max_entries, settings.stale_retention);
        Self {
            settings,
            fetcher: ListingFetcher::new(lister),
            cache,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            stale: AtomicU64::new(0),
        }
    }

    pub fn settings(&self) -> &ListingSettings {
        &self.settings
    }

    pub async fn handle(&self, request: ListingRequest) -> Result<ListingOutcome, ListingError> {
        if request.method != Method::GET {
            return Err(ListingError::MethodNotAllowed);
        }

        let public_base = self.public_base()?;
        let params = request.params.map_err(ListingError::Validation)?;
        let query = ListingQuery::resolve(params, &self.settings.namespace_policy)?;
        let key = cache_key(&query.namespace, query.page_size, query.cursor.as_deref());
        let if_none_match = request.if_none_match.as_deref();

        if let Err(e) = self.cache.evict() {
            warn!(error = %e, "Cache eviction failed");
        }

        match self.cache.get(&key) {
            Ok(Some(entry)) if entry.is_fresh() => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!(key = %key, age_secs = entry.age_secs(), "Listing cache hit");
                return Ok(respond(
                    entry.payload,
                    entry.fingerprint,
                    CacheStatus::Hit,
                    if_none_match,
                ));
            }
            Ok(_) => {}
            Err(e) => warn!(key = %key, error = %e, "Cache read failed"),
        }

        match self.fetcher.fetch(public_base, &query).await {
            Ok(result) => {
                let etag = fingerprint(&result.files);
                let result = Arc::new(result);

                // No await between the fetch completing and this write.
                if let Err(e) = self.cache.put(
                    key.clone(),
                    Arc::clone(&result),
                    etag.clone(),
                    self.settings.cache_ttl,
                ) {
                    warn!(key = %key, error = %e, "Failed to cache listing");
                }

                self.misses.fetch_add(1, Ordering::Relaxed);
                info!(
                    namespace = %query.namespace,
                    files = result.files.len(),
                    truncated = result.is_truncated,
                    "Fetched listing"
                );
                Ok(respond(result, etag, CacheStatus::Miss, if_none_match))
            }
            Err(upstream) => {
                let err = ListingError::from(upstream);
                if !allows_stale_fallback(&err) {
                    return Err(err);
                }

                match self.cache.get(&key) {
                    Ok(Some(entry)) => {
                        self.stale.fetch_add(1, Ordering::Relaxed);
                        warn!(
                            key = %key,
                            age_secs = entry.age_secs(),
                            error = %err,
                            "Serving stale listing after upstream failure"
                        );
                        Ok(respond(
                            entry.payload,
                            entry.fingerprint,
                            CacheStatus::Stale,
                            if_none_match,
                        ))
                    }
                    Ok(None) => Err(err),
                    Err(e) => {
                        warn!(key = %key, error = %e, "Stale lookup failed");
                        Err(err)
                    }
                }
            }
        }
    }

    fn public_base(&self) -> Result<&str, ListingError> {
        if self.settings.bucket.is_none() {
            return Err(ListingError::Config("S3_BUCKET_NAME is not set".to_string()));
        }
        self.settings
            .public_base_url
            .as_deref()
            .ok_or_else(|| ListingError::Config("PUBLIC_BASE_URL is not set".to_string()))
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.cache.len().unwrap_or_default(),
            max_entries: self.cache.max_entries(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            stale: self.stale.load(Ordering::Relaxed),
            evictions: self.cache.evictions(),
        }
    }
}

/// Missing or forbidden namespaces and bad configuration are reported as-is
fn allows_stale_fallback(err: &ListingError) -> bool {
    matches!(err, ListingError::Transient(_) | ListingError::Unknown(_))
}

fn respond(
    result: Arc<ListingResult>,
    fingerprint: String,
    status: CacheStatus,
    if_none_match: Option<&str>,
) -> ListingOutcome {
    if if_none_match.is_some_and(|header| if_none_match_satisfied(header, &fingerprint)) {
        ListingOutcome::NotModified {
            fingerprint,
            status,
        }
    } else {
        ListingOutcome::Listing {
            result,
            fingerprint,
            status,
        }
    }
}

fn insert_validators(headers: &mut HeaderMap, fingerprint: &str, status: CacheStatus) {
    if let Ok(etag) = HeaderValue::from_str(fingerprint) {
        headers.insert(header::ETAG, etag);
    }
    headers.insert(X_CACHE, HeaderValue::from_static(status.as_str()));
}

impl IntoResponse for ListingOutcome {
    fn into_response(self) -> Response {
        match self {
            ListingOutcome::NotModified {
                fingerprint,
                status,
            } => {
                let mut response = StatusCode::NOT_MODIFIED.into_response();
                insert_validators(response.headers_mut(), &fingerprint, status);
                response
            }
            ListingOutcome::Listing {
                result,
                fingerprint,
                status,
            } => {
                let mut response = Json(&result.files).into_response();
                let headers = response.headers_mut();
                insert_validators(headers, &fingerprint, status);
                headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
                headers.insert(X_LISTING_VERSION, HeaderValue::from_static(LISTING_VERSION));
                headers.insert(
                    X_PAGINATION_HAS_MORE,
                    HeaderValue::from_static(if result.is_truncated { "true" } else { "false" }),
                );
                if let Some(cursor) = &result.next_cursor {
                    match HeaderValue::from_str(cursor) {
                        Ok(value) => {
                            headers.insert(X_PAGINATION_NEXT_TOKEN, value);
                        }
                        Err(_) => warn!("Continuation token is not a valid header value"),
                    }
                }
                response
            }
        }
    }
}
