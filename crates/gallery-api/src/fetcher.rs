//! Upstream listing and record mapping

use crate::types::{ListingResult, MediaRecord};
use crate::validation::ListingQuery;
use s3_listing_client::{ObjectLister, PageRequest, UpstreamError};
use std::sync::Arc;
use tracing::debug;

/// Sub-namespace holding generated thumbnails, excluded from listings
pub const THUMBNAILS_DIR: &str = "thumbnails/";

/// Lists one page upstream and maps keys to public records
pub struct ListingFetcher {
    lister: Arc<dyn ObjectLister>,
}

impl ListingFetcher {
    pub fn new(lister: Arc<dyn ObjectLister>) -> Self {
        Self { lister }
    }

    pub async fn fetch(
        &self,
        public_base: &str,
        query: &ListingQuery,
    ) -> Result<ListingResult, UpstreamError> {
        let request = PageRequest {
            prefix: query.namespace.clone(),
            max_keys: query.page_size as i32,
            continuation_token: query.cursor.clone(),
        };

        let page = self.lister.list_page(&request).await?;
        let listed = page.keys.len();
        let files = to_media_records(public_base, &query.namespace, page.keys);

        debug!(
            namespace = %query.namespace,
            listed,
            kept = files.len(),
            truncated = page.is_truncated,
            "Fetched listing page"
        );

        Ok(ListingResult {
            files,
            is_truncated: page.is_truncated,
            next_cursor: page.next_continuation_token,
        })
    }
}

/// Drop directory markers and thumbnails, keeping upstream order
pub fn to_media_records(public_base: &str, namespace: &str, keys: Vec<String>) -> Vec<MediaRecord> {
    let thumbnails_prefix = format!("{}{}", namespace, THUMBNAILS_DIR);

    keys.into_iter()
        .filter(|key| !key.is_empty() && !key.ends_with('/'))
        .filter(|key| !key.starts_with(&thumbnails_prefix))
        .map(|key| {
            let name = key.rsplit('/').next().unwrap_or(&key).to_string();
            MediaRecord {
                full_url: public_url(public_base, &key),
                thumb_url: public_url(public_base, &format!("{}{}", thumbnails_prefix, name)),
                name,
            }
        })
        .collect()
}

/// `<base>/<key>` with each key segment percent-encoded
pub fn public_url(public_base: &str, key: &str) -> String {
    let encoded: Vec<_> = key.split('/').map(urlencoding::encode).collect();
    format!("{}/{}", public_base, encoded.join("/"))
}
