//! Query validation and namespace resolution

use crate::config::NamespacePolicy;
use crate::error::ListingError;
use serde::Deserialize;

pub const MAX_NAMESPACE_LENGTH: usize = 1024;
pub const MAX_CURSOR_LENGTH: usize = 1024;
pub const MIN_PAGE_SIZE: u32 = 1;
pub const MAX_PAGE_SIZE: u32 = 1000;
pub const DEFAULT_PAGE_SIZE: u32 = MAX_PAGE_SIZE;

/// Raw query string of `GET /images`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListImagesParams {
    pub prefix: Option<String>,
    /// Kept as text so out-of-range and non-numeric values share one message
    pub max_keys: Option<String>,
    pub continuation_token: Option<String>,
}

/// A validated listing request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingQuery {
    /// Empty (bucket root) or ending in `/`
    pub namespace: String,
    pub page_size: u32,
    pub cursor: Option<String>,
}

impl ListingQuery {
    pub fn resolve(
        params: ListImagesParams,
        policy: &NamespacePolicy,
    ) -> Result<Self, ListingError> {
        let namespace = match policy {
            NamespacePolicy::Fixed(namespace) => namespace.clone(),
            NamespacePolicy::CallerSupplied { default } => match params.prefix.as_deref() {
                Some(prefix) => normalize_namespace(prefix)?,
                None => default.clone(),
            },
        };

        let page_size = match params.max_keys.as_deref() {
            None => DEFAULT_PAGE_SIZE,
            Some(raw) => parse_page_size(raw)?,
        };

        let cursor = params.continuation_token.filter(|c| !c.is_empty());
        if let Some(cursor) = &cursor {
            if cursor.len() > MAX_CURSOR_LENGTH {
                return Err(ListingError::Validation(format!(
                    "continuationToken must be at most {} bytes",
                    MAX_CURSOR_LENGTH
                )));
            }
        }

        Ok(Self {
            namespace,
            page_size,
            cursor,
        })
    }
}

fn parse_page_size(raw: &str) -> Result<u32, ListingError> {
    raw.trim()
        .parse::<u32>()
        .ok()
        .filter(|n| (MIN_PAGE_SIZE..=MAX_PAGE_SIZE).contains(n))
        .ok_or_else(|| {
            ListingError::Validation(format!(
                "maxKeys must be between {} and {}",
                MIN_PAGE_SIZE, MAX_PAGE_SIZE
            ))
        })
}

/// Normalize a namespace to `""` or a path ending in `/`
///
/// Leading slashes are dropped so `/album` and `album/` address the same
/// objects. Control characters and `..` segments are rejected.
pub fn normalize_namespace(raw: &str) -> Result<String, ListingError> {
    if raw.len() > MAX_NAMESPACE_LENGTH {
        return Err(ListingError::Validation(format!(
            "prefix must be at most {} bytes",
            MAX_NAMESPACE_LENGTH
        )));
    }
    if raw.chars().any(char::is_control) {
        return Err(ListingError::Validation(
            "prefix must not contain control characters".to_string(),
        ));
    }
    if raw.split('/').any(|segment| segment == "..") {
        return Err(ListingError::Validation(
            "prefix must not contain '..' segments".to_string(),
        ));
    }

    let trimmed = raw.trim_start_matches('/');
    if trimmed.is_empty() {
        return Ok(String::new());
    }
    if trimmed.ends_with('/') {
        Ok(trimmed.to_string())
    } else {
        Ok(format!("{}/", trimmed))
    }
}
