//! The listing seam between request handling and object storage

use crate::error::Result;
use crate::types::{ObjectPage, PageRequest};
use async_trait::async_trait;

/// Anything that can list one page of object keys under a prefix
///
/// [`crate::S3ObjectLister`] is the production implementation; tests swap in
/// scripted fakes.
#[async_trait]
pub trait ObjectLister: Send + Sync {
    async fn list_page(&self, request: &PageRequest) -> Result<ObjectPage>;
}
