//! S3 Listing Client
//!
//! Lists one page of object keys under a prefix via `ListObjectsV2`.
//! The SDK client is built on first use from [`S3Settings`], with a small
//! retry budget and connect/operation timeouts. Failures are classified into
//! [`UpstreamError`] variants so callers can decide between 404, 500 and
//! serving stale data.

pub mod error;
pub mod lister;
pub mod s3;
pub mod types;

pub use error::{Result, UpstreamError};
pub use lister::ObjectLister;
pub use s3::S3ObjectLister;
pub use types::{ObjectPage, PageRequest, S3Settings};
