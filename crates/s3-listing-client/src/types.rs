//! Request, response and settings types for the listing client

use std::fmt;
use std::time::Duration;

/// Total attempts per listing call, including the first one
pub const DEFAULT_MAX_ATTEMPTS: u32 = 2;

/// Time allowed to establish a connection to the store
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

/// Time allowed for a whole listing call, retries included
pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(10);

/// One page request against the listing API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub prefix: String,
    pub max_keys: i32,
    pub continuation_token: Option<String>,
}

/// One page of raw object keys, in store order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectPage {
    pub keys: Vec<String>,
    pub is_truncated: bool,
    pub next_continuation_token: Option<String>,
}

/// Connection settings for [`crate::S3ObjectLister`]
///
/// Bucket and region are optional here so that a missing value is reported
/// by the lister on first use instead of preventing startup.
#[derive(Clone)]
pub struct S3Settings {
    pub bucket: Option<String>,
    pub region: Option<String>,
    /// Custom endpoint for S3-compatible stores (MinIO, R2, ...)
    pub endpoint: Option<String>,
    pub force_path_style: bool,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub max_attempts: u32,
    pub connect_timeout: Duration,
    pub operation_timeout: Duration,
}

impl Default for S3Settings {
    fn default() -> Self {
        Self {
            bucket: None,
            region: None,
            endpoint: None,
            force_path_style: false,
            access_key_id: None,
            secret_access_key: None,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            operation_timeout: DEFAULT_OPERATION_TIMEOUT,
        }
    }
}

impl fmt::Debug for S3Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3Settings")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .field("force_path_style", &self.force_path_style)
            .field("static_credentials", &self.access_key_id.is_some())
            .field("max_attempts", &self.max_attempts)
            .field("connect_timeout", &self.connect_timeout)
            .field("operation_timeout", &self.operation_timeout)
            .finish_non_exhaustive()
    }
}
