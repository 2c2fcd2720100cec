//! Error types for the S3 listing client

use std::fmt;

/// Upstream failures, classified by how a caller should react to them
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamError {
    /// Required connection settings are missing or inconsistent
    Config(String),
    /// The bucket or prefix does not exist
    NotFound(String),
    /// The store refused the request
    AccessDenied(String),
    /// Timeouts, dispatch failures, throttling and 5xx responses
    Transient(String),
    /// Anything that could not be classified
    Other(String),
}

impl UpstreamError {
    /// Whether retrying later has a reasonable chance of succeeding
    pub fn is_transient(&self) -> bool {
        matches!(self, UpstreamError::Transient(_))
    }
}

impl fmt::Display for UpstreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpstreamError::Config(msg) => write!(f, "Configuration error: {}", msg),
            UpstreamError::NotFound(msg) => write!(f, "Not found: {}", msg),
            UpstreamError::AccessDenied(msg) => write!(f, "Access denied: {}", msg),
            UpstreamError::Transient(msg) => write!(f, "Transient upstream error: {}", msg),
            UpstreamError::Other(msg) => write!(f, "Upstream error: {}", msg),
        }
    }
}

impl std::error::Error for UpstreamError {}

pub type Result<T> = std::result::Result<T, UpstreamError>;
