//! Error types for the listing cache

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// A thread panicked while holding the cache lock
    Poisoned,
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheError::Poisoned => write!(f, "Cache lock poisoned"),
        }
    }
}

impl std::error::Error for CacheError {}

impl<T> From<std::sync::PoisonError<T>> for CacheError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        CacheError::Poisoned
    }
}

pub type Result<T> = std::result::Result<T, CacheError>;
