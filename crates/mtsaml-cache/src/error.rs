//! Cache error types.

use std::fmt;

/// Replay store errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Connection to the store backend failed.
    Connection(String),
    /// Stored value could not be encoded or decoded.
    Serialization(String),
    /// Store operation timed out.
    Timeout,
    /// Invalid store configuration.
    Configuration(String),
    /// Internal store error.
    Internal(String),
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connection(msg) => write!(f, "cache connection error: {msg}"),
            Self::Serialization(msg) => write!(f, "cache serialization error: {msg}"),
            Self::Timeout => write!(f, "cache operation timed out"),
            Self::Configuration(msg) => write!(f, "cache configuration error: {msg}"),
            Self::Internal(msg) => write!(f, "internal cache error: {msg}"),
        }
    }
}

impl std::error::Error for CacheError {}

/// Result type for replay store operations.
pub type CacheResult<T> = Result<T, CacheError>;
