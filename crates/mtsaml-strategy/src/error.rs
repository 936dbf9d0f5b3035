//! Strategy error types.
//!
//! Errors fall into three groups:
//!
//! - setup errors ([`StrategyError::Configuration`]) returned when a strategy
//!   is built without a mandatory collaborator
//! - caller misuse ([`StrategyError::InvalidUsage`]) reported before any
//!   asynchronous work starts
//! - per-request failures (everything else), reported through the channel of
//!   the operation that hit them and never affecting other requests

use thiserror::Error;

use crate::engine::EngineError;

/// Boxed error type used for integrator-supplied collaborators.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result type for strategy operations.
pub type StrategyResult<T> = Result<T, StrategyError>;

/// Strategy errors.
#[derive(Debug, Error)]
pub enum StrategyError {
    /// A mandatory collaborator was not supplied at construction.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The config resolver reported an error for this request.
    ///
    /// Displays exactly as the resolver's own error.
    #[error("{0}")]
    ConfigResolution(BoxError),

    /// The caller used an operation in a way it cannot support.
    #[error("invalid usage: {0}")]
    InvalidUsage(String),

    /// The effective options are not a usable engine parameter set.
    #[error("invalid effective options: {0}")]
    Options(#[from] mtsaml_core::Error),

    /// The protocol engine failed to build or to process the request.
    #[error("protocol engine error: {0}")]
    Engine(#[from] EngineError),

    /// The verify callback returned an error.
    #[error("verification failed: {0}")]
    Verify(#[source] BoxError),
}

impl StrategyError {
    /// Returns the resolver's error if this is a resolution failure.
    #[must_use]
    pub fn resolution_error(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            Self::ConfigResolution(err) => Some(err.as_ref()),
            _ => None,
        }
    }

    /// Returns whether this error was reported by the config resolver.
    #[must_use]
    pub const fn is_resolution_error(&self) -> bool {
        matches!(self, Self::ConfigResolution(_))
    }

    /// Returns the HTTP status code a framework adapter should answer with.
    #[must_use]
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Engine(err) => err.http_status(),
            Self::Verify(_) => 401,
            Self::Configuration(_)
            | Self::ConfigResolution(_)
            | Self::InvalidUsage(_)
            | Self::Options(_) => 500,
        }
    }
}
