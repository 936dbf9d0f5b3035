//! Error handling for SAML option loading and validation.

use thiserror::Error;

/// Result type alias using the core error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while loading or validating SAML options.
#[derive(Debug, Error)]
pub enum Error {
    /// A configuration source held a value that could not be parsed.
    #[error("configuration error: {0}")]
    Config(String),

    /// The options do not form a usable protocol engine parameter set.
    #[error("validation error: {0}")]
    Validation(String),
}

impl Error {
    /// Returns whether this error was caused by a malformed configuration source.
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Returns whether this error was raised by option validation.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
