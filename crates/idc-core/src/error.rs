//! Error handling for the identity resolution core.
//!
//! Errors raised while loading configuration or validating shared inputs.
//! Protocol crates define their own error enums and convert into this one
//! only at the outermost boundary.

use thiserror::Error;

/// Result type alias using the core error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be read or parsed.
    #[error("configuration error: {0}")]
    Config(String),

    /// Configuration was parsed but is not usable.
    #[error("validation error: {0}")]
    Validation(String),

    /// I/O error while reading configuration.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Creates a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a validation error.
    #[must_use]
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Returns whether the error was caused by the configuration content
    /// rather than by the environment.
    #[must_use]
    pub const fn is_config_error(&self) -> bool {
        matches!(self, Self::Config(_) | Self::Validation(_))
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}
