//! Common error types for Rememo

use thiserror::Error;

/// Common result type for Rememo operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across Rememo services
#[derive(Error, Debug)]
pub enum Error {
    /// TOML file could not be parsed
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
