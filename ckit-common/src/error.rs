//! Common error types for CutsceneKit

use thiserror::Error;

/// Common result type for CutsceneKit operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by the scheduler and the player
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML document could not be parsed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Nominal duration outside the representable, non-negative range
    #[error("Invalid duration: {0}")]
    InvalidDuration(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
