//! Error types for ckit-player
//!
//! The scheduler itself reports only precondition violations; everything
//! else (stalled effects, late completions) is logged, not returned.

use thiserror::Error;
use uuid::Uuid;

/// Main error type for ckit-player
#[derive(Error, Debug)]
pub enum Error {
    /// Errors from the shared library (durations, config, TOML)
    #[error(transparent)]
    Common(#[from] ckit_common::Error),

    /// An action was started a second time
    #[error("Action {0} already started")]
    AlreadyStarted(Uuid),

    /// Invalid state for operation
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Cutscene script could not be parsed or built
    #[error("Script error: {0}")]
    Script(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type using ckit-player Error
pub type Result<T> = std::result::Result<T, Error>;
