//! Crate-level error type.

use thiserror::Error;

use crate::env::{ConfigError, EnvError};
use crate::replay::BufferError;

/// Any error surfaced by the crate.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Environment error: {0}")]
    Env(#[from] EnvError),

    #[error("Replay error: {0}")]
    Buffer(#[from] BufferError),

    #[error("Training thread panicked")]
    TrainerPanicked,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "serde")]
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for crate operations.
pub type Result<T> = std::result::Result<T, Error>;
