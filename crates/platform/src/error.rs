//! Error types for dsh-platform

use thiserror::Error;

/// Errors that can occur in platform operations
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("Failed to determine home directory")]
    NoHomeDirectory,

    #[error("Failed to determine data directory")]
    NoDataDirectory,

    #[error("Unknown platform triple: {0}")]
    UnknownTriple(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
