//! Error types for dsh-core

use crate::placeholder::PlaceholderError;
use crate::source::ResolveReason;
use thiserror::Error;

/// Errors that can occur in core operations
///
/// All variants are fatal at this layer; there is no retry or fallback.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("No package set for platform '{platform}'")]
    UnsupportedPlatform { platform: String },

    #[error("Cannot resolve package '{name}' for {platform}: {reason}")]
    UnresolvedPackage {
        name: String,
        platform: String,
        reason: ResolveReason,
    },

    #[error("Failed to launch shell '{command}': {source}")]
    ShellLaunchFailure {
        command: String,
        source: std::io::Error,
    },

    #[error("Placeholder error: {0}")]
    Placeholder(#[from] PlaceholderError),

    #[error("Lua evaluation error: {0}")]
    Lua(#[from] dsh_lua::LuaError),

    #[error("Platform error: {0}")]
    Platform(#[from] dsh_platform::PlatformError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
