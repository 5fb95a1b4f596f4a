//! Error types for dsh-lua

use thiserror::Error;

/// Errors that can occur during Lua evaluation
#[derive(Debug, Error)]
pub enum LuaError {
    #[error("Lua runtime error: {0}")]
    Runtime(#[from] mlua::Error),

    #[error("Descriptor file not found: {0}")]
    ConfigNotFound(String),

    #[error("Descriptor declares no shell {{}} block: {0}")]
    MissingShellDecl(String),

    #[error("Invalid shell declaration: {0}")]
    InvalidShellDecl(String),

    #[error("Platform error: {0}")]
    Platform(#[from] dsh_platform::PlatformError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
