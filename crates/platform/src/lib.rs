//! Platform detection and system abstractions for devlua
//!
//! This crate provides cross-platform abstractions for:
//! - OS and architecture detection
//! - Shell detection and export-script fragments
//! - Path expansion and store-root resolution
//! - User information

mod error;
mod paths;
mod platform;
mod shell;

pub use error::PlatformError;
pub use paths::{expand_path, store_root};
pub use platform::{Arch, Os, Platform, PlatformInfo};
pub use shell::Shell;
