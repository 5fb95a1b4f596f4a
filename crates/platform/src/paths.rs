//! Path expansion and store-root resolution

use crate::error::PlatformError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Expand a path, resolving `~` to the user's home directory
///
/// # Examples
///
/// ```
/// use dsh_platform::expand_path;
///
/// let path = expand_path("~/.config/dsh/shell.lua").unwrap();
/// assert!(path.starts_with(dirs::home_dir().unwrap()));
/// ```
pub fn expand_path<P: AsRef<Path>>(path: P) -> Result<PathBuf, PlatformError> {
    let path = path.as_ref();
    let path_str = path.to_string_lossy();

    if path_str.starts_with("~/") {
        let home = dirs::home_dir().ok_or(PlatformError::NoHomeDirectory)?;
        Ok(home.join(&path_str[2..]))
    } else if path_str == "~" {
        dirs::home_dir().ok_or(PlatformError::NoHomeDirectory)
    } else {
        Ok(path.to_path_buf())
    }
}

/// Resolve the package store root
///
/// The `DSH_STORE` environment variable overrides the default location
/// under the platform data directory. A `~` in the override is expanded.
pub fn store_root() -> Result<PathBuf, PlatformError> {
    if let Ok(path) = std::env::var("DSH_STORE") {
        debug!("Using DSH_STORE override: {}", path);
        return expand_path(path);
    }

    default_store_root()
}

/// Default store root: `<data_dir>/dsh/store`
pub fn default_store_root() -> Result<PathBuf, PlatformError> {
    let data = dirs::data_dir().ok_or(PlatformError::NoDataDirectory)?;
    Ok(data.join("dsh").join("store"))
}
