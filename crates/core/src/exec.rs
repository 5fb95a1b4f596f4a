//! Process replacement
//!
//! The terminal step of entering a shell: the current process image is
//! replaced by the exec target, which inherits the materialized environment.
//! On Unix this is `execvp` semantics; on Windows, where no exec exists, the
//! child is spawned and waited on, and its exit code is forwarded.

use crate::error::CoreError;
use crate::materialize::Materialized;
use dsh_platform::Shell;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// Determine the command the materialized environment should exec into
///
/// The descriptor's `exec` wins; otherwise the detected login shell.
pub fn exec_command(materialized: &Materialized) -> String {
    materialized
        .exec
        .clone()
        .unwrap_or_else(|| Shell::detect().program().to_string())
}

/// Locate `command` through the materialized PATH
///
/// A command containing a path separator is used as given; a bare name is
/// searched through the context's PATH so that shells provided by resolved
/// packages are found without the store being on the caller's own PATH.
fn locate(command: &str, materialized: &Materialized) -> Option<PathBuf> {
    let candidate = Path::new(command);
    if candidate.components().count() > 1 {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }

    let path = materialized.env.get("PATH")?;
    for dir in std::env::split_paths(path) {
        let full = dir.join(command);
        if is_executable(&full) {
            return Some(full);
        }
    }

    None
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.is_file()
        && path
            .metadata()
            .map(|m| m.permissions().mode() & 0o111 != 0)
            .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Replace the current process with the exec target
///
/// Only returns on failure; a successful call never comes back.
pub fn enter(materialized: &Materialized) -> Result<std::convert::Infallible, CoreError> {
    let command = exec_command(materialized);

    let program = locate(&command, materialized).ok_or_else(|| CoreError::ShellLaunchFailure {
        command: command.clone(),
        source: std::io::Error::new(std::io::ErrorKind::NotFound, "command not found on PATH"),
    })?;

    debug!("Replacing process with {}", program.display());

    let mut cmd = Command::new(&program);
    cmd.env_clear();
    for (name, value) in materialized.env.iter() {
        cmd.env(name, value);
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        // exec only returns on error
        let err = cmd.exec();
        Err(CoreError::ShellLaunchFailure {
            command,
            source: err,
        })
    }

    #[cfg(not(unix))]
    {
        let status = cmd.status().map_err(|e| CoreError::ShellLaunchFailure {
            command: command.clone(),
            source: e,
        })?;
        std::process::exit(status.code().unwrap_or(1));
    }
}
