//! Shell detection and export-script fragments

use std::env;
use std::path::PathBuf;

/// Supported shell types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Sh,
}

impl Shell {
    /// Detect the current shell from environment
    ///
    /// Checks `$SHELL` on Unix, falls back to reasonable defaults.
    pub fn detect() -> Self {
        if let Ok(shell) = env::var("SHELL") {
            let shell_name = PathBuf::from(&shell)
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("")
                .to_lowercase();

            return match shell_name.as_str() {
                "zsh" => Shell::Zsh,
                "bash" => Shell::Bash,
                "fish" => Shell::Fish,
                "sh" => Shell::Sh,
                "pwsh" | "powershell" => Shell::PowerShell,
                _ => {
                    if shell_name.contains("zsh") {
                        Shell::Zsh
                    } else if shell_name.contains("bash") {
                        Shell::Bash
                    } else if shell_name.contains("fish") {
                        Shell::Fish
                    } else {
                        Shell::Sh // Safe fallback for POSIX
                    }
                }
            };
        }

        #[cfg(target_os = "windows")]
        return Shell::PowerShell;

        #[cfg(not(target_os = "windows"))]
        Shell::Sh
    }

    /// Parse a shell name as given on the command line
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "bash" => Some(Shell::Bash),
            "zsh" => Some(Shell::Zsh),
            "fish" => Some(Shell::Fish),
            "sh" => Some(Shell::Sh),
            "powershell" | "pwsh" => Some(Shell::PowerShell),
            _ => None,
        }
    }

    /// Get the shell name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Shell::Bash => "bash",
            Shell::Zsh => "zsh",
            Shell::Fish => "fish",
            Shell::PowerShell => "powershell",
            Shell::Sh => "sh",
        }
    }

    /// The executable name used to launch this shell
    pub fn program(&self) -> &'static str {
        match self {
            Shell::Bash => "bash",
            Shell::Zsh => "zsh",
            Shell::Fish => "fish",
            Shell::PowerShell => "pwsh",
            Shell::Sh => "sh",
        }
    }

    /// Generate an export statement for setting an environment variable
    pub fn export_var(&self, name: &str, value: &str) -> String {
        match self {
            Shell::Fish => format!("set -gx {} {:?}", name, value),
            Shell::PowerShell => format!("$env:{} = {:?}", name, value),
            Shell::Bash | Shell::Zsh | Shell::Sh => format!("export {}={:?}", name, value),
        }
    }

    /// Generate the script header/shebang
    pub fn header(&self) -> &'static str {
        match self {
            Shell::Bash => "#!/usr/bin/env bash",
            Shell::Zsh => "#!/usr/bin/env zsh",
            Shell::Fish => "# Fish shell environment",
            Shell::PowerShell => "# PowerShell environment",
            Shell::Sh => "#!/bin/sh",
        }
    }
}

impl std::fmt::Display for Shell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
