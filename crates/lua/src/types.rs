//! Declaration types collected from the Lua descriptor

use dsh_platform::Platform;
use serde::{Deserialize, Serialize};

/// How an environment assignment combines with an existing value
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum MergeStrategy {
    /// Replace any existing value
    #[default]
    Replace,
    /// Prepend to an existing PATH-like variable
    Prepend,
    /// Append to an existing PATH-like variable
    Append,
}

/// A single ordered environment assignment from the descriptor
///
/// Values may contain `$${pkg:NAME}` and `$${env:NAME}` placeholders which
/// are substituted at materialization time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EnvAssignment {
    /// Environment variable name
    pub name: String,
    /// Value to set (placeholders unresolved)
    pub value: String,
    /// How to merge with an existing value
    #[serde(default)]
    pub strategy: MergeStrategy,
}

impl EnvAssignment {
    /// Create a replace-style assignment
    pub fn set(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            strategy: MergeStrategy::Replace,
        }
    }

    /// Create a prepend-style assignment (for PATH-like vars)
    pub fn prepend(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            strategy: MergeStrategy::Prepend,
        }
    }

    /// Create an append-style assignment (for PATH-like vars)
    pub fn append(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            strategy: MergeStrategy::Append,
        }
    }
}

/// The shell specification collected from a `shell {}` declaration
///
/// One descriptor file declares exactly one of these. It is recomputed from
/// source on every invocation and never mutated after collection.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ShellSpec {
    /// Target platform triple; `None` means detect the current platform
    pub platform: Option<Platform>,

    /// Permit packages whose metadata marks them non-redistributable
    #[serde(default)]
    pub allow_unfree: bool,

    /// Select accelerator variants of packages that declare one
    #[serde(default)]
    pub with_gpu: bool,

    /// Ordered package identifiers to materialize into the search path
    pub packages: Vec<String>,

    /// Ordered environment assignments, applied in declaration order
    pub env: Vec<EnvAssignment>,

    /// Command replacing the current process once the environment is
    /// established; `None` falls back to the detected login shell
    pub exec: Option<String>,
}

impl ShellSpec {
    /// Validate the declaration
    ///
    /// Checks env names, the exec target, and duplicate package identifiers.
    pub fn validate(&self) -> Result<(), String> {
        for assignment in &self.env {
            if assignment.name.is_empty() {
                return Err("env assignment has an empty variable name".to_string());
            }
            if assignment.name.contains('=') {
                return Err(format!(
                    "env variable name '{}' must not contain '='",
                    assignment.name
                ));
            }
        }

        if let Some(exec) = &self.exec {
            if exec.trim().is_empty() {
                return Err("exec target must not be empty".to_string());
            }
        }

        for (i, name) in self.packages.iter().enumerate() {
            if name.is_empty() {
                return Err("package identifier must not be empty".to_string());
            }
            if self.packages[..i].contains(name) {
                return Err(format!("package '{}' declared more than once", name));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_assignment_constructors() {
        let set = EnvAssignment::set("EDITOR", "nvim");
        assert_eq!(set.strategy, MergeStrategy::Replace);

        let prepend = EnvAssignment::prepend("PATH", "/usr/local/bin");
        assert_eq!(prepend.strategy, MergeStrategy::Prepend);

        let append = EnvAssignment::append("MANPATH", "/usr/share/man");
        assert_eq!(append.strategy, MergeStrategy::Append);
    }

    #[test]
    fn test_validate_ok() {
        let spec = ShellSpec {
            packages: vec!["uv".to_string(), "fish".to_string()],
            env: vec![EnvAssignment::set("HF_ENDPOINT", "https://hf-mirror.com")],
            exec: Some("fish".to_string()),
            ..Default::default()
        };
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_duplicate_packages() {
        let spec = ShellSpec {
            packages: vec!["uv".to_string(), "uv".to_string()],
            ..Default::default()
        };
        assert!(spec.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_env_name() {
        let spec = ShellSpec {
            env: vec![EnvAssignment::set("FOO=BAR", "x")],
            ..Default::default()
        };
        assert!(spec.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_exec() {
        let spec = ShellSpec {
            exec: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(spec.validate().is_err());
    }

    #[test]
    fn test_merge_strategy_default() {
        assert_eq!(MergeStrategy::default(), MergeStrategy::Replace);
    }
}
