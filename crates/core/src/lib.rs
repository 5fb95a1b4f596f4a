//! dsh-core: Core logic for devlua
//!
//! This crate turns an evaluated shell descriptor into a running shell:
//! - `PackageSource` / `LocalStore`: resolve package identifiers to paths
//! - `materialize`: build the environment (PATH, ordered assignments)
//! - `enter`: replace the current process with the requested shell
//! - `generate_env_script`: render the environment as shell syntax

mod error;
mod exec;
mod materialize;
pub mod placeholder;
mod script;
mod source;

pub use error::CoreError;
pub use exec::{enter, exec_command};
pub use materialize::{materialize, materialize_with_base, EnvironmentContext, Materialized};
pub use script::generate_env_script;
pub use source::{Capabilities, LocalStore, PackageSource, ResolveReason, ResolvedPackage};

// Re-export descriptor evaluation and types from dsh-lua for convenience
pub use dsh_lua::{evaluate_config, EnvAssignment, LuaError, MergeStrategy, ShellSpec};
// Re-export Shell from dsh-platform
pub use dsh_platform::Shell;

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
