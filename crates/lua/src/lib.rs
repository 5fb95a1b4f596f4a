//! dsh-lua: Lua runtime for devlua shell descriptors
//!
//! This crate evaluates a descriptor file (`shell.lua`) and collects the
//! single `shell {}` declaration it must contain:
//! - Global function: `shell{}`
//! - System information: `dsh` table (platform, os, arch, booleans)
//! - Declaration types: `ShellSpec`, `EnvAssignment`, `MergeStrategy`

mod error;
mod eval;
mod globals;
mod types;

pub use error::LuaError;
pub use eval::{evaluate_config, evaluate_config_string, EvalContext};
pub use globals::{setup_dsh_global, setup_shell_function, Declarations};
pub use types::{EnvAssignment, MergeStrategy, ShellSpec};
