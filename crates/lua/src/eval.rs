//! Descriptor evaluation

use crate::error::LuaError;
use crate::globals::{setup_dsh_global, setup_shell_function, Declarations};
use crate::types::ShellSpec;
use dsh_platform::PlatformInfo;
use mlua::Lua;
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::debug;

/// Context for evaluating a descriptor file
pub struct EvalContext {
    /// Platform information exposed through the `dsh` global
    pub info: PlatformInfo,
    /// Directory containing the descriptor (for diagnostics)
    pub config_dir: PathBuf,
}

impl EvalContext {
    /// Create a new evaluation context for a descriptor path
    pub fn new(config_path: &Path) -> Result<Self, LuaError> {
        let config_dir = config_path
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        let config_dir = if config_dir.is_absolute() {
            config_dir
        } else {
            std::env::current_dir()?.join(config_dir)
        };

        Ok(Self {
            info: PlatformInfo::current(),
            config_dir,
        })
    }
}

/// Evaluate a descriptor file and return the collected shell specification
///
/// # Example
///
/// ```ignore
/// use dsh_lua::evaluate_config;
/// use std::path::Path;
///
/// let spec = evaluate_config(Path::new("shell.lua"))?;
/// println!("{} package(s)", spec.packages.len());
/// ```
pub fn evaluate_config(config_path: &Path) -> Result<ShellSpec, LuaError> {
    if !config_path.exists() {
        return Err(LuaError::ConfigNotFound(config_path.display().to_string()));
    }

    let source = std::fs::read_to_string(config_path)?;
    let ctx = EvalContext::new(config_path)?;

    debug!("Evaluating descriptor {}", config_path.display());
    evaluate_config_string(&source, &ctx)
}

/// Evaluate a descriptor from a string
///
/// Useful for testing or when the descriptor is embedded.
pub fn evaluate_config_string(source: &str, ctx: &EvalContext) -> Result<ShellSpec, LuaError> {
    let lua = Lua::new();

    setup_dsh_global(&lua, &ctx.info)?;

    let declarations = Rc::new(RefCell::new(Declarations::new()));
    setup_shell_function(&lua, declarations.clone())?;

    lua.load(source).exec()?;

    let decls = declarations.borrow();
    let spec = decls
        .shell
        .clone()
        .ok_or_else(|| LuaError::MissingShellDecl(ctx.config_dir.display().to_string()))?;

    spec.validate().map_err(LuaError::InvalidShellDecl)?;

    Ok(spec)
}
