//! Global Lua functions and the dsh table

use crate::types::{EnvAssignment, MergeStrategy, ShellSpec};
use dsh_platform::PlatformInfo;
use mlua::{Lua, Result as LuaResult, Table, Value};
use std::cell::RefCell;
use std::rc::Rc;

/// Shared state for collecting the declaration during Lua evaluation
#[derive(Default)]
pub struct Declarations {
    pub shell: Option<ShellSpec>,
}

impl Declarations {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Set up the `dsh` global table with platform information
pub fn setup_dsh_global(lua: &Lua, info: &PlatformInfo) -> LuaResult<()> {
    let dsh = lua.create_table()?;

    // Platform information
    dsh.set("platform", info.platform.triple())?;
    dsh.set("os", info.os.as_str())?;
    dsh.set("arch", info.arch.as_str())?;
    dsh.set("hostname", info.hostname.as_str())?;
    dsh.set("username", info.username.as_str())?;

    // Boolean helpers
    dsh.set("is_linux", info.is_linux())?;
    dsh.set("is_darwin", info.is_darwin())?;
    dsh.set("is_windows", info.is_windows())?;

    // Version
    dsh.set("version", env!("CARGO_PKG_VERSION"))?;

    lua.globals().set("dsh", dsh)?;

    Ok(())
}

/// Set up the `shell{}` global function
///
/// Usage from Lua:
/// ```lua
/// shell {
///     platform = "x86_64-linux",      -- optional, defaults to detection
///     allow_unfree = true,
///     with_gpu = true,
///     packages = { "uv", "cudatoolkit", "cacert", "fish" },
///     env = {
///         { "HF_ENDPOINT", "https://hf-mirror.com" },
///         { name = "LD_LIBRARY_PATH", value = "$${pkg:cudatoolkit}/lib", prepend = true },
///     },
///     exec = "fish",
/// }
/// ```
pub fn setup_shell_function(lua: &Lua, declarations: Rc<RefCell<Declarations>>) -> LuaResult<()> {
    let shell_fn = lua.create_function(move |_, spec: Table| {
        if declarations.borrow().shell.is_some() {
            return Err(mlua::Error::runtime(
                "shell {} declared more than once; a descriptor declares exactly one shell",
            ));
        }

        let decl = parse_shell_table(&spec)?;

        declarations.borrow_mut().shell = Some(decl);

        Ok(())
    })?;

    lua.globals().set("shell", shell_fn)?;

    Ok(())
}

/// Parse the `shell{}` argument table into a ShellSpec
fn parse_shell_table(spec: &Table) -> Result<ShellSpec, mlua::Error> {
    let platform: Option<dsh_platform::Platform> = match spec.get::<Option<String>>("platform")? {
        Some(triple) => Some(
            triple
                .parse()
                .map_err(|e| mlua::Error::runtime(format!("{}", e)))?,
        ),
        None => None,
    };

    let allow_unfree: Option<bool> = spec.get("allow_unfree")?;
    let with_gpu: Option<bool> = spec.get("with_gpu")?;
    let exec: Option<String> = spec.get("exec")?;

    let mut packages = Vec::new();
    if let Some(pkgs) = spec.get::<Option<Table>>("packages")? {
        for item in pkgs.sequence_values::<String>() {
            packages.push(item?);
        }
    }

    let mut env = Vec::new();
    if let Some(entries) = spec.get::<Option<Table>>("env")? {
        for item in entries.sequence_values::<Table>() {
            env.push(parse_env_entry(&item?)?);
        }
    }

    Ok(ShellSpec {
        platform,
        allow_unfree: allow_unfree.unwrap_or(false),
        with_gpu: with_gpu.unwrap_or(false),
        packages,
        env,
        exec,
    })
}

/// Parse one entry of the `env` sequence
///
/// Two forms are accepted:
/// - positional pair: `{ "NAME", "value" }`
/// - named: `{ name = "NAME", value = "...", prepend = true }` (or `append`)
fn parse_env_entry(entry: &Table) -> Result<EnvAssignment, mlua::Error> {
    let (name, value) = match entry.get::<Option<String>>("name")? {
        Some(name) => {
            let value: String = entry
                .get::<Option<String>>("value")?
                .ok_or_else(|| mlua::Error::runtime(format!("env entry '{}' has no value", name)))?;
            (name, value)
        }
        None => {
            let name: Value = entry.get(1)?;
            let value: Value = entry.get(2)?;
            match (name, value) {
                (Value::String(n), Value::String(v)) => {
                    (n.to_str()?.to_string(), v.to_str()?.to_string())
                }
                _ => {
                    return Err(mlua::Error::runtime(
                        "env entry must be { \"NAME\", \"value\" } or { name = ..., value = ... }",
                    ));
                }
            }
        }
    };

    let prepend: Option<bool> = entry.get("prepend")?;
    let append: Option<bool> = entry.get("append")?;

    let strategy = match (prepend.unwrap_or(false), append.unwrap_or(false)) {
        (true, true) => {
            return Err(mlua::Error::runtime(format!(
                "env entry '{}' cannot be both prepend and append",
                name
            )));
        }
        (true, false) => MergeStrategy::Prepend,
        (false, true) => MergeStrategy::Append,
        (false, false) => MergeStrategy::Replace,
    };

    Ok(EnvAssignment {
        name,
        value,
        strategy,
    })
}
