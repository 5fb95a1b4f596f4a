//! Environment materialization
//!
//! Turns a shell specification plus a package source into a concrete set of
//! environment variables. Ordering guarantees:
//! - package resolution completes before any assignment is applied
//! - assignments are applied strictly in declaration order, so later values
//!   can reference earlier ones through `$${env:NAME}`

use crate::error::CoreError;
use crate::placeholder::{self, PlaceholderError, Resolver};
use crate::source::{Capabilities, PackageSource, ResolvedPackage};
use dsh_lua::{MergeStrategy, ShellSpec};
use dsh_platform::Platform;
use std::collections::HashMap;
use tracing::debug;

/// Platform path-list separator
#[cfg(unix)]
const PATH_SEP: &str = ":";
#[cfg(windows)]
const PATH_SEP: &str = ";";

/// An ordered, mutable view of the process environment being built
///
/// Explicitly passed through materialization instead of mutating the
/// ambient process environment; nothing leaks until `enter` execs.
#[derive(Debug, Clone, Default)]
pub struct EnvironmentContext {
    vars: Vec<(String, String)>,
    index: HashMap<String, usize>,
}

impl EnvironmentContext {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context seeded from the inherited process environment
    pub fn from_inherited() -> Self {
        let mut ctx = Self::new();
        for (name, value) in std::env::vars() {
            ctx.set(&name, &value);
        }
        ctx
    }

    /// Current value of a variable
    pub fn get(&self, name: &str) -> Option<&str> {
        self.index.get(name).map(|&i| self.vars[i].1.as_str())
    }

    /// Set a variable, replacing any existing value
    pub fn set(&mut self, name: &str, value: &str) {
        match self.index.get(name) {
            Some(&i) => self.vars[i].1 = value.to_string(),
            None => {
                self.index.insert(name.to_string(), self.vars.len());
                self.vars.push((name.to_string(), value.to_string()));
            }
        }
    }

    /// Prepend to a path-like variable, keeping any prior value as suffix
    pub fn prepend(&mut self, name: &str, value: &str) {
        match self.get(name) {
            Some(old) if !old.is_empty() => {
                let merged = format!("{}{}{}", value, PATH_SEP, old);
                self.set(name, &merged);
            }
            _ => self.set(name, value),
        }
    }

    /// Append to a path-like variable, keeping any prior value as prefix
    pub fn append(&mut self, name: &str, value: &str) {
        match self.get(name) {
            Some(old) if !old.is_empty() => {
                let merged = format!("{}{}{}", old, PATH_SEP, value);
                self.set(name, &merged);
            }
            _ => self.set(name, value),
        }
    }

    /// Iterate over all variables in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Number of variables
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// Whether the context holds no variables
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

/// Resolves placeholders against resolved packages and the context so far
struct CtxResolver<'a> {
    roots: &'a HashMap<String, String>,
    env: &'a EnvironmentContext,
}

impl Resolver for CtxResolver<'_> {
    fn resolve_pkg(&self, name: &str) -> Result<&str, PlaceholderError> {
        self.roots
            .get(name)
            .map(|s| s.as_str())
            .ok_or_else(|| PlaceholderError::UnresolvedPackage(name.to_string()))
    }

    fn resolve_env(&self, name: &str) -> Result<&str, PlaceholderError> {
        self.env
            .get(name)
            .ok_or_else(|| PlaceholderError::UnsetVariable(name.to_string()))
    }
}

/// The result of materializing a shell specification
#[derive(Debug, Clone)]
pub struct Materialized {
    /// Platform the packages were resolved for
    pub platform: Platform,
    /// Resolved packages, in declaration order
    pub packages: Vec<ResolvedPackage>,
    /// The full environment to hand to the shell
    pub env: EnvironmentContext,
    /// Final values of the variables this descriptor touched, in order
    /// (PATH first when packages contributed executables)
    pub exports: Vec<(String, String)>,
    /// Exec target from the descriptor, if declared
    pub exec: Option<String>,
}

/// Materialize a specification against the inherited process environment
pub fn materialize(
    spec: &ShellSpec,
    source: &impl PackageSource,
) -> Result<Materialized, CoreError> {
    materialize_with_base(spec, source, EnvironmentContext::from_inherited())
}

/// Materialize a specification on top of an explicit base environment
///
/// Resolution failures surface before the base is touched.
pub fn materialize_with_base(
    spec: &ShellSpec,
    source: &impl PackageSource,
    base: EnvironmentContext,
) -> Result<Materialized, CoreError> {
    let platform = spec.platform.unwrap_or_else(Platform::current);
    let caps = Capabilities {
        allow_unfree: spec.allow_unfree,
        with_gpu: spec.with_gpu,
    };

    // Resolve everything first; any failure aborts before env assignment.
    let packages = source.resolve_all(platform, &spec.packages, &caps)?;
    debug!(
        "Resolved {} package(s) for {}",
        packages.len(),
        platform.triple()
    );

    let mut env = base;
    let mut exports: Vec<(String, String)> = Vec::new();

    // Put resolved executables on the search path. Reverse order so the
    // first-declared package ends up with the highest precedence.
    let mut touched_path = false;
    for pkg in packages.iter().rev() {
        if let Some(bin) = pkg.bin_dir() {
            env.prepend("PATH", &bin.to_string_lossy());
            touched_path = true;
        }
    }
    if touched_path {
        exports.push(("PATH".to_string(), env.get("PATH").unwrap_or("").to_string()));
    }

    let roots: HashMap<String, String> = packages
        .iter()
        .map(|p| (p.name.clone(), p.root.to_string_lossy().into_owned()))
        .collect();

    // Apply assignments in declaration order; each substitution sees the
    // context as mutated by the ones before it.
    for assignment in &spec.env {
        let value = {
            let resolver = CtxResolver {
                roots: &roots,
                env: &env,
            };
            placeholder::substitute(&assignment.value, &resolver)?
        };

        match assignment.strategy {
            MergeStrategy::Replace => env.set(&assignment.name, &value),
            MergeStrategy::Prepend => env.prepend(&assignment.name, &value),
            MergeStrategy::Append => env.append(&assignment.name, &value),
        }

        let final_value = env.get(&assignment.name).unwrap_or("").to_string();
        match exports.iter_mut().find(|(n, _)| n == &assignment.name) {
            Some(entry) => entry.1 = final_value,
            None => exports.push((assignment.name.clone(), final_value)),
        }
    }

    Ok(Materialized {
        platform,
        packages,
        env,
        exports,
        exec: spec.exec.clone(),
    })
}
