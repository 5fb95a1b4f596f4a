//! Package resolution against a local store
//!
//! A store is a directory tree `<root>/<triple>/<package>/` holding the
//! installed trees of resolvable packages. Acquiring and building those
//! trees is the job of an external collaborator; this module only locates
//! them for a given platform and capability set.

use crate::error::CoreError;
use dsh_platform::Platform;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Capability flags gating which package variants are eligible
#[derive(Debug, Clone, Copy, Default)]
pub struct Capabilities {
    /// Permit packages marked non-redistributable
    pub allow_unfree: bool,
    /// Select accelerator variants of packages that declare one
    pub with_gpu: bool,
}

/// Why a package could not be resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveReason {
    /// No directory for the package under the platform's package set
    NotFound,
    /// Package is marked unfree and the descriptor does not allow unfree
    UnfreeBlocked,
    /// An accelerator variant was requested but its directory is missing
    MissingGpuVariant { variant: String },
    /// Package metadata could not be read
    Metadata(String),
}

impl fmt::Display for ResolveReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveReason::NotFound => write!(f, "package not found"),
            ResolveReason::UnfreeBlocked => {
                write!(f, "package is unfree and allow_unfree is not set")
            }
            ResolveReason::MissingGpuVariant { variant } => {
                write!(f, "gpu variant '{}' is declared but missing", variant)
            }
            ResolveReason::Metadata(msg) => write!(f, "invalid package metadata: {}", msg),
        }
    }
}

/// A package resolved to a concrete installation path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPackage {
    /// Package identifier as declared in the descriptor
    pub name: String,
    /// Root of the installed tree
    pub root: PathBuf,
}

impl ResolvedPackage {
    /// The package's executable directory, if it has one
    pub fn bin_dir(&self) -> Option<PathBuf> {
        let bin = self.root.join("bin");
        bin.is_dir().then_some(bin)
    }
}

/// A source of resolvable packages
///
/// The external collaborator boundary: given a platform, a package
/// identifier, and capability flags, produce an installation path.
pub trait PackageSource {
    /// Resolve a single package
    fn resolve(
        &self,
        platform: Platform,
        name: &str,
        caps: &Capabilities,
    ) -> Result<ResolvedPackage, CoreError>;

    /// Resolve all packages, in declaration order
    ///
    /// Fails on the first unresolvable package; nothing is materialized
    /// in that case.
    fn resolve_all(
        &self,
        platform: Platform,
        names: &[String],
        caps: &Capabilities,
    ) -> Result<Vec<ResolvedPackage>, CoreError> {
        names
            .iter()
            .map(|name| self.resolve(platform, name, caps))
            .collect()
    }
}

/// Optional per-package metadata, read from `package.toml` in the package dir
#[derive(Debug, Default, Deserialize)]
struct PackageMeta {
    /// Package is non-redistributable
    #[serde(default)]
    unfree: bool,

    /// Named variant subdirectories
    #[serde(default)]
    variants: Variants,
}

#[derive(Debug, Default, Deserialize)]
struct Variants {
    /// Subdirectory holding the accelerator build, if the package has one
    gpu: Option<String>,
}

/// Package source backed by a local directory tree
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    /// Open a store at an explicit root
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Open the default store (`DSH_STORE` override, else the data dir)
    pub fn open_default() -> Result<Self, CoreError> {
        Ok(Self::new(dsh_platform::store_root()?))
    }

    /// The store root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn read_meta(&self, pkg_dir: &Path) -> Result<PackageMeta, ResolveReason> {
        let meta_path = pkg_dir.join("package.toml");
        if !meta_path.is_file() {
            return Ok(PackageMeta::default());
        }

        let content =
            std::fs::read_to_string(&meta_path).map_err(|e| ResolveReason::Metadata(e.to_string()))?;
        toml::from_str(&content).map_err(|e| ResolveReason::Metadata(e.to_string()))
    }
}

impl PackageSource for LocalStore {
    fn resolve(
        &self,
        platform: Platform,
        name: &str,
        caps: &Capabilities,
    ) -> Result<ResolvedPackage, CoreError> {
        let triple = platform.triple();

        let platform_dir = self.root.join(&triple);
        if !platform_dir.is_dir() {
            return Err(CoreError::UnsupportedPlatform { platform: triple });
        }

        let unresolved = |reason: ResolveReason| CoreError::UnresolvedPackage {
            name: name.to_string(),
            platform: triple.clone(),
            reason,
        };

        let pkg_dir = platform_dir.join(name);
        if !pkg_dir.is_dir() {
            return Err(unresolved(ResolveReason::NotFound));
        }

        let meta = self.read_meta(&pkg_dir).map_err(&unresolved)?;

        if meta.unfree && !caps.allow_unfree {
            return Err(unresolved(ResolveReason::UnfreeBlocked));
        }

        // The gpu flag only concerns packages that declare a variant; a
        // declared variant with no directory fails rather than silently
        // handing back the base build.
        let root = match (caps.with_gpu, meta.variants.gpu) {
            (true, Some(variant)) => {
                let variant_dir = pkg_dir.join(&variant);
                if !variant_dir.is_dir() {
                    return Err(unresolved(ResolveReason::MissingGpuVariant { variant }));
                }
                variant_dir
            }
            _ => pkg_dir,
        };

        debug!("Resolved {} -> {}", name, root.display());

        Ok(ResolvedPackage {
            name: name.to_string(),
            root,
        })
    }
}
