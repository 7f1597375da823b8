//! zigdeps - build-time package manager for Zig projects
//!
//! A git-backed dependency resolver that a host build description drives
//! directly: register the repositories a project depends on, and zigdeps
//! synchronizes per-version working copies under a shared locked cache,
//! discovers what each dependency itself imports by scanning its Zig sources,
//! and hands the host a nested package tree ready to attach to compile steps.
//!
//! # Architecture Overview
//!
//! zigdeps follows a register/materialize model:
//! - Dependencies are fetched directly from git repositories (no central
//!   registry) into one cache directory per (URL, version) pair
//! - Working copies are reconciled on every run, never recreated, and local
//!   edits to them are preserved with a warning instead of being overwritten
//! - A package's own dependencies are discovered from its sources, so the
//!   registry reflects what the code actually imports
//!
//! # Core Modules
//!
//! - [`cache`] - Shared cache root, deterministic per-version directories,
//!   and the process-wide exclusive run lock
//! - [`git`] - Version synchronization engine shelling out to system git
//! - [`scanner`] - Transitive `@import` discovery over Zig sources
//! - [`registry`] - Dependency records and package-tree materialization
//! - [`core`] - Error types and user-facing error display
//!
//! # Example
//!
//! ```rust,no_run
//! use zigdeps::{BuildTarget, Package, Packages};
//!
//! struct Exe {
//!     packages: Vec<Package>,
//! }
//!
//! impl BuildTarget for Exe {
//!     fn add_package(&mut self, package: Package) {
//!         self.packages.push(package);
//!     }
//! }
//!
//! let mut deps = Packages::new();
//! deps.add("https://github.com/ziglibs/zig-uuid.git", "v1.2.0");
//! deps.add("https://github.com/example/known-folders-zig", "master");
//!
//! let mut exe = Exe { packages: Vec::new() };
//! deps.add_to(&mut exe);
//! ```
//!
//! Fatal conditions (unreachable cache, locked cache, git failures, malformed
//! imports, duplicate names, missing entry files) print a diagnostic and
//! terminate the process with a non-zero status: a build description cannot
//! meaningfully continue with half-resolved dependencies. Hosts that prefer
//! `Result` propagation can use the `try_*` twins of every operation.

pub mod cache;
pub mod constants;
pub mod core;
pub mod git;
pub mod registry;
pub mod scanner;

// test_utils is available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

use anyhow::Result;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::cache::Cache;
use crate::core::user_friendly_error;
use crate::registry::{Dependency, Registry};

pub use crate::registry::{Package, name_from_url};

/// Receiver for materialized package trees.
///
/// The host build system implements this for whatever owns compile steps;
/// [`Packages::add_to`] hands over one tree per registered package.
pub trait BuildTarget {
    /// Attach one materialized package (and its nested dependencies).
    fn add_package(&mut self, package: Package);
}

/// The resolution context: cache guard, lock handle, dependency registry,
/// and the per-run visited set shared by all scans.
///
/// One `Packages` value spans one resolution run, from first registration
/// through tree materialization. Creating it locks the shared cache for the
/// life of the process; a second build started meanwhile fails fast instead
/// of racing on shared git state.
pub struct Packages {
    cache: Cache,
    registry: Registry,
    visited: HashSet<String>,
}

impl Packages {
    /// Open the cache, acquire the run lock, and return an empty context.
    ///
    /// Fatal on any environment error (git missing, cache unreachable, cache
    /// already locked).
    #[must_use]
    pub fn new() -> Self {
        Self::try_new().unwrap_or_else(|e| fatal(e))
    }

    /// `Result`-returning form of [`Packages::new`].
    pub fn try_new() -> Result<Self> {
        git::ensure_git_available()?;
        Ok(Self::with_cache(Cache::open()?))
    }

    /// Open the context against an explicit cache root.
    ///
    /// Used by tests and hosts that manage their own cache location.
    pub fn try_new_at(cache_root: impl Into<PathBuf>) -> Result<Self> {
        git::ensure_git_available()?;
        Ok(Self::with_cache(Cache::open_at(cache_root)?))
    }

    fn with_cache(cache: Cache) -> Self {
        Self {
            cache,
            registry: Registry::new(),
            visited: HashSet::new(),
        }
    }

    /// Register a managed dependency: synchronize its working copy to
    /// `version`, locate its entry file, and scan its imports.
    ///
    /// The package name is derived from the URL
    /// (`https://…/zig-uuid.git` registers as `uuid`).
    pub fn add(&mut self, url: &str, version: &str) {
        self.try_add(url, version).unwrap_or_else(|e| fatal(e));
    }

    /// `Result`-returning form of [`Packages::add`].
    pub fn try_add(&mut self, url: &str, version: &str) -> Result<()> {
        let name = name_from_url(url);
        let dir = self.cache.repo_dir(url, version);

        git::sync(&name, url, version, &dir)?;

        let entry = registry::find_entry_file(&dir)?;
        let deps = self.scan(&entry)?;

        self.registry.insert(
            &name,
            Dependency::Managed {
                url: url.to_string(),
                dir,
                entry,
                deps,
            },
        )
    }

    /// Register a tracked dependency: an existing working copy that zigdeps
    /// scans but never fetches.
    pub fn add_package_path(&mut self, name: &str, entry: impl AsRef<Path>) {
        self.try_add_package_path(name, entry).unwrap_or_else(|e| fatal(e));
    }

    /// `Result`-returning form of [`Packages::add_package_path`].
    pub fn try_add_package_path(&mut self, name: &str, entry: impl AsRef<Path>) -> Result<()> {
        let entry = entry.as_ref().to_path_buf();
        let deps = self.scan(&entry)?;

        self.registry.insert(
            name,
            Dependency::Tracked {
                entry,
                deps,
            },
        )
    }

    /// Register an unmanaged dependency record exactly as supplied: no
    /// scanning, no fetching.
    pub fn add_package(&mut self, name: &str, entry: impl AsRef<Path>, deps: &[&str]) {
        self.try_add_package(name, entry, deps).unwrap_or_else(|e| fatal(e));
    }

    /// `Result`-returning form of [`Packages::add_package`].
    pub fn try_add_package(
        &mut self,
        name: &str,
        entry: impl AsRef<Path>,
        deps: &[&str],
    ) -> Result<()> {
        self.registry.insert(
            name,
            Dependency::Unmanaged {
                entry: entry.as_ref().to_path_buf(),
                deps: deps.iter().map(ToString::to_string).collect(),
            },
        )
    }

    /// Re-synchronize every managed working copy to its registered version.
    ///
    /// The version label is recovered from the `@`-suffix of each cache
    /// directory. Tracked and unmanaged records are untouched, and import
    /// lists are not re-scanned.
    pub fn update(&mut self) {
        self.try_update().unwrap_or_else(|e| fatal(e));
    }

    /// `Result`-returning form of [`Packages::update`].
    pub fn try_update(&mut self) -> Result<()> {
        for name in self.registry.names() {
            match self.registry.get(name) {
                Some(Dependency::Managed {
                    url,
                    dir,
                    ..
                }) => {
                    let Some(version) = cache::version_from_repo_dir(dir) else {
                        anyhow::bail!(
                            "cache directory {} carries no version label",
                            dir.display()
                        );
                    };
                    git::sync(name, url, &version, dir)?;
                }
                Some(Dependency::Tracked { .. } | Dependency::Unmanaged { .. }) | None => {}
            }
        }
        Ok(())
    }

    /// Materialize every registered package, in registration order, into the
    /// host build target.
    pub fn add_to(&self, target: &mut dyn BuildTarget) {
        for name in self.registry.names() {
            if let Some(package) = self.registry.materialize(name) {
                target.add_package(package);
            }
        }
    }

    /// Expand one registered name into its package tree.
    #[must_use]
    pub fn materialize(&self, name: &str) -> Option<Package> {
        self.registry.materialize(name)
    }

    /// The cache root this run is locked against.
    #[must_use]
    pub fn cache_root(&self) -> &Path {
        self.cache.root()
    }

    /// Run one import scan with a cleared visited set.
    ///
    /// Each registration is an independent resolution: names counted for an
    /// earlier package must be countable again for a later one.
    fn scan(&mut self, entry: &Path) -> Result<Vec<String>> {
        self.visited.clear();
        scanner::scan_imports(entry, &mut self.visited)
    }
}

/// Install a `tracing` subscriber honoring `RUST_LOG`, writing to stderr.
///
/// Without `RUST_LOG`, warnings (dirty working copies, oversized sources)
/// are still shown. Optional; hosts that already install their own
/// subscriber skip this. Calling it twice is harmless.
pub fn init_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Print a user-friendly diagnostic and terminate the resolution run.
fn fatal(error: anyhow::Error) -> ! {
    user_friendly_error(error).display();
    std::process::exit(1);
}
