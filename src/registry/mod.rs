//! Dependency registry and package-tree materialization.
//!
//! The registry records uniquely named dependency records and expands any
//! registered name into the nested package tree handed to the host build
//! system. Records are created exactly once, at registration, and never
//! mutated afterward; the registry itself is process-scoped and not
//! persisted.
//!
//! # Record Kinds
//!
//! - [`Dependency::Managed`] - clone/fetch/checkout lifecycle fully owned by
//!   zigdeps; carries the source URL and the cache working-copy path
//! - [`Dependency::Tracked`] - the working copy already exists externally;
//!   only scanned, never fetched
//! - [`Dependency::Unmanaged`] - supplied whole by the caller; neither
//!   scanned nor fetched
//!
//! Every site that reads a record matches exhaustively on this enum, so a
//! new kind cannot be added without revisiting path resolution, tree
//! materialization, and update-all.

use anyhow::Result;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::constants::{ENTRY_FILE_CANDIDATES, PACKAGE_NAME_PREFIX, PACKAGE_NAME_SUFFIXES};
use crate::core::ZigdepsError;

/// One dependency record.
#[derive(Debug, Clone)]
pub enum Dependency {
    /// Fetched and synchronized by zigdeps.
    Managed {
        /// Source repository URL
        url: String,
        /// Working-copy directory under the cache root
        dir: PathBuf,
        /// Entry file inside the working copy
        entry: PathBuf,
        /// Names this package imports, in discovery order
        deps: Vec<String>,
    },
    /// Scanned but never fetched; the working copy is owned externally.
    Tracked {
        /// Entry file of the externally managed working copy
        entry: PathBuf,
        /// Names this package imports, in discovery order
        deps: Vec<String>,
    },
    /// Stored exactly as the caller supplied it.
    Unmanaged {
        /// Opaque entry-file reference
        entry: PathBuf,
        /// Caller-supplied dependency names
        deps: Vec<String>,
    },
}

impl Dependency {
    /// The entry file handed to the host build system for this record.
    #[must_use]
    pub fn entry(&self) -> &Path {
        match self {
            Self::Managed {
                entry, ..
            }
            | Self::Tracked {
                entry, ..
            }
            | Self::Unmanaged {
                entry, ..
            } => entry,
        }
    }

    /// The dependency names this record declares.
    #[must_use]
    pub fn deps(&self) -> &[String] {
        match self {
            Self::Managed {
                deps, ..
            }
            | Self::Tracked {
                deps, ..
            }
            | Self::Unmanaged {
                deps, ..
            } => deps,
        }
    }
}

/// A node of the materialized package tree.
///
/// Mirrors the module shape host build systems consume: a name, the module
/// root file, and the packages visible to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    /// Package name as registered
    pub name: String,
    /// Entry file acting as the module root
    pub root: PathBuf,
    /// Child packages, one per resolvable declared dependency
    pub dependencies: Vec<Package>,
}

/// Name-keyed store of dependency records.
///
/// Iteration order for bulk operations (update-all, handing roots to the
/// host) is registration order, tracked separately from the lookup map.
#[derive(Default)]
pub struct Registry {
    records: HashMap<String, Dependency>,
    order: Vec<String>,
}

impl Registry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record under `name`.
    ///
    /// # Errors
    ///
    /// [`ZigdepsError::DuplicatePackage`] when the name is already taken;
    /// the registry is left unchanged and the first registration wins.
    pub fn insert(&mut self, name: &str, dependency: Dependency) -> Result<()> {
        if self.records.contains_key(name) {
            return Err(ZigdepsError::DuplicatePackage {
                name: name.to_string(),
            }
            .into());
        }
        self.records.insert(name.to_string(), dependency);
        self.order.push(name.to_string());
        tracing::debug!(package = name, "registered dependency");
        Ok(())
    }

    /// Look up a record by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Dependency> {
        self.records.get(name)
    }

    /// Registered names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Expand `name` into a package tree.
    ///
    /// Returns `None` when the name itself is unregistered. A declared child
    /// absent from the registry is omitted silently - the omission surfaces
    /// later as the compiler's unresolved-import error, which points at the
    /// actual use site instead of the registry. A child already being
    /// expanded higher up the same branch is skipped the same way, so
    /// mutually importing packages cannot recurse endlessly.
    #[must_use]
    pub fn materialize(&self, name: &str) -> Option<Package> {
        let mut in_progress = Vec::new();
        self.materialize_inner(name, &mut in_progress)
    }

    fn materialize_inner(&self, name: &str, in_progress: &mut Vec<String>) -> Option<Package> {
        let record = self.get(name)?;
        in_progress.push(name.to_string());

        let mut dependencies = Vec::new();
        for dep in record.deps() {
            if in_progress.iter().any(|seen| seen == dep) {
                continue;
            }
            if let Some(package) = self.materialize_inner(dep, in_progress) {
                dependencies.push(package);
            }
        }

        in_progress.pop();

        Some(Package {
            name: name.to_string(),
            root: record.entry().to_path_buf(),
            dependencies,
        })
    }
}

/// Derive the canonical package name from a repository URL: the last path
/// segment, minus the `zig-` naming-convention prefix, minus any of the
/// known suffixes.
///
/// ```
/// use zigdeps::registry::name_from_url;
///
/// assert_eq!(name_from_url("https://example.com/zig-uuid.git"), "uuid");
/// assert_eq!(name_from_url("https://example.com/foo-zig"), "foo");
/// ```
#[must_use]
pub fn name_from_url(url: &str) -> String {
    let segment = url.trim_end_matches('/').rsplit('/').next().unwrap_or(url);

    let mut name = segment.strip_prefix(PACKAGE_NAME_PREFIX).unwrap_or(segment);

    loop {
        let mut stripped = false;
        for suffix in PACKAGE_NAME_SUFFIXES {
            if let Some(rest) = name.strip_suffix(suffix) {
                name = rest;
                stripped = true;
            }
        }
        if !stripped || name.is_empty() {
            break;
        }
    }

    name.to_string()
}

/// Probe the conventional entry files inside `dir`; first match wins.
///
/// # Errors
///
/// [`ZigdepsError::EntryFileNotFound`] when none of the candidates exist.
pub fn find_entry_file(dir: &Path) -> Result<PathBuf> {
    for candidate in ENTRY_FILE_CANDIDATES {
        let path = dir.join(candidate);
        if path.is_file() {
            tracing::trace!(entry = %path.display(), "entry file located");
            return Ok(path);
        }
    }

    Err(ZigdepsError::EntryFileNotFound {
        dir: dir.display().to_string(),
        candidates: ENTRY_FILE_CANDIDATES.join(", "),
    }
    .into())
}
