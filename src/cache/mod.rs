//! Shared on-disk cache for dependency working copies.
//!
//! This module owns the cache root directory and the process-wide exclusive
//! lock that guards it. Every dependency working copy lives directly under the
//! root in a directory whose name is a pure function of (URL, version), so the
//! same registration always reconciles the same working copy across runs
//! instead of recreating it.
//!
//! # Cache Location
//!
//! 1. `ZIGDEPS_CACHE_DIR` environment variable (if set)
//! 2. Platform-specific default:
//!    - Windows: `%LOCALAPPDATA%\zigdeps\cache`
//!    - macOS/Linux: `~/.zigdeps/cache`
//!
//! # Layout
//!
//! ```text
//! {cache_root}/
//! ├── .zigdeps.lock                                  # exclusive run lock
//! ├── https:!!github.com!ziglibs!zig-uuid.git@v1.2.0 # one dir per (URL, version)
//! └── https:!!example.com!foo-zig@main
//! ```
//!
//! `/` in URLs is replaced by `!` so the directory name stays a single path
//! component; the version label follows after an `@` delimiter.

pub mod lock;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::constants::{CACHE_DIR_ENV, PATH_SEPARATOR_PLACEHOLDER};

pub use lock::CacheLock;

/// The cache directory guard.
///
/// Opening a `Cache` ensures the root directory exists (creating it if absent
/// is not an error) and acquires the exclusive non-blocking run lock. The
/// lock handle is owned by this value and held until the process exits.
pub struct Cache {
    root: PathBuf,
    _lock: CacheLock,
}

impl Cache {
    /// Open the cache at the default (or env-overridden) location and lock it.
    ///
    /// # Errors
    ///
    /// Fails if the root cannot be determined or created, or if another
    /// resolution run already holds the lock.
    pub fn open() -> Result<Self> {
        Self::open_at(default_cache_root()?)
    }

    /// Open the cache at an explicit root and lock it.
    ///
    /// Used directly by tests; `open` resolves the conventional root first.
    pub fn open_at(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)
            .with_context(|| format!("failed to create cache directory {}", root.display()))?;

        let lock = CacheLock::try_acquire(&root)?;
        tracing::debug!(root = %root.display(), "cache opened");

        Ok(Self {
            root,
            _lock: lock,
        })
    }

    /// The cache root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Compute the working-copy directory for a (URL, version) pair.
    ///
    /// This is a pure function of its inputs: the same pair always maps to
    /// the same directory, which is what makes reconciliation (rather than
    /// re-cloning) possible across runs. The path may or may not exist yet.
    #[must_use]
    pub fn repo_dir(&self, url: &str, version: &str) -> PathBuf {
        self.root.join(repo_dir_name(url, version))
    }
}

/// Directory name for a (URL, version) pair: the URL with `/` replaced by a
/// placeholder, then `@` and the version label.
#[must_use]
pub fn repo_dir_name(url: &str, version: &str) -> String {
    let mut name = url.replace('/', &PATH_SEPARATOR_PLACEHOLDER.to_string());
    name.push('@');
    name.push_str(version);
    name
}

/// Recover the version label embedded in a working-copy directory name.
///
/// Returns `None` for paths that were not produced by [`repo_dir_name`].
#[must_use]
pub fn version_from_repo_dir(dir: &Path) -> Option<String> {
    let name = dir.file_name()?.to_str()?;
    let (_, version) = name.rsplit_once('@')?;
    if version.is_empty() {
        return None;
    }
    Some(version.to_string())
}

/// Resolve the cache root: environment override first, then the platform
/// convention.
fn default_cache_root() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(CACHE_DIR_ENV) {
        return Ok(PathBuf::from(dir));
    }

    let root = if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .ok_or_else(|| anyhow::anyhow!("unable to determine local data directory"))?
            .join("zigdeps")
            .join("cache")
    } else {
        dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("unable to determine home directory"))?
            .join(".zigdeps")
            .join("cache")
    };

    Ok(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn test_repo_dir_name_replaces_separators() {
        let name = repo_dir_name("https://example.com/zig-uuid.git", "v1.2.0");
        assert_eq!(name, "https:!!example.com!zig-uuid.git@v1.2.0");
        assert!(!name.contains('/'));
    }

    #[test]
    fn test_repo_dir_name_is_stable() {
        let a = repo_dir_name("https://example.com/foo-zig", "main");
        let b = repo_dir_name("https://example.com/foo-zig", "main");
        assert_eq!(a, b);
    }

    #[test]
    fn test_version_round_trips_through_dir_name() {
        let temp = TempDir::new().unwrap();
        let cache = Cache::open_at(temp.path()).unwrap();

        let dir = cache.repo_dir("https://example.com/foo-zig", "v0.4.1");
        assert_eq!(version_from_repo_dir(&dir).as_deref(), Some("v0.4.1"));
    }

    #[test]
    fn test_version_with_at_in_url() {
        // ssh-style URLs contain '@'; rsplit keeps the last delimiter ours
        let dir = PathBuf::from("git@github.com:a!b@v2");
        assert_eq!(version_from_repo_dir(&dir).as_deref(), Some("v2"));
    }

    #[test]
    fn test_version_from_foreign_dir_name() {
        assert_eq!(version_from_repo_dir(Path::new("no-version-here")), None);
    }

    #[test]
    fn test_open_creates_missing_root() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("nested").join("cache");
        assert!(!root.exists());

        let cache = Cache::open_at(&root).unwrap();
        assert!(cache.root().is_dir());
    }

    #[test]
    fn test_second_open_fails_while_locked() {
        let temp = TempDir::new().unwrap();
        let _first = Cache::open_at(temp.path()).unwrap();

        assert!(Cache::open_at(temp.path()).is_err());
    }

    #[test]
    #[serial]
    fn test_env_override_selects_root() {
        let temp = TempDir::new().unwrap();
        // SAFETY: serialized test; no other thread reads the environment here.
        unsafe { std::env::set_var(CACHE_DIR_ENV, temp.path()) };
        let root = default_cache_root().unwrap();
        unsafe { std::env::remove_var(CACHE_DIR_ENV) };

        assert_eq!(root, temp.path());
    }
}
