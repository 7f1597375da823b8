//! File locking for the shared dependency cache.
//!
//! This module provides the single process-safe exclusive lock that guards the
//! cache root. Unlike fine-grained per-entry locks, there is exactly one lock
//! for the whole cache: its purpose is mutual exclusion between whole
//! resolution runs, not arbitration within one run.

use anyhow::{Context, Result};
use fs4::fs_std::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use crate::constants::LOCK_FILE_NAME;
use crate::core::ZigdepsError;

/// The exclusive cache lock, held for the life of the resolution run.
///
/// Acquisition is non-blocking: if another process already holds the lock,
/// [`CacheLock::try_acquire`] fails immediately with
/// [`ZigdepsError::CacheLocked`] rather than waiting. A resolution run that
/// cannot lock the cache must not proceed, because every subsequent git
/// operation would race against the holder on shared repository state.
///
/// There is no explicit unlock operation. The open file handle is retained
/// inside the returned value; the operating system releases the lock when the
/// process terminates.
///
/// # Lock File Location
///
/// ```text
/// {cache_root}/.zigdeps.lock
/// ```
///
/// # Platform Notes
///
/// - **Windows**: Win32 `LockFile` API via [`fs4`]
/// - **Unix**: POSIX `fcntl()` locking via [`fs4`]
#[derive(Debug)]
pub struct CacheLock {
    _file: File,
    path: PathBuf,
}

impl CacheLock {
    /// Attempt to acquire the exclusive cache lock.
    ///
    /// The lock file is created if it does not exist; its content is never
    /// read or written, only its lock state matters.
    ///
    /// # Errors
    ///
    /// - [`ZigdepsError::CacheLocked`] if another process holds the lock
    /// - An IO error if the lock file cannot be created or opened
    pub fn try_acquire(cache_root: &Path) -> Result<Self> {
        let lock_path = cache_root.join(LOCK_FILE_NAME);

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)
            .with_context(|| format!("failed to open lock file: {}", lock_path.display()))?;

        let acquired = file
            .try_lock_exclusive()
            .with_context(|| format!("failed to lock {}", lock_path.display()))?;
        if !acquired {
            return Err(ZigdepsError::CacheLocked {
                path: lock_path.display().to_string(),
            }
            .into());
        }

        tracing::debug!(lock = %lock_path.display(), "cache lock acquired");

        Ok(Self {
            _file: file,
            path: lock_path,
        })
    }

    /// Path of the lock file this lock holds.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}
