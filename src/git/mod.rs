//! Git operations wrapper for zigdeps
//!
//! This module provides a safe, synchronous wrapper around the system `git`
//! command - the version synchronization engine of the resolver. Like Cargo,
//! zigdeps shells out to the installed git binary rather than linking a git
//! library, which keeps authentication, transports, and proxies exactly as
//! the user configured them.
//!
//! # Synchronization State Machine
//!
//! [`sync`] drives one dependency working copy through a fixed sequence, each
//! transition a single git invocation:
//!
//! ```text
//! Absent ──clone──▶ Cloned ──fetch──▶ {Clean, Dirty}
//! Clean ──switch (+ pull --ff-only on branches)──▶ Synced
//! Dirty ──warning, no further mutation this run──▶ DirtySkipped
//! ```
//!
//! A dirty working copy is deliberately not an error: local edits to a cached
//! dependency are preserved and the stale version is retained, with a warning
//! identifying the package. Every other git failure aborts the resolution run.

pub mod command_builder;

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::core::ZigdepsError;
use crate::git::command_builder::GitCommand;

/// Name of the git executable on this platform.
#[must_use]
pub const fn git_binary() -> &'static str {
    if cfg!(windows) { "git.exe" } else { "git" }
}

/// Check whether git is available on the PATH.
#[must_use]
pub fn is_git_installed() -> bool {
    which::which(git_binary()).is_ok()
}

/// Fail with [`ZigdepsError::GitNotFound`] when git is unavailable.
///
/// Called once when the resolution context is created, so the first
/// registration fails with a clear diagnostic instead of a spawn error.
pub fn ensure_git_available() -> Result<()> {
    if is_git_installed() {
        Ok(())
    } else {
        Err(ZigdepsError::GitNotFound.into())
    }
}

/// Outcome of synchronizing one working copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The working copy now reflects the requested version.
    Synced,
    /// The working copy had uncommitted local edits and was left untouched.
    DirtySkipped,
}

/// A dependency working copy under the cache root.
pub struct GitRepo {
    path: PathBuf,
    label: String,
}

impl GitRepo {
    /// Wrap an existing (or about to exist) working copy.
    ///
    /// `label` is the package name, used to tag log lines and warnings.
    pub fn new(path: impl AsRef<Path>, label: impl Into<String>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            label: label.into(),
        }
    }

    /// Path of the working copy.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Clone `url` into this working copy: shallow history, all branches,
    /// shallow submodules.
    pub fn clone_from(&self, url: &str) -> Result<()> {
        GitCommand::clone_shallow(url, &self.path).with_label(&self.label).execute()?;
        Ok(())
    }

    /// Fetch all remote refs, pruned and quiet, tags included.
    pub fn fetch(&self) -> Result<()> {
        GitCommand::fetch().current_dir(&self.path).with_label(&self.label).execute()?;
        Ok(())
    }

    /// Does the working copy differ from its current head?
    ///
    /// Exit code 1 from `git diff --quiet HEAD` is the "dirty" answer, not a
    /// failure; anything above 1 is fatal.
    pub fn is_dirty(&self) -> Result<bool> {
        let cmd = GitCommand::diff_quiet().current_dir(&self.path).with_label(&self.label);
        let command_line = cmd.command_line();
        let out = cmd.execute_status()?;
        match out.code {
            0 => Ok(false),
            1 => Ok(true),
            _ => Err(ZigdepsError::GitCommandError {
                command: command_line,
                stderr: out.stderr,
            }
            .into()),
        }
    }

    /// Does `name` exist as a remote-tracking branch (`refs/remotes/origin/*`)?
    ///
    /// The engine always fetches before asking, so remote-only branches are
    /// visible here; a ref that is not a remote branch is treated as a tag or
    /// commit and checked out detached.
    pub fn has_remote_branch(&self, name: &str) -> Result<bool> {
        let cmd =
            GitCommand::show_remote_branch(name).current_dir(&self.path).with_label(&self.label);
        let command_line = cmd.command_line();
        let out = cmd.execute_status()?;
        match out.code {
            0 => Ok(true),
            1 => Ok(false),
            _ => Err(ZigdepsError::GitCommandError {
                command: command_line,
                stderr: out.stderr,
            }
            .into()),
        }
    }

    /// Switch to a branch and fast-forward it to its upstream.
    pub fn switch_branch(&self, branch: &str) -> Result<()> {
        GitCommand::switch(branch).current_dir(&self.path).with_label(&self.label).execute()?;
        GitCommand::pull_ff_only().current_dir(&self.path).with_label(&self.label).execute()?;
        Ok(())
    }

    /// Switch to a tag or commit in detached mode.
    pub fn switch_detached(&self, ref_name: &str) -> Result<()> {
        GitCommand::switch_detached(ref_name)
            .current_dir(&self.path)
            .with_label(&self.label)
            .execute()?;
        Ok(())
    }
}

/// Ensure the working copy at `dir` reflects `version`, without discarding
/// uncommitted local edits.
///
/// Re-invoking with the same version label when already synced performs the
/// fetch (and pull, for branches) again but leaves on-disk content unchanged.
///
/// # Errors
///
/// Any git subprocess failure outside the dirty/branch probes is fatal and
/// carries the failing command in its diagnostic.
pub fn sync(name: &str, url: &str, version: &str, dir: &Path) -> Result<SyncOutcome> {
    let repo = GitRepo::new(dir, name);

    if !dir.exists() {
        tracing::debug!(package = name, url, version, "cloning into cache");
        repo.clone_from(url)?;
    }

    repo.fetch()?;

    if repo.is_dirty()? {
        tracing::warn!(
            package = name,
            path = %dir.display(),
            "working copy has uncommitted changes; leaving it on its current version"
        );
        return Ok(SyncOutcome::DirtySkipped);
    }

    if repo.has_remote_branch(version)? {
        repo.switch_branch(version)?;
    } else {
        repo.switch_detached(version)?;
    }

    tracing::debug!(package = name, version, "working copy synchronized");
    Ok(SyncOutcome::Synced)
}
