//! Type-safe git command builder for consistent command execution
//!
//! This module provides a fluent API for building and executing git commands,
//! eliminating duplication and ensuring consistent error handling across the
//! version synchronization engine.
//!
//! Execution is synchronous and blocking: a resolution run issues git commands
//! strictly one at a time, and there is no cancellation or timeout mechanism.
//! A command either completes and its exit status is inspected, or its failure
//! (non-zero exit, signal termination, spawn error) aborts the whole run with
//! the failing command echoed in the diagnostic.

use anyhow::{Context, Result};
use std::path::Path;
use std::process::{Command, Stdio};

use crate::core::ZigdepsError;
use crate::git::git_binary;

/// Builder for constructing and executing git commands.
///
/// The builder handles working-directory selection (via git's `-C` flag, so
/// operations are independent of the process working directory), output
/// capture, tracing of every invocation, and mapping of failures to typed
/// errors.
///
/// # Examples
///
/// ```rust,ignore
/// let output = GitCommand::fetch()
///     .current_dir("/path/to/repo")
///     .with_label("uuid")
///     .execute()?;
/// ```
pub struct GitCommand {
    /// Arguments passed to git (e.g., ["fetch", "--all"])
    args: Vec<String>,

    /// Working directory, passed as `git -C <dir>` when set
    current_dir: Option<std::path::PathBuf>,

    /// Optional label (package name) included in log lines
    label: Option<String>,

    /// For clone commands, the URL for better error messages
    clone_url: Option<String>,
}

/// Captured output from a successfully spawned git command.
#[derive(Debug)]
pub struct GitCommandOutput {
    /// Exit code; meaningful only for callers that inspect status
    pub code: i32,
    /// Standard output from the git command
    pub stdout: String,
    /// Standard error output from the git command
    pub stderr: String,
}

impl GitCommand {
    /// Create an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            args: Vec::new(),
            current_dir: None,
            label: None,
            clone_url: None,
        }
    }

    /// Set the working directory for the command.
    #[must_use]
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Add multiple arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set a label (typically the package name) included in debug log
    /// messages, to tell apart the invocations of one resolution run.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// The full command line this builder will run, for diagnostics.
    #[must_use]
    pub fn command_line(&self) -> String {
        let mut parts = vec![git_binary().to_string()];
        if let Some(ref dir) = self.current_dir {
            parts.push("-C".to_string());
            parts.push(dir.display().to_string());
        }
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }

    /// Execute the command, requiring a zero exit status.
    ///
    /// # Errors
    ///
    /// - [`ZigdepsError::GitCloneFailed`] for failed clone commands
    /// - [`ZigdepsError::GitCommandError`] for any other non-zero exit or
    ///   signal termination, with the failing command line echoed
    /// - A spawn failure (git missing, permissions) with context attached
    pub fn execute(self) -> Result<GitCommandOutput> {
        let command_line = self.command_line();
        let is_clone = self.args.first().is_some_and(|a| a == "clone");
        let clone_url = self.clone_url.clone();

        let output = self.run()?;

        if output.code != 0 {
            let error = if is_clone {
                ZigdepsError::GitCloneFailed {
                    url: clone_url.unwrap_or_else(|| "unknown".to_string()),
                    reason: output.stderr,
                }
            } else {
                ZigdepsError::GitCommandError {
                    command: command_line,
                    stderr: output.stderr,
                }
            };
            return Err(error.into());
        }

        Ok(output)
    }

    /// Execute the command and hand back the exit status for inspection.
    ///
    /// Used by the two probes whose non-zero exit codes are answers rather
    /// than failures (`diff --quiet`, `show-ref --verify --quiet`). Spawn
    /// errors and signal termination are still fatal.
    pub fn execute_status(self) -> Result<GitCommandOutput> {
        self.run()
    }

    fn run(self) -> Result<GitCommandOutput> {
        let git = git_binary();
        let mut full_args: Vec<String> = Vec::new();
        if let Some(ref dir) = self.current_dir {
            full_args.push("-C".to_string());
            full_args.push(dir.display().to_string());
        }
        full_args.extend(self.args.iter().cloned());

        if let Some(ref label) = self.label {
            tracing::debug!(target: "git", "({}) Executing command: {} {}", label, git, full_args.join(" "));
        } else {
            tracing::debug!(target: "git", "Executing command: {} {}", git, full_args.join(" "));
        }

        let command_line = self.command_line();

        let output = Command::new(git)
            .args(&full_args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .with_context(|| format!("failed to execute {command_line}"))?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        let Some(code) = output.status.code() else {
            // Terminated by a signal; no exit code to inspect.
            return Err(ZigdepsError::GitCommandError {
                command: command_line,
                stderr: format!("terminated by signal: {}", output.status),
            }
            .into());
        };

        if let Some(ref label) = self.label {
            tracing::trace!(target: "git", "({}) exit code {}", label, code);
        } else {
            tracing::trace!(target: "git", "exit code {}", code);
        }

        Ok(GitCommandOutput {
            code,
            stdout,
            stderr,
        })
    }
}

impl Default for GitCommand {
    fn default() -> Self {
        Self::new()
    }
}

// Convenience builders for the fixed flag sets the sync engine uses.

impl GitCommand {
    /// `git clone --depth 1 --no-single-branch --recurse-submodules
    /// --shallow-submodules <url> <target>`
    ///
    /// Shallow history keeps first materialization cheap; `--no-single-branch`
    /// keeps every remote branch switchable later; submodules are cloned
    /// shallow for the same reason.
    #[must_use]
    pub fn clone_shallow(url: &str, target: impl AsRef<Path>) -> Self {
        let mut cmd = Self::new().args([
            "clone",
            "--depth",
            "1",
            "--no-single-branch",
            "--recurse-submodules",
            "--shallow-submodules",
        ]);
        cmd.args.push(url.to_string());
        cmd.args.push(target.as_ref().display().to_string());
        cmd.clone_url = Some(url.to_string());
        cmd
    }

    /// `git fetch --all --prune --quiet --tags`
    #[must_use]
    pub fn fetch() -> Self {
        Self::new().args(["fetch", "--all", "--prune", "--quiet", "--tags"])
    }

    /// `git diff --quiet HEAD` - exit 0 means clean, exit 1 means dirty.
    #[must_use]
    pub fn diff_quiet() -> Self {
        Self::new().args(["diff", "--quiet", "HEAD"])
    }

    /// `git show-ref --verify --quiet refs/remotes/origin/<name>` - exit 0
    /// means the remote-tracking branch exists.
    #[must_use]
    pub fn show_remote_branch(name: &str) -> Self {
        Self::new()
            .args(["show-ref", "--verify", "--quiet"])
            .args([format!("refs/remotes/origin/{name}")])
    }

    /// `git switch <branch>`
    #[must_use]
    pub fn switch(branch: &str) -> Self {
        Self::new().args(["switch", branch])
    }

    /// `git switch --detach <ref>` for tags and commits.
    #[must_use]
    pub fn switch_detached(ref_name: &str) -> Self {
        Self::new().args(["switch", "--detach", ref_name])
    }

    /// `git pull --ff-only --quiet`
    #[must_use]
    pub fn pull_ff_only() -> Self {
        Self::new().args(["pull", "--ff-only", "--quiet"])
    }
}
