//! Error handling for zigdeps
//!
//! This module provides the error types and user-friendly error reporting for
//! the zigdeps resolution subsystem. The error system is designed around two
//! core principles:
//! 1. **Strongly-typed errors** for precise error handling in code
//! 2. **User-friendly messages** with actionable suggestions for the person
//!    running the build
//!
//! # Architecture
//!
//! The error system consists of two main types:
//! - [`ZigdepsError`] - Enumerated error types for all failure cases
//! - [`ErrorContext`] - Wrapper that adds user-friendly messages and suggestions
//!
//! # Error Categories
//!
//! Errors follow the resolution taxonomy:
//! - **Environment**: [`ZigdepsError::CacheLocked`], cache directory creation
//!   failures surfacing as [`ZigdepsError::IoError`]
//! - **Parse**: [`ZigdepsError::ImportParse`]
//! - **Resolution**: [`ZigdepsError::DuplicatePackage`],
//!   [`ZigdepsError::EntryFileNotFound`]
//! - **Version control**: [`ZigdepsError::GitNotFound`],
//!   [`ZigdepsError::GitCommandError`], [`ZigdepsError::GitCloneFailed`]
//!
//! Every category is fatal for the resolution run; soft conditions (dirty
//! working copy, oversized source file) are warnings, not errors, and never
//! reach this module.
//!
//! Use [`user_friendly_error`] to convert any error into a displayable format
//! with contextual suggestions before aborting the run.

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// The main error type for zigdeps operations
///
/// Each variant represents a specific failure mode and carries enough context
/// (package name, path, failing command) for a human to reproduce and fix the
/// failure manually. There are no retryable variants: the subsystem runs once
/// per build invocation and prefers fail-fast over silently-incomplete
/// dependency state.
#[derive(Error, Debug)]
pub enum ZigdepsError {
    /// Git operation failed during execution
    ///
    /// Raised when a git subprocess exits non-zero (outside the two probes
    /// whose exit codes are answers), terminates by signal, or fails to
    /// spawn. The `command` field echoes the full command line that failed.
    #[error("git operation failed: {command}")]
    GitCommandError {
        /// The full git command line that failed
        command: String,
        /// The error output from the git command
        stderr: String,
    },

    /// Git executable not found in PATH
    #[error("git is not installed or not found in PATH")]
    GitNotFound,

    /// Git repository clone failed
    #[error("failed to clone repository: {url}")]
    GitCloneFailed {
        /// The repository URL that failed to clone
        url: String,
        /// The reason for the clone failure
        reason: String,
    },

    /// The cache root is already locked by another resolution run
    #[error("dependency cache is locked by another process: {path}")]
    CacheLocked {
        /// Path of the lock file under the cache root
        path: String,
    },

    /// A source file contained a malformed import directive
    #[error("invalid import in {file}: {reason}")]
    ImportParse {
        /// The source file containing the malformed directive
        file: String,
        /// What was wrong with it
        reason: String,
    },

    /// A package name was registered twice
    ///
    /// The registry is left unchanged; the first registration wins and the
    /// process aborts.
    #[error("package '{name}' is already registered")]
    DuplicatePackage {
        /// The duplicated package name
        name: String,
    },

    /// None of the conventional entry files exist in a working copy
    #[error("no entry file found in {dir} (tried {candidates})")]
    EntryFileNotFound {
        /// The working copy that was probed
        dir: String,
        /// The probed candidate list, comma separated
        candidates: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Other error
    #[error("{message}")]
    Other {
        /// Generic error message
        message: String,
    },
}

impl Clone for ZigdepsError {
    fn clone(&self) -> Self {
        match self {
            Self::GitCommandError {
                command,
                stderr,
            } => Self::GitCommandError {
                command: command.clone(),
                stderr: stderr.clone(),
            },
            Self::GitNotFound => Self::GitNotFound,
            Self::GitCloneFailed {
                url,
                reason,
            } => Self::GitCloneFailed {
                url: url.clone(),
                reason: reason.clone(),
            },
            Self::CacheLocked {
                path,
            } => Self::CacheLocked {
                path: path.clone(),
            },
            Self::ImportParse {
                file,
                reason,
            } => Self::ImportParse {
                file: file.clone(),
                reason: reason.clone(),
            },
            Self::DuplicatePackage {
                name,
            } => Self::DuplicatePackage {
                name: name.clone(),
            },
            Self::EntryFileNotFound {
                dir,
                candidates,
            } => Self::EntryFileNotFound {
                dir: dir.clone(),
                candidates: candidates.clone(),
            },
            // std::io::Error does not implement Clone; demote to Other
            Self::IoError(e) => Self::Other {
                message: format!("IO error: {e}"),
            },
            Self::Other {
                message,
            } => Self::Other {
                message: message.clone(),
            },
        }
    }
}

/// Error context wrapper that provides user-friendly error information
///
/// `ErrorContext` wraps a [`ZigdepsError`] and adds optional suggestions and
/// details. This is how zigdeps presents fatal errors before terminating the
/// build.
///
/// # Display Format
///
/// 1. **error**: the main error message, red and bold
/// 2. **details**: additional context, yellow (optional)
/// 3. **suggestion**: actionable resolution steps, green (optional)
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying zigdeps error
    pub error: ZigdepsError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context with no suggestion or details.
    #[must_use]
    pub const fn new(error: ZigdepsError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add an actionable suggestion, displayed in green.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add details about why the error occurred, displayed in yellow.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error, details, and suggestion to stderr with terminal
    /// colors. This is the last output of a failed resolution run.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error to a user-friendly [`ErrorContext`] with actionable
/// suggestions.
///
/// This is the single entry point used by the fatal path of the public
/// registration surface: it recognizes [`ZigdepsError`] variants and common
/// IO failures and attaches tailored suggestions; anything else is displayed
/// with its full cause chain.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(zigdeps_error) = error.downcast_ref::<ZigdepsError>() {
        return create_error_context(zigdeps_error.clone());
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>()
        && io_error.kind() == std::io::ErrorKind::PermissionDenied
    {
        return ErrorContext::new(ZigdepsError::Other {
            message: error.to_string(),
        })
        .with_suggestion(
            "Check ownership of the cache directory or set ZIGDEPS_CACHE_DIR to a writable location",
        )
        .with_details("zigdeps could not read or write inside its cache directory");
    }

    // Generic error - include the full error chain for better diagnostics
    let mut message = error.to_string();

    let chain: Vec<String> = error
        .chain()
        .skip(1) // the root cause is already in to_string()
        .map(std::string::ToString::to_string)
        .collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(ZigdepsError::Other {
        message,
    })
}

/// Map each [`ZigdepsError`] variant to an [`ErrorContext`] with tailored
/// suggestions. Suggestions focus on actionable steps rather than internals.
fn create_error_context(error: ZigdepsError) -> ErrorContext {
    match &error {
        ZigdepsError::GitNotFound => ErrorContext::new(error.clone())
            .with_suggestion("Install git from https://git-scm.com/ or your package manager (e.g., 'brew install git', 'apt install git')")
            .with_details("zigdeps shells out to git to manage dependency working copies"),

        ZigdepsError::GitCommandError { command, stderr } => {
            let details = if stderr.trim().is_empty() {
                "The command produced no error output".to_string()
            } else {
                stderr.trim().to_string()
            };
            ErrorContext::new(error.clone())
                .with_suggestion(format!("Run the failing command manually to reproduce: {command}"))
                .with_details(details)
        }

        ZigdepsError::GitCloneFailed { url, reason } => ErrorContext::new(error.clone())
            .with_suggestion(format!("Verify the URL is reachable: git ls-remote {url}"))
            .with_details(reason.trim().to_string()),

        ZigdepsError::CacheLocked { .. } => ErrorContext::new(error.clone())
            .with_suggestion("Wait for the other build to finish, or remove the lock file if no other build is running")
            .with_details("Only one resolution run may mutate the shared dependency cache at a time"),

        ZigdepsError::ImportParse { .. } => ErrorContext::new(error.clone())
            .with_suggestion("Fix the @import directive; the argument must be a terminated string literal"),

        ZigdepsError::DuplicatePackage { name } => ErrorContext::new(error.clone())
            .with_suggestion(format!("Remove the second registration of '{name}' from the build description"))
            .with_details("Package names must be unique within one dependency registry"),

        ZigdepsError::EntryFileNotFound { .. } => ErrorContext::new(error.clone())
            .with_suggestion("Register the package with an explicit entry path instead of relying on convention"),

        _ => ErrorContext::new(error.clone()),
    }
}
