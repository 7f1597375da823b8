//! Global constants used throughout the zigdeps codebase.
//!
//! This module contains the size ceiling for scanned sources, cache layout
//! names, and the Zig source conventions the scanner and registry rely on.
//! Defining them centrally improves maintainability and makes magic values
//! more discoverable.

/// Maximum size of a Zig source file the import scanner will read (8 MiB).
///
/// Files larger than this are skipped with a warning and contribute zero
/// imports. Hand-written entry files never approach this; the ceiling exists
/// so a stray generated blob with a `.zig` extension cannot stall resolution.
pub const MAX_SCAN_FILE_SIZE: u64 = 8 * 1024 * 1024;

/// Name of the single lock file kept directly under the cache root.
///
/// Exactly one resolution run may hold this lock at a time; a second run
/// started concurrently fails fast instead of racing on shared git state.
pub const LOCK_FILE_NAME: &str = ".zigdeps.lock";

/// Environment variable that overrides the platform-default cache root.
pub const CACHE_DIR_ENV: &str = "ZIGDEPS_CACHE_DIR";

/// Placeholder substituted for `/` when a repository URL becomes a cache
/// directory name. `!` is a legal filename character on all supported
/// platforms and does not occur in the path segments of repository URLs.
pub const PATH_SEPARATOR_PLACEHOLDER: char = '!';

/// Conventional entry files probed inside a dependency's working copy,
/// in order; the first one that exists becomes the scan root and the module
/// root handed to the host build system.
pub const ENTRY_FILE_CANDIDATES: &[&str] = &["src/main.zig", "src/lib.zig", "main.zig", "lib.zig"];

/// Import names resolved by the Zig compiler itself; never treated as
/// external packages by the scanner.
pub const RESERVED_IMPORTS: &[&str] = &["std", "builtin", "root"];

/// File extension that marks an import argument as a local file reference
/// rather than a package name.
pub const ZIG_SOURCE_SUFFIX: &str = ".zig";

/// Prefix stripped from repository names when deriving a package name
/// (`zig-uuid` -> `uuid`).
pub const PACKAGE_NAME_PREFIX: &str = "zig-";

/// Suffixes stripped (repeatedly) from repository names when deriving a
/// package name (`uuid.git` -> `uuid`, `foo-zig` -> `foo`).
pub const PACKAGE_NAME_SUFFIXES: &[&str] = &[".git", "-zig", ".zig"];
