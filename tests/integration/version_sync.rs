//! Version synchronization engine tests against real repositories.

use anyhow::Result;
use std::process::Command;
use tempfile::TempDir;

use zigdeps::git::{SyncOutcome, sync};
use zigdeps::test_utils::{TestGit, init_test_logging};

/// Build a source repository with one commit on `main` and a `v1.0.0` tag.
fn source_repo(temp: &TempDir) -> Result<TestGit> {
    let path = temp.path().join("zig-mylib");
    std::fs::create_dir_all(&path)?;
    let git = TestGit::new(&path);
    git.init()?;
    git.commit_file("src/main.zig", "const std = @import(\"std\");\n", "initial")?;
    git.tag("v1.0.0")?;
    Ok(git)
}

fn current_branch(dir: &std::path::Path) -> String {
    let output = Command::new("git")
        .args(["branch", "--show-current"])
        .current_dir(dir)
        .output()
        .expect("git branch --show-current");
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

#[test]
fn test_absent_working_copy_is_cloned_and_synced() -> Result<()> {
    init_test_logging(None);
    let temp = TempDir::new()?;
    let source = source_repo(&temp)?;
    let dir = temp.path().join("cache").join("mylib@v1.0.0");

    let outcome = sync("mylib", &source.file_url(), "v1.0.0", &dir)?;

    assert_eq!(outcome, SyncOutcome::Synced);
    assert!(dir.join("src/main.zig").is_file());
    Ok(())
}

#[test]
fn test_resync_same_version_is_idempotent() -> Result<()> {
    init_test_logging(None);
    let temp = TempDir::new()?;
    let source = source_repo(&temp)?;
    let dir = temp.path().join("cache").join("mylib@v1.0.0");

    sync("mylib", &source.file_url(), "v1.0.0", &dir)?;
    let head_after_first = TestGit::new(&dir).rev_parse_head()?;

    let outcome = sync("mylib", &source.file_url(), "v1.0.0", &dir)?;
    let head_after_second = TestGit::new(&dir).rev_parse_head()?;

    assert_eq!(outcome, SyncOutcome::Synced);
    assert_eq!(head_after_first, head_after_second);
    Ok(())
}

#[test]
fn test_tag_version_checks_out_detached() -> Result<()> {
    init_test_logging(None);
    let temp = TempDir::new()?;
    let source = source_repo(&temp)?;
    let dir = temp.path().join("cache").join("mylib@v1.0.0");

    sync("mylib", &source.file_url(), "v1.0.0", &dir)?;

    // Detached head: no current branch name.
    assert_eq!(current_branch(&dir), "");
    Ok(())
}

#[test]
fn test_branch_version_stays_on_branch_and_fast_forwards() -> Result<()> {
    init_test_logging(None);
    let temp = TempDir::new()?;
    let source = source_repo(&temp)?;
    let dir = temp.path().join("cache").join("mylib@main");

    sync("mylib", &source.file_url(), "main", &dir)?;
    assert_eq!(current_branch(&dir), "main");
    assert!(!dir.join("extra.zig").exists());

    // Advance the source branch; a re-sync must fast-forward onto it.
    source.commit_file("extra.zig", "pub const more = true;\n", "add extra")?;
    sync("mylib", &source.file_url(), "main", &dir)?;

    assert_eq!(current_branch(&dir), "main");
    assert!(dir.join("extra.zig").is_file());
    assert_eq!(TestGit::new(&dir).rev_parse_head()?, source.rev_parse_head()?);
    Ok(())
}

#[test]
fn test_dirty_working_copy_is_skipped_and_preserved() -> Result<()> {
    init_test_logging(None);
    let temp = TempDir::new()?;
    let source = source_repo(&temp)?;
    let dir = temp.path().join("cache").join("mylib@main");

    sync("mylib", &source.file_url(), "main", &dir)?;

    // A local, uncommitted edit to the cached dependency.
    let edited = "const std = @import(\"std\");\n// local debugging hack\n";
    std::fs::write(dir.join("src/main.zig"), edited)?;

    // Advance the source so a real sync would move the working copy.
    source.commit_file("extra.zig", "pub const more = true;\n", "add extra")?;

    let outcome = sync("mylib", &source.file_url(), "main", &dir)?;

    assert_eq!(outcome, SyncOutcome::DirtySkipped);
    assert_eq!(std::fs::read_to_string(dir.join("src/main.zig"))?, edited);
    assert!(!dir.join("extra.zig").exists(), "skipped working copy must not move");
    Ok(())
}

#[test]
fn test_remote_only_branch_is_detected_after_fetch() -> Result<()> {
    init_test_logging(None);
    let temp = TempDir::new()?;
    let source = source_repo(&temp)?;

    // Sync main first so the clone predates the feature branch entirely.
    let dir = temp.path().join("cache").join("mylib@feature");
    sync("mylib", &source.file_url(), "main", &dir)?;

    source.create_branch("feature")?;
    source.commit_file("feat.zig", "pub const feat = 1;\n", "feature work")?;

    let outcome = sync("mylib", &source.file_url(), "feature", &dir)?;

    assert_eq!(outcome, SyncOutcome::Synced);
    assert_eq!(current_branch(&dir), "feature");
    assert!(dir.join("feat.zig").is_file());
    Ok(())
}

#[test]
fn test_unknown_ref_is_fatal() -> Result<()> {
    init_test_logging(None);
    let temp = TempDir::new()?;
    let source = source_repo(&temp)?;
    let dir = temp.path().join("cache").join("mylib@nope");

    assert!(sync("mylib", &source.file_url(), "does-not-exist", &dir).is_err());
    Ok(())
}

#[test]
fn test_unreachable_url_is_fatal() {
    init_test_logging(None);
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("cache").join("ghost@v1");

    let err = sync("ghost", "file:///nonexistent/ghost.git", "v1", &dir).unwrap_err();
    let message = format!("{err:#}");
    assert!(message.contains("clone"), "diagnostic should name the failing operation: {message}");
}
