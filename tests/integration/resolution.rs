//! Full registration-through-materialization flows.

use anyhow::Result;
use tempfile::TempDir;

use zigdeps::test_utils::{TestGit, init_test_logging};
use zigdeps::{Package, Packages};

/// Build a publishable package repository under `root/<repo_name>` whose
/// entry file imports the given externals (plus a local helper file).
fn publish_package(
    root: &std::path::Path,
    repo_name: &str,
    imports: &[&str],
) -> Result<TestGit> {
    let path = root.join(repo_name);
    std::fs::create_dir_all(&path)?;
    let git = TestGit::new(&path);
    git.init()?;

    let mut entry = String::from("const std = @import(\"std\");\n");
    entry.push_str("const helper = @import(\"helper.zig\");\n");
    for import in imports {
        entry.push_str(&format!("const {import} = @import(\"{import}\");\n"));
    }
    std::fs::create_dir_all(path.join("src"))?;
    std::fs::write(path.join("src/helper.zig"), "pub const shared = 1;\n")?;
    git.commit_file("src/main.zig", &entry, "initial")?;
    git.tag("v1.0.0")?;
    Ok(git)
}

#[test]
fn test_managed_registration_discovers_imports() -> Result<()> {
    init_test_logging(None);
    let temp = TempDir::new()?;
    let json = publish_package(temp.path(), "zig-json", &[])?;
    let app = publish_package(temp.path(), "zig-app", &["json"])?;

    let cache = temp.path().join("cache");
    let mut deps = Packages::try_new_at(&cache)?;
    deps.try_add(&app.file_url(), "v1.0.0")?;
    deps.try_add(&json.file_url(), "v1.0.0")?;

    let tree = deps.materialize("app").expect("app is registered");
    assert_eq!(tree.name, "app");
    assert!(tree.root.starts_with(&cache), "entry must live under the cache root");
    assert!(tree.root.ends_with("src/main.zig"));

    // The scan of app's entry discovered "json"; the registry resolved it.
    assert_eq!(tree.dependencies.len(), 1);
    assert_eq!(tree.dependencies[0].name, "json");
    assert!(tree.dependencies[0].root.ends_with("src/main.zig"));
    Ok(())
}

#[test]
fn test_unregistered_import_is_omitted_from_tree() -> Result<()> {
    init_test_logging(None);
    let temp = TempDir::new()?;
    let app = publish_package(temp.path(), "zig-app", &["json", "leftpad"])?;

    let cache = temp.path().join("cache");
    let mut deps = Packages::try_new_at(&cache)?;
    deps.try_add(&app.file_url(), "v1.0.0")?;

    // Neither declared import is registered: both are dropped silently.
    let tree = deps.materialize("app").unwrap();
    assert!(tree.dependencies.is_empty());
    Ok(())
}

#[test]
fn test_duplicate_managed_registration_is_fatal() -> Result<()> {
    init_test_logging(None);
    let temp = TempDir::new()?;
    let lib = publish_package(temp.path(), "zig-mylib", &[])?;

    let cache = temp.path().join("cache");
    let mut deps = Packages::try_new_at(&cache)?;
    deps.try_add(&lib.file_url(), "v1.0.0")?;

    // Same URL, same derived name - even at a different version.
    assert!(deps.try_add(&lib.file_url(), "main").is_err());
    assert!(deps.materialize("mylib").is_some());
    Ok(())
}

#[test]
fn test_missing_entry_file_is_fatal() -> Result<()> {
    init_test_logging(None);
    let temp = TempDir::new()?;
    let path = temp.path().join("zig-bare");
    std::fs::create_dir_all(&path)?;
    let git = TestGit::new(&path);
    git.init()?;
    git.commit_file("README.md", "no zig sources here\n", "initial")?;
    git.tag("v1.0.0")?;

    let cache = temp.path().join("cache");
    let mut deps = Packages::try_new_at(&cache)?;
    assert!(deps.try_add(&git.file_url(), "v1.0.0").is_err());
    Ok(())
}

#[test]
fn test_update_fast_forwards_branch_dependencies() -> Result<()> {
    init_test_logging(None);
    let temp = TempDir::new()?;
    let lib = publish_package(temp.path(), "zig-mylib", &[])?;

    let cache = temp.path().join("cache");
    let mut deps = Packages::try_new_at(&cache)?;
    deps.try_add(&lib.file_url(), "main")?;

    lib.commit_file("new.zig", "pub const fresh = true;\n", "add module")?;
    deps.try_update()?;

    let working_copy = deps.materialize("mylib").unwrap().root;
    let dir = working_copy.parent().unwrap().parent().unwrap();
    assert!(dir.join("new.zig").is_file());
    Ok(())
}

#[test]
fn test_update_preserves_local_edits_with_warning() -> Result<()> {
    init_test_logging(None);
    let temp = TempDir::new()?;
    let lib = publish_package(temp.path(), "zig-mylib", &[])?;

    let cache = temp.path().join("cache");
    let mut deps = Packages::try_new_at(&cache)?;
    deps.try_add(&lib.file_url(), "main")?;

    let entry = deps.materialize("mylib").unwrap().root;
    let edited = "pub const patched = true;\n";
    std::fs::write(&entry, edited)?;

    lib.commit_file("new.zig", "pub const fresh = true;\n", "add module")?;
    deps.try_update()?;

    // The dirty working copy kept its local edit and stayed behind.
    assert_eq!(std::fs::read_to_string(&entry)?, edited);
    let dir = entry.parent().unwrap().parent().unwrap();
    assert!(!dir.join("new.zig").exists());
    Ok(())
}

#[test]
fn test_second_resolution_run_fails_on_locked_cache() -> Result<()> {
    init_test_logging(None);
    let temp = TempDir::new()?;
    let cache = temp.path().join("cache");

    let first = Packages::try_new_at(&cache)?;
    let second = Packages::try_new_at(&cache);
    assert!(second.is_err(), "second run must fail fast while the first holds the lock");

    // The first run is unaffected by the failed contender.
    assert_eq!(first.cache_root(), cache.as_path());
    Ok(())
}

#[test]
fn test_mixed_registry_materializes_across_kinds() -> Result<()> {
    init_test_logging(None);
    let temp = TempDir::new()?;
    let lib = publish_package(temp.path(), "zig-netlib", &["config"])?;

    let project = temp.path().join("project");
    std::fs::create_dir_all(&project)?;
    let app_entry = project.join("main.zig");
    std::fs::write(&app_entry, "const netlib = @import(\"netlib\");\n")?;

    let cache = temp.path().join("cache");
    let mut deps = Packages::try_new_at(&cache)?;
    deps.try_add(&lib.file_url(), "v1.0.0")?;
    deps.try_add_package_path("app", &app_entry)?;
    deps.try_add_package("config", project.join("config.zig"), &[])?;

    let tree = deps.materialize("app").unwrap();
    assert_eq!(tree.dependencies.len(), 1);

    let netlib = &tree.dependencies[0];
    assert_eq!(netlib.name, "netlib");
    assert_eq!(netlib.dependencies.len(), 1);
    assert_eq!(netlib.dependencies[0].name, "config");
    Ok(())
}

#[test]
fn test_add_to_collects_roots_for_host_target() -> Result<()> {
    struct FakeExe {
        packages: Vec<Package>,
    }
    impl zigdeps::BuildTarget for FakeExe {
        fn add_package(&mut self, package: Package) {
            self.packages.push(package);
        }
    }

    init_test_logging(None);
    let temp = TempDir::new()?;
    let lib = publish_package(temp.path(), "zig-mylib", &[])?;

    let cache = temp.path().join("cache");
    let mut deps = Packages::try_new_at(&cache)?;
    deps.try_add(&lib.file_url(), "v1.0.0")?;
    deps.try_add_package("extra", "/elsewhere/extra.zig", &["mylib"])?;

    let mut exe = FakeExe {
        packages: Vec::new(),
    };
    deps.add_to(&mut exe);

    assert_eq!(exe.packages.len(), 2);
    assert_eq!(exe.packages[0].name, "mylib");
    assert_eq!(exe.packages[1].name, "extra");
    assert_eq!(exe.packages[1].dependencies[0].name, "mylib");
    Ok(())
}
