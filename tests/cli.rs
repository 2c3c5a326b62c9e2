use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::io::Read;
use std::path::Path;
use std::process::Command;
use tempfile::tempdir;

fn write(path: &Path, data: &[u8]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, data).unwrap();
}

fn zip_names(archive: &Path) -> Vec<String> {
    let mut zip = zip::ZipArchive::new(fs::File::open(archive).unwrap()).unwrap();
    let mut names: Vec<String> = (0..zip.len()).map(|i| zip.by_index(i).unwrap().name().to_string()).collect();
    names.sort();
    names
}

#[test]
fn test_cli_compress_clean_restore_cycle() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Setup: a small project tree
    let project = tempdir()?;
    let root = project.path();
    write(&root.join("a/x.meta"), b"guid: 11");
    write(&root.join("a/b/y.meta"), b"guid: 22");
    write(&root.join("a/b/z.txt"), b"plain");

    // 2. Compress
    let mut cmd = Command::cargo_bin("metapack")?;
    cmd.arg("--root").arg(root).arg("compress");
    cmd.assert()
        .success()
        .stderr(predicate::str::contains("a/x.meta").and(predicate::str::contains("SUCCESS")));

    let archive = root.join("MetaFilesCompressed.zip");
    assert!(archive.exists());
    assert_eq!(zip_names(&archive), vec!["a/b/y.meta", "a/x.meta"]);
    assert!(!root.join(".meta-staging").exists());

    // 3. Clean
    let mut cmd = Command::cargo_bin("metapack")?;
    cmd.arg("clean").arg("--root").arg(root);
    cmd.assert().success();
    assert!(!root.join("a/x.meta").exists());
    assert!(!root.join("a/b/y.meta").exists());
    assert_eq!(fs::read(root.join("a/b/z.txt"))?, b"plain");

    // 4. Restore
    let mut cmd = Command::cargo_bin("metapack")?;
    cmd.arg("restore").arg("--root").arg(root);
    cmd.assert().success();
    assert_eq!(fs::read(root.join("a/x.meta"))?, b"guid: 11");
    assert_eq!(fs::read(root.join("a/b/y.meta"))?, b"guid: 22");

    Ok(())
}

#[test]
fn test_standalone_bins_read_root_from_env() -> Result<(), Box<dyn std::error::Error>> {
    let project = tempdir()?;
    let root = project.path();
    write(&root.join("Assets/tex.png.meta"), b"tex");

    Command::cargo_bin("compress-meta")?
        .env(metapack::cli::ROOT_ENV, root)
        .assert()
        .success();
    let mut zip = zip::ZipArchive::new(fs::File::open(root.join("MetaFilesCompressed.zip"))?)?;
    let mut data = String::new();
    zip.by_name("Assets/tex.png.meta")?.read_to_string(&mut data)?;
    assert_eq!(data, "tex");

    Command::cargo_bin("clean-meta")?
        .env(metapack::cli::ROOT_ENV, root)
        .assert()
        .success();
    assert!(!root.join("Assets/tex.png.meta").exists());
    assert!(root.join("MetaFilesCompressed.zip").exists());

    Ok(())
}

#[test]
fn test_json_report_on_stdout() -> Result<(), Box<dyn std::error::Error>> {
    let project = tempdir()?;
    write(&project.path().join("x.meta"), b"1");

    let output = Command::cargo_bin("metapack")?
        .args(["clean", "--json", "-q", "--root"])
        .arg(project.path())
        .output()?;
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(report["command"], "clean");
    assert_eq!(report["removed"], serde_json::json!(["x.meta"]));
    assert_eq!(report["failed"], serde_json::json!([]));

    Ok(())
}

#[test]
fn test_missing_root_exits_non_zero() -> Result<(), Box<dyn std::error::Error>> {
    let project = tempdir()?;
    let missing = project.path().join("does-not-exist");

    Command::cargo_bin("metapack")?
        .arg("compress")
        .arg("--root")
        .arg(&missing)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error (invalid input)"));

    Ok(())
}

#[test]
fn test_restore_without_archive_fails() -> Result<(), Box<dyn std::error::Error>> {
    let project = tempdir()?;

    Command::cargo_bin("metapack")?
        .arg("restore")
        .arg("--root")
        .arg(project.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("MetaFilesCompressed.zip"));

    Ok(())
}

#[cfg(unix)]
#[test]
fn test_keep_staging_leaves_partial_state() -> Result<(), Box<dyn std::error::Error>> {
    let project = tempdir()?;
    let root = project.path();
    write(&root.join("a/aa.meta"), b"ok");
    fs::create_dir_all(root.join("b"))?;
    std::os::unix::fs::symlink(root.join("nowhere"), root.join("b/zz.meta"))?;

    Command::cargo_bin("metapack")?
        .arg("compress")
        .arg("--keep-staging")
        .arg("--root")
        .arg(root)
        .assert()
        .failure()
        .stderr(predicate::str::contains("partial state error"));

    assert!(root.join(".meta-staging/a/aa.meta").exists());
    assert!(!root.join("MetaFilesCompressed.zip").exists());

    Ok(())
}

/// Makes `dir` read-only so files inside it cannot be removed. Returns false
/// when the process can still write there (running as root), in which case the
/// caller skips its checks.
#[cfg(unix)]
fn lock_dir(dir: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(dir, fs::Permissions::from_mode(0o555)).unwrap();
    let canary = dir.join("canary");
    if fs::write(&canary, b"").is_ok() {
        fs::remove_file(&canary).unwrap();
        unlock_dir(dir);
        return false;
    }
    true
}

#[cfg(unix)]
fn unlock_dir(dir: &Path) {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(dir, fs::Permissions::from_mode(0o755)).unwrap();
}

#[cfg(unix)]
#[test]
fn test_clean_failure_exits_non_zero() -> Result<(), Box<dyn std::error::Error>> {
    let project = tempdir()?;
    let root = project.path();
    write(&root.join("a/x.meta"), b"locked");
    write(&root.join("b/y.meta"), b"free");
    if !lock_dir(&root.join("a")) {
        eprintln!("skipping: running with permission to write read-only directories");
        return Ok(());
    }

    // default policy: stop at the first failure, nothing after it is touched
    Command::cargo_bin("metapack")?
        .args(["clean", "--root"])
        .arg(root)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error (filesystem access error)"));
    assert!(root.join("a/x.meta").exists());
    assert!(root.join("b/y.meta").exists());

    // keep going: later files are removed, exit status still reports the failure
    let output = Command::cargo_bin("metapack")?
        .args(["clean", "--keep-going", "--json", "--root"])
        .arg(root)
        .output()?;
    unlock_dir(&root.join("a"));

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("1 meta file(s) could not be removed: a/x.meta"), "{stderr}");
    let report: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(report["removed"], serde_json::json!(["b/y.meta"]));
    assert_eq!(report["failed"][0][0], "a/x.meta");
    assert!(root.join("a/x.meta").exists());
    assert!(!root.join("b/y.meta").exists());

    Ok(())
}

#[cfg(unix)]
#[test]
fn test_aborted_clean_lists_processed_files() -> Result<(), Box<dyn std::error::Error>> {
    let project = tempdir()?;
    let root = project.path();
    write(&root.join("a/x.meta"), b"free");
    write(&root.join("b/y.meta"), b"locked");
    if !lock_dir(&root.join("b")) {
        eprintln!("skipping: running with permission to write read-only directories");
        return Ok(());
    }

    Command::cargo_bin("metapack")?
        .args(["clean", "-q", "--root"])
        .arg(root)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Already processed:\n  a/x.meta"));
    unlock_dir(&root.join("b"));

    assert!(!root.join("a/x.meta").exists());
    assert!(root.join("b/y.meta").exists());

    Ok(())
}
