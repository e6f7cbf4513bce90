//! CLI integration tests for Stevedore.
//!
//! These tests verify the argument surface and, on Unix, the full pipeline
//! against scripted stand-ins for the external compiler and doc engine.

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get the stevedore binary command.
fn stevedore() -> Command {
    Command::cargo_bin("stevedore").unwrap()
}

/// Create a repository skeleton with the given module sources.
fn scaffold_repo(dir: &Path, sources: &[&str]) {
    let src_dir = dir.join("src").join("Modules");
    fs::create_dir_all(&src_dir).unwrap();
    for name in sources {
        fs::write(src_dir.join(name), format!("class {} {{}}", name.trim_end_matches(".cs")))
            .unwrap();
    }
}

/// Write a raw 32-byte Ed25519 seed.
fn write_key(dir: &Path) -> PathBuf {
    let path = dir.join("signing.key");
    fs::write(&path, [5u8; 32]).unwrap();
    path
}

// ============================================================================
// Argument errors
// ============================================================================

#[test]
fn test_no_arguments_exits_64_with_usage() {
    stevedore()
        .assert()
        .code(64)
        .stdout(predicate::str::contains("--root"))
        .stdout(predicate::str::contains("Usage"));
}

#[test]
fn test_missing_key_exits_64() {
    stevedore()
        .args(["--root", "/tmp/somewhere"])
        .assert()
        .code(64)
        .stdout(predicate::str::contains("--key"));
}

#[test]
fn test_unrecognized_argument_exits_64() {
    stevedore()
        .args(["--root", "/tmp/x", "--key", "/tmp/y", "--frobnicate"])
        .assert()
        .code(64)
        .stdout(predicate::str::contains("--frobnicate"));
}

#[test]
fn test_help_exits_zero() {
    stevedore()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--root"))
        .stdout(predicate::str::contains("--key"));
}

#[test]
fn test_missing_key_file_is_a_runtime_error() {
    let tmp = TempDir::new().unwrap();
    scaffold_repo(tmp.path(), &[]);

    stevedore()
        .args(["--root"])
        .arg(tmp.path())
        .args(["--key"])
        .arg(tmp.path().join("nonexistent.key"))
        .args(["--compiler", "true", "--skip-docs"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("error:"));
}

// ============================================================================
// Full pipeline (scripted compiler + doc engine)
// ============================================================================

#[cfg(unix)]
mod pipeline {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    /// A compiler stand-in: `Beta.cs` needs `-r:Extra.dll` and says so in
    /// the service's missing-reference wording; `Gamma.cs` needs
    /// `-r:Custom.dll` but fails with an unclassifiable error; everything
    /// else compiles outright. Success prints the module JSON on stdout.
    const COMPILER_SCRIPT: &str = r##"#!/bin/sh
src="$1"; shift
name=$(basename "$src" .cs)
case "$name" in
  Beta)
    found=0
    for a in "$@"; do
      if [ "$a" = "-r:Extra.dll" ]; then found=1; fi
    done
    if [ "$found" -eq 0 ]; then
      echo "error CS0012: The type 'T' is defined in an assembly that is not referenced. You must add a reference to assembly 'Extra, Version=1.0.0.0, Culture=neutral'." >&2
      exit 1
    fi
    ;;
  Gamma)
    found=0
    for a in "$@"; do
      if [ "$a" = "-r:Custom.dll" ]; then found=1; fi
    done
    if [ "$found" -eq 0 ]; then
      echo "error CS1002: ; expected" >&2
      exit 1
    fi
    ;;
esac
lower=$(echo "$name" | tr 'A-Z' 'a-z')
printf '{"id":"%s-id","name":"%s","version":"1.0.0","author":"Tester","helpText":"Test module.","moduleType":"Action","readme":"# %s","payload":{}}' "$lower" "$name" "$name"
"##;

    /// Doc engine stand-in: swallows the markdown, emits fake PDF bytes.
    const ENGINE_SCRIPT: &str = r##"#!/bin/sh
cat > /dev/null
printf '%%PDF-1.4 fake'
"##;

    fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, body).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn build_cmd(tmp: &TempDir, skip_docs: bool) -> Command {
        let compiler = write_script(tmp.path(), "fake-compiler", COMPILER_SCRIPT);
        let engine = write_script(tmp.path(), "fake-engine", ENGINE_SCRIPT);
        let key = write_key(tmp.path());

        let mut cmd = stevedore();
        cmd.args(["--root"])
            .arg(tmp.path())
            .args(["--key"])
            .arg(&key)
            .args(["--compiler"])
            .arg(&compiler)
            .args(["--doc-engine"])
            .arg(&engine)
            .args(["--install-root"])
            .arg(tmp.path().join("installed"));
        if skip_docs {
            cmd.arg("--skip-docs");
        }
        cmd
    }

    #[test]
    fn test_builds_packages_docs_and_index() {
        let tmp = TempDir::new().unwrap();
        scaffold_repo(tmp.path(), &["Alpha.cs", "Beta.cs"]);

        build_cmd(&tmp, false).assert().success();

        let modules = tmp.path().join("Modules");
        assert!(modules.join("alpha-id/alpha-id.v1.0.0.json.zip").exists());
        assert!(modules.join("beta-id/beta-id.v1.0.0.json.zip").exists());
        assert!(modules.join("alpha-id/Readme.pdf").exists());
        assert!(modules.join("beta-id/Readme.pdf").exists());
        assert!(modules.join("modules.json.gz").exists());

        // Listing preserves lexical discovery order.
        let listing = fs::read_to_string(modules.join("Readme.md")).unwrap();
        assert!(listing.find("alpha-id").unwrap() < listing.find("beta-id").unwrap());

        // The missing reference was auto-added and persisted.
        let sidecar = tmp.path().join("src/Modules/references/Beta.cs.references");
        let refs = fs::read_to_string(sidecar).unwrap();
        assert!(refs.lines().any(|l| l == "Extra.dll"));

        // Local install of each exported package.
        assert!(tmp
            .path()
            .join("installed/alpha-id/alpha-id.v1.0.0.json.zip")
            .exists());
    }

    #[test]
    fn test_unnecessary_cached_reference_is_pruned() {
        let tmp = TempDir::new().unwrap();
        scaffold_repo(tmp.path(), &["Alpha.cs"]);

        let refs_dir = tmp.path().join("src/Modules/references");
        fs::create_dir_all(&refs_dir).unwrap();
        fs::write(refs_dir.join("Alpha.cs.references"), "System.dll\nUnused.dll\n").unwrap();

        build_cmd(&tmp, true).assert().success();

        let refs = fs::read_to_string(refs_dir.join("Alpha.cs.references")).unwrap();
        assert!(!refs.contains("Unused.dll"));
    }

    #[test]
    fn test_interactive_prompt_supplies_reference() {
        let tmp = TempDir::new().unwrap();
        scaffold_repo(tmp.path(), &["Gamma.cs"]);

        build_cmd(&tmp, true)
            .write_stdin("Custom\n")
            .assert()
            .success()
            .stderr(predicate::str::contains("CS1002"));

        let refs = fs::read_to_string(
            tmp.path().join("src/Modules/references/Gamma.cs.references"),
        )
        .unwrap();
        assert!(refs.lines().any(|l| l == "Custom.dll"));
    }

    #[test]
    fn test_prompt_without_input_aborts() {
        let tmp = TempDir::new().unwrap();
        scaffold_repo(tmp.path(), &["Gamma.cs"]);

        // stdin closed: the run cannot resolve Gamma and fails loudly.
        build_cmd(&tmp, true)
            .write_stdin("")
            .assert()
            .code(1)
            .stderr(predicate::str::contains("error:"));
    }

    #[test]
    fn test_skip_docs_leaves_packages_and_index() {
        let tmp = TempDir::new().unwrap();
        scaffold_repo(tmp.path(), &["Alpha.cs"]);

        build_cmd(&tmp, true).assert().success();

        let modules = tmp.path().join("Modules");
        assert!(modules.join("alpha-id/alpha-id.v1.0.0.json.zip").exists());
        assert!(modules.join("modules.json.gz").exists());
        assert!(!modules.join("alpha-id/Readme.pdf").exists());
    }
}
