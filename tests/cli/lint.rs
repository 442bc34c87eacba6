//! Lint subcommand tests

#![cfg(unix)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

use super::fake_linter_config;

/// Reports `expected map` on line 2 of the linted file.
const REPORTING: &str = r#"cat > /dev/null
src="${2#-:}"
printf '[{"pos":"%s:2","msg":"expected map","code":"schema"}]\n' "$src""#;

const CLEAN: &str = "cat > /dev/null\necho '[]'";

#[test]
fn test_lint_clean_file() {
    let temp_dir = TempDir::new().unwrap();
    let config = fake_linter_config(temp_dir.path(), CLEAN);
    let test_file = temp_dir.path().join("app.yaml");
    fs::write(&test_file, "foo: 1\n").unwrap();

    cargo_bin_cmd!("ytt-lint-lsp")
        .args([
            "lint",
            "--config",
            config.to_str().unwrap(),
            test_file.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("No issues found"));
}

#[test]
fn test_lint_prints_resolved_positions() {
    let temp_dir = TempDir::new().unwrap();
    let config = fake_linter_config(temp_dir.path(), REPORTING);
    let test_file = temp_dir.path().join("app.yaml");
    fs::write(&test_file, "foo:\n  bar\n").unwrap();

    cargo_bin_cmd!("ytt-lint-lsp")
        .args([
            "lint",
            "--config",
            config.to_str().unwrap(),
            test_file.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("[schema]: expected map at"))
        .stdout(predicate::str::contains(format!(
            "{}:2:3",
            test_file.display()
        )))
        .stdout(predicate::str::contains("Found 1 issue(s)"));
}

#[test]
fn test_lint_check_mode_clean() {
    let temp_dir = TempDir::new().unwrap();
    let config = fake_linter_config(temp_dir.path(), CLEAN);

    cargo_bin_cmd!("ytt-lint-lsp")
        .args(["lint", "--check", "--config", config.to_str().unwrap()])
        .write_stdin("foo: 1\n")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_lint_check_mode_findings() {
    let temp_dir = TempDir::new().unwrap();
    let config = fake_linter_config(temp_dir.path(), REPORTING);

    cargo_bin_cmd!("ytt-lint-lsp")
        .args(["lint", "--check", "--config", config.to_str().unwrap()])
        .write_stdin("foo:\n  bar\n")
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("stdin.yaml:2:3"));
}

#[test]
fn test_lint_passes_root_and_language() {
    let temp_dir = TempDir::new().unwrap();
    let args_file = temp_dir.path().join("args");
    let config = fake_linter_config(
        temp_dir.path(),
        &format!(
            "echo \"$@\" > {}\ncat > /dev/null\necho '[]'",
            args_file.display()
        ),
    );

    cargo_bin_cmd!("ytt-lint-lsp")
        .args([
            "lint",
            "--config",
            config.to_str().unwrap(),
            "--root",
            "/lib",
            "--language",
            "ytt",
        ])
        .write_stdin("foo: 1\n")
        .assert()
        .success();

    let args = fs::read_to_string(&args_file).unwrap();
    assert_eq!(args.trim_end(), "-f -:stdin.yaml -o json --root /lib");
}

#[test]
fn test_lint_skips_other_languages() {
    let temp_dir = TempDir::new().unwrap();
    let config = fake_linter_config(temp_dir.path(), REPORTING);

    cargo_bin_cmd!("ytt-lint-lsp")
        .args([
            "lint",
            "--config",
            config.to_str().unwrap(),
            "--language",
            "json",
        ])
        .write_stdin("{}")
        .assert()
        .success()
        .stderr(predicate::str::contains("is not linted"));
}

#[test]
fn test_lint_location_less_finding_warns() {
    let temp_dir = TempDir::new().unwrap();
    let config = fake_linter_config(
        temp_dir.path(),
        r#"cat > /dev/null
src="${2#-:}"
printf '[{"pos":"%s","msg":"no line"}]\n' "$src""#,
    );

    cargo_bin_cmd!("ytt-lint-lsp")
        .args(["lint", "--config", config.to_str().unwrap()])
        .write_stdin("foo: 1\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("warning"))
        .stdout(predicate::str::contains("without line information"));
}

#[test]
fn test_lint_linter_failure() {
    let temp_dir = TempDir::new().unwrap();
    let config = fake_linter_config(temp_dir.path(), "cat > /dev/null\necho boom >&2\nexit 4");

    cargo_bin_cmd!("ytt-lint-lsp")
        .args(["lint", "--config", config.to_str().unwrap()])
        .write_stdin("foo: 1\n")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("linter exited with code 4: boom"));
}

#[test]
fn test_lint_discovers_config_next_to_file() {
    let temp_dir = TempDir::new().unwrap();
    fake_linter_config(temp_dir.path(), REPORTING);
    let test_file = temp_dir.path().join("app.yaml");
    fs::write(&test_file, "foo:\n  bar\n").unwrap();

    cargo_bin_cmd!("ytt-lint-lsp")
        .args(["lint", test_file.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("expected map"));
}
