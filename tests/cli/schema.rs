//! Schema pull and import subcommand tests

#![cfg(unix)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

use super::fake_linter_config;

#[test]
fn test_pull_streams_output() {
    let temp_dir = TempDir::new().unwrap();
    let config = fake_linter_config(temp_dir.path(), "echo \"$@\"");

    cargo_bin_cmd!("ytt-lint-lsp")
        .args([
            "pull",
            "--config",
            config.to_str().unwrap(),
            "--kubeconfig",
            "/kube/config",
            "--context",
            "prod",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "--pull-from-k8s --kubeconfig /kube/config --context prod",
        ))
        .stdout(predicate::str::contains("Exit code: 0"));
}

#[test]
fn test_pull_defaults_to_kubeconfig_env() {
    let temp_dir = TempDir::new().unwrap();
    let config = fake_linter_config(temp_dir.path(), "echo \"$3\"");

    cargo_bin_cmd!("ytt-lint-lsp")
        .env("KUBECONFIG", "/env/kubeconfig")
        .args([
            "pull",
            "--config",
            config.to_str().unwrap(),
            "--context",
            "dev",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("/env/kubeconfig"));
}

#[test]
fn test_import_sets_schema_path() {
    let temp_dir = TempDir::new().unwrap();
    let config = fake_linter_config(
        temp_dir.path(),
        "echo \"$@\"\necho \"schema=$YTT_LINT_SCHEMA_PATH\"",
    );
    let file = temp_dir.path().join("crds.yaml");
    std::fs::write(&file, "kind: CustomResourceDefinition\n").unwrap();
    let canonical = std::fs::canonicalize(&file).unwrap();

    cargo_bin_cmd!("ytt-lint-lsp")
        .args([
            "import",
            "--config",
            config.to_str().unwrap(),
            file.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!(
            "--autoimport -f {} --root {}",
            canonical.display(),
            canonical.parent().unwrap().display()
        )))
        .stdout(predicate::str::contains(format!(
            "schema={}",
            temp_dir.path().join("schemas").display()
        )));
}

#[test]
fn test_import_propagates_exit_code() {
    let temp_dir = TempDir::new().unwrap();
    let config = fake_linter_config(temp_dir.path(), "echo failed >&2\nexit 5");

    cargo_bin_cmd!("ytt-lint-lsp")
        .args([
            "import",
            "--config",
            config.to_str().unwrap(),
            "crds.yaml",
        ])
        .assert()
        .code(5)
        .stdout(predicate::str::contains("failed"))
        .stdout(predicate::str::contains("Exit code: 5"));
}
