//! Integration tests for the Butler CLI.
//!
//! These tests exercise the binary end-to-end using `assert_cmd`.  The
//! root password comes from `BUTLER_PASSWORD` and site passwords are
//! piped on stdin, so no test needs a terminal.

use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;

const ROOT: &str = "correct horse battery";

/// Helper: get a Command pointing at the butler binary.
fn butler() -> Command {
    #[allow(deprecated)]
    Command::cargo_bin("butler").expect("binary should exist")
}

/// Helper: a home directory with a config tuned for quick tests.
fn home() -> TempDir {
    let tmp = TempDir::new().unwrap();
    tmp.child("home").create_dir_all().unwrap();
    tmp.child("home/config.toml")
        .write_str("kdf_iterations = 10000\nconnect_attempts = 1\nretry_backoff_ms = 10\n")
        .unwrap();
    tmp
}

/// Helper: a butler command bound to `tmp`'s home and a root password.
fn butler_in(tmp: &TempDir, password: &str) -> Command {
    let mut cmd = butler();
    cmd.env("BUTLER_HOME", tmp.path().join("home"))
        .env("BUTLER_PASSWORD", password)
        .env_remove("RUST_LOG");
    cmd
}

fn init(tmp: &TempDir) {
    butler_in(tmp, ROOT)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Root password initialized"));
}

fn add(tmp: &TempDir, site: &str, username: &str, password: &str) {
    butler_in(tmp, ROOT)
        .args(["add", site, "--username", username])
        .write_stdin(format!("{password}\n"))
        .assert()
        .success();
}

#[test]
fn help_flag_shows_usage() {
    butler()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Personal credential vault"))
        .stdout(predicate::str::contains("init"))
        .stdout(predicate::str::contains("add"))
        .stdout(predicate::str::contains("ls"))
        .stdout(predicate::str::contains("get"))
        .stdout(predicate::str::contains("pw"))
        .stdout(predicate::str::contains("rm"));
}

#[test]
fn version_flag_shows_version() {
    butler()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("butler"));
}

#[test]
fn no_args_shows_help() {
    butler()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn init_creates_home_files() {
    let tmp = home();
    init(&tmp);

    tmp.child("home/auth.bin").assert(predicate::path::exists());
    tmp.child("home/credentials.db")
        .assert(predicate::path::exists());
}

#[test]
fn init_writes_default_config_when_missing() {
    let tmp = TempDir::new().unwrap();
    butler()
        .env("BUTLER_HOME", tmp.path().join("fresh"))
        .env("BUTLER_PASSWORD", "short")
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("at least 8 characters"));

    // The config and schema are in place even though the password was refused.
    tmp.child("fresh/config.toml")
        .assert(predicate::str::contains("kdf_iterations"));
    tmp.child("fresh/auth.bin")
        .assert(predicate::path::missing());
}

#[test]
fn ls_before_init_fails() {
    let tmp = home();
    butler_in(&tmp, ROOT)
        .arg("ls")
        .assert()
        .failure()
        .stderr(predicate::str::contains("butler init"));
}

#[test]
fn full_credential_lifecycle() {
    let tmp = home();
    init(&tmp);
    add(&tmp, "times", "alice", "secret1");

    butler_in(&tmp, ROOT)
        .arg("ls")
        .assert()
        .success()
        .stdout(predicate::str::contains("times"));

    butler_in(&tmp, ROOT)
        .args(["get", "times"])
        .assert()
        .success()
        .stdout(predicate::str::contains("alice"));

    butler_in(&tmp, ROOT)
        .args(["pw", "times", "alice"])
        .assert()
        .success()
        .stdout(predicate::str::contains("secret1"));

    butler_in(&tmp, ROOT)
        .args(["rm", "times", "alice", "--force"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed credential"));

    butler_in(&tmp, ROOT)
        .args(["get", "times"])
        .assert()
        .success()
        .stdout(predicate::str::contains("alice").not());
}

#[test]
fn adding_same_username_twice_fails() {
    let tmp = home();
    init(&tmp);
    add(&tmp, "times", "alice", "secret1");

    butler_in(&tmp, ROOT)
        .args(["add", "times", "--username", "alice"])
        .write_stdin("other\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    butler_in(&tmp, ROOT)
        .args(["pw", "times", "alice"])
        .assert()
        .success()
        .stdout(predicate::str::contains("secret1"));
}

#[test]
fn second_account_on_same_site() {
    let tmp = home();
    init(&tmp);
    add(&tmp, "times", "alice", "pw-a");
    add(&tmp, "times", "bob", "pw-b");

    butler_in(&tmp, ROOT)
        .args(["get", "times"])
        .assert()
        .success()
        .stdout(predicate::str::contains("alice"))
        .stdout(predicate::str::contains("bob"));

    butler_in(&tmp, ROOT)
        .args(["pw", "times", "bob"])
        .assert()
        .success()
        .stdout(predicate::str::contains("pw-b"));
}

#[test]
fn editing_kdf_iterations_keeps_credentials_readable() {
    let tmp = home();
    init(&tmp);
    add(&tmp, "times", "alice", "secret1");

    tmp.child("home/config.toml")
        .write_str("kdf_iterations = 20000\nconnect_attempts = 1\nretry_backoff_ms = 10\n")
        .unwrap();

    butler_in(&tmp, ROOT)
        .args(["pw", "times", "alice"])
        .assert()
        .success()
        .stdout(predicate::str::contains("secret1"));

    add(&tmp, "times", "bob", "secret2");
    butler_in(&tmp, ROOT)
        .args(["get", "times"])
        .assert()
        .success()
        .stdout(predicate::str::contains("alice"))
        .stdout(predicate::str::contains("bob"));
}

#[test]
fn wrong_root_password_is_rejected() {
    let tmp = home();
    init(&tmp);
    add(&tmp, "times", "alice", "secret1");

    butler_in(&tmp, "not the password")
        .args(["pw", "times", "alice"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Authentication failed"))
        .stdout(predicate::str::contains("secret1").not());
}

#[test]
fn pw_for_unknown_username_fails() {
    let tmp = home();
    init(&tmp);
    add(&tmp, "times", "alice", "secret1");

    butler_in(&tmp, ROOT)
        .args(["pw", "times", "mallory"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No credential found"));
}

#[test]
fn rm_unknown_credential_warns() {
    let tmp = home();
    init(&tmp);

    butler_in(&tmp, ROOT)
        .args(["rm", "times", "alice", "--force"])
        .assert()
        .success()
        .stderr(predicate::str::contains("nothing removed"));
}

#[test]
fn reinit_with_force_replaces_root_password() {
    let tmp = home();
    init(&tmp);

    butler_in(&tmp, "a brand new root")
        .args(["init", "--force"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Root password replaced"));

    butler_in(&tmp, ROOT).arg("ls").assert().failure();
    butler_in(&tmp, "a brand new root").arg("ls").assert().success();
}

#[test]
fn home_flag_overrides_environment() {
    let tmp = home();
    butler()
        .env("BUTLER_HOME", tmp.path().join("elsewhere"))
        .env("BUTLER_PASSWORD", ROOT)
        .args(["--home", tmp.path().join("home").to_str().unwrap(), "init"])
        .assert()
        .success();

    tmp.child("home/auth.bin").assert(predicate::path::exists());
    tmp.child("elsewhere").assert(predicate::path::missing());
}
