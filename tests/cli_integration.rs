//! Integration tests for the `softnav` binary.
//!
//! These tests run the compiled binary and verify:
//! - Global flags (`--version`, `--help`)
//! - `check` against temporary config files
//! - `completion` script generation
//! - `trace` against a local HTTP server

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;
use wiremock::matchers::path;
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Get a command for running softnav with no ambient configuration.
fn softnav() -> Command {
    let mut cmd = Command::cargo_bin("softnav").unwrap();
    cmd.env_remove("SOFTNAV_CONFIG")
        .env_remove("RUST_LOG")
        .env("XDG_CONFIG_HOME", "/nonexistent-softnav-test")
        .env("HOME", "/nonexistent-softnav-test");
    cmd
}

fn write_config(contents: &str) -> (TempDir, std::path::PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, contents).unwrap();
    (dir, path)
}

fn page(name: &str) -> String {
    format!(
        "<html><head><title>{0}</title></head>\
         <body><main data-softnav-wrapper>{0}</main></body></html>",
        name
    )
}

// =============================================================================
// Global flags
// =============================================================================

#[test]
fn version_flag_works() {
    softnav()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("softnav"));
}

#[test]
fn help_lists_commands() {
    softnav()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("trace"))
        .stdout(predicate::str::contains("check"))
        .stdout(predicate::str::contains("completion"));
}

#[test]
fn unknown_command_fails() {
    softnav().arg("frobnicate").assert().failure();
}

// =============================================================================
// check
// =============================================================================

mod check {
    use super::*;

    #[test]
    fn defaults_without_any_file() {
        softnav()
            .arg("check")
            .assert()
            .success()
            .stdout(predicate::str::contains("# source: defaults"))
            .stdout(predicate::str::contains("max_pages = 5"));
    }

    #[test]
    fn explicit_file_is_reported() {
        let (_dir, path) = write_config("max_pages = 9\nsticky_scroll = true\n");
        softnav()
            .args(["check", "--config"])
            .arg(&path)
            .assert()
            .success()
            .stdout(predicate::str::contains("max_pages = 9"))
            .stdout(predicate::str::contains("sticky_scroll = true"))
            .stdout(predicate::str::contains(path.display().to_string()));
    }

    #[test]
    fn env_var_locates_file() {
        let (_dir, path) = write_config("timeout = 2500\n");
        softnav()
            .env("SOFTNAV_CONFIG", &path)
            .arg("check")
            .assert()
            .success()
            .stdout(predicate::str::contains("timeout = 2500"));
    }

    #[test]
    fn invalid_value_fails() {
        let (_dir, path) = write_config("max_pages = 0\n");
        softnav()
            .args(["check", "--config"])
            .arg(&path)
            .assert()
            .failure()
            .stderr(predicate::str::contains("max_pages"));
    }

    #[test]
    fn unknown_key_fails() {
        let (_dir, path) = write_config("max_page = 3\n");
        softnav()
            .args(["check", "--config"])
            .arg(&path)
            .assert()
            .failure()
            .stderr(predicate::str::contains("Failed to load configuration"));
    }

    #[test]
    fn bad_glob_fails() {
        let (_dir, path) = write_config("prevent_urls = [\"/admin/[\"]\n");
        softnav()
            .args(["check", "--config"])
            .arg(&path)
            .assert()
            .failure()
            .stderr(predicate::str::contains("prevent_urls"));
    }

    #[test]
    fn quiet_prints_nothing_on_success() {
        softnav()
            .args(["check", "--quiet"])
            .assert()
            .success()
            .stdout(predicate::str::is_empty());
    }
}

// =============================================================================
// completion
// =============================================================================

mod completion {
    use super::*;

    #[test]
    fn bash() {
        softnav()
            .args(["completion", "bash"])
            .assert()
            .success()
            .stdout(predicate::str::contains("_softnav"));
    }

    #[test]
    fn zsh() {
        softnav()
            .args(["completion", "zsh"])
            .assert()
            .success()
            .stdout(predicate::str::contains("#compdef softnav"));
    }

    #[test]
    fn unknown_shell_fails() {
        softnav().args(["completion", "tcsh"]).assert().failure();
    }
}

// =============================================================================
// trace
// =============================================================================

mod trace {
    use super::*;

    async fn site() -> MockServer {
        let server = MockServer::start().await;
        for (at, name) in [("/", "Home"), ("/a", "A"), ("/b", "B")] {
            Mock::given(path(at))
                .respond_with(ResponseTemplate::new(200).set_body_string(page(name)))
                .mount(&server)
                .await;
        }
        server
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn walks_site_and_prints_history() {
        let server = site().await;

        softnav()
            .args(["trace", &server.uri(), "/a", "/b"])
            .assert()
            .success()
            .stdout(predicate::str::contains("READY"))
            .stdout(predicate::str::contains("NAVIGATION_END"))
            .stdout(predicate::str::contains("history:"))
            .stdout(predicate::str::contains(format!("*   2  {}/b", server.uri())));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn back_moves_pointer() {
        let server = site().await;

        softnav()
            .args(["trace", &server.uri(), "/a", "/b", "--back", "1", "--quiet"])
            .assert()
            .success()
            .stdout(predicate::str::contains(format!("*   1  {}/a", server.uri())))
            .stdout(predicate::str::contains("READY").not());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn failed_hop_is_reported() {
        let server = site().await;

        softnav()
            .args(["trace", &server.uri(), "/missing", "/a"])
            .assert()
            .success()
            .stdout(predicate::str::contains("REQUEST_ERROR"))
            .stdout(predicate::str::contains("/missing: error"));
    }

    #[test]
    fn invalid_origin_fails() {
        softnav()
            .args(["trace", "not a url", "/a"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid origin"));
    }
}
