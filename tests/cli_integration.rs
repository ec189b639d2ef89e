//! Binary-level tests for the `cvw` CLI.
//!
//! These run the compiled binary with assert_cmd against real fixtures
//! built into temporary directories.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use assert_cmd::Command;
use assert_fs::prelude::*;
use predicates::prelude::*;
use zip::write::FileOptions;

const HEADER: &str = r#"{"DocVersion":"1.333"}"#;
const SCREEN: &str = r#"{"TopParent":{"Name":"Screen1","Rules":[],"Children":[]}}"#;
const PUBLISH_INFO: &str = r#"{}"#;

fn write_msapp(path: &Path) {
    let file = File::create(path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    let options = FileOptions::default().compression_method(zip::CompressionMethod::Stored);
    for (name, contents) in [
        ("Header.json", HEADER),
        ("Controls/1.json", SCREEN),
        ("Resources/PublishInfo.json", PUBLISH_INFO),
    ] {
        zip.start_file(name, options).unwrap();
        zip.write_all(contents.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
}

fn cvw() -> Command {
    let mut cmd = Command::cargo_bin("cvw").unwrap();
    // Keep user configuration out of the tests
    cmd.env("CANVASWORK_CONFIG", "/nonexistent/canvaswork-config.toml");
    cmd
}

#[test]
fn unpack_decomposes_an_app() {
    let temp = assert_fs::TempDir::new().unwrap();
    write_msapp(&temp.path().join("app.msapp"));

    cvw()
        .args(["--quiet", "unpack", "app.msapp", "out"])
        .args(["--cwd", temp.path().to_str().unwrap()])
        .assert()
        .success();

    temp.child("out/Code/Screen1/Screen1.js").assert(predicate::path::exists());
    temp.child("out/Code/AutoValues.json").assert(predicate::path::exists());
}

#[test]
fn output_defaults_to_source_stem() {
    let temp = assert_fs::TempDir::new().unwrap();
    write_msapp(&temp.path().join("app.msapp"));

    cvw()
        .args(["--quiet", "unpack", "app.msapp"])
        .args(["--cwd", temp.path().to_str().unwrap()])
        .assert()
        .success();

    temp.child("app/Code/Screen1/Screen1.json").assert(predicate::path::exists());
}

#[test]
fn missing_source_fails_with_message() {
    let temp = assert_fs::TempDir::new().unwrap();
    cvw()
        .args(["unpack", "absent.msapp", "out"])
        .args(["--cwd", temp.path().to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn config_file_supplies_clobber_default() {
    let temp = assert_fs::TempDir::new().unwrap();
    write_msapp(&temp.path().join("app.msapp"));
    temp.child("out/stale.txt").write_str("old").unwrap();
    temp.child("config.toml")
        .write_str("[unpack]\nclobber = true\n")
        .unwrap();

    // No --clobber flag; the config default applies
    let mut cmd = Command::cargo_bin("cvw").unwrap();
    cmd.env("CANVASWORK_CONFIG", temp.path().join("config.toml"))
        .args(["--quiet", "unpack", "app.msapp", "out"])
        .args(["--cwd", temp.path().to_str().unwrap()])
        .assert()
        .success();

    temp.child("out/stale.txt").assert(predicate::path::missing());
    temp.child("out/Code").assert(predicate::path::exists());
}

#[test]
fn broken_config_is_reported() {
    let temp = assert_fs::TempDir::new().unwrap();
    write_msapp(&temp.path().join("app.msapp"));
    temp.child("config.toml").write_str("broken [").unwrap();

    let mut cmd = Command::cargo_bin("cvw").unwrap();
    cmd.env("CANVASWORK_CONFIG", temp.path().join("config.toml"))
        .args(["unpack", "app.msapp", "out"])
        .args(["--cwd", temp.path().to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("configuration"));
}

#[test]
fn completion_emits_a_script() {
    cvw()
        .args(["completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("cvw"));
}

#[test]
fn help_lists_unpack() {
    cvw()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("unpack"));
}
