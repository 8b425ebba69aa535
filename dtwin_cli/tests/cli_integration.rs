use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

fn bin() -> Command {
    Command::cargo_bin("dtwin_cli").unwrap()
}

#[test]
fn single_mode_toml_request_prints_chart_data() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("req.toml");
    fs::write(&path, "mode = \"single\"\nsim_s = 600.0\ndt = 1.0\n").unwrap();

    bin()
        .arg("--request")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("chartData"));
}

#[test]
fn suite_mode_json_request_prints_ten_scenarios() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("req.json");
    fs::write(&path, r#"{"mode": "suite"}"#).unwrap();

    let assert = bin().arg("--request").arg(&path).assert().success();
    let out = assert.get_output();
    let parsed: Vec<serde_json::Value> = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(parsed.len(), 10);
}

#[test]
fn missing_request_file_produces_error_json_and_nonzero_exit() {
    bin()
        .arg("--request")
        .arg("/nonexistent/path/request.toml")
        .assert()
        .failure()
        .stdout(predicate::str::contains("error"));
}

#[test]
fn malformed_request_body_produces_error_json() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("req.toml");
    fs::write(&path, "this is not valid toml {{{").unwrap();

    bin()
        .arg("--request")
        .arg(&path)
        .assert()
        .failure()
        .stdout(predicate::str::contains("error"));
}

#[test]
fn help_flag_prints_usage() {
    bin().arg("--help").assert().success().stdout(predicate::str::contains("Usage"));
}
