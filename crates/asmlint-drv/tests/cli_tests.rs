//! CLI behavior tests for the `asmlint` binary.

use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;

fn write_source(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("create temp source file");
    file.write_all(content.as_bytes()).expect("write source");
    file
}

#[test]
fn clean_file_reports_success() {
    let src = write_source(".CODE\n MOV EAX, 1\n END\n");
    Command::cargo_bin("asmlint")
        .unwrap()
        .arg(src.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("no errors"));
}

#[test]
fn clean_file_json_is_empty_array() {
    let src = write_source(".CODE\n MOV EAX, 1\n END\n");
    Command::cargo_bin("asmlint")
        .unwrap()
        .arg(src.path())
        .arg("--json")
        .assert()
        .success()
        .stdout("[]");
}

#[test]
fn diagnostics_exit_zero() {
    // diagnostics are the product, not a failure
    let src = write_source(".CODE\n MOV EAX, 1/0\n END\n");
    Command::cargo_bin("asmlint")
        .unwrap()
        .arg(src.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("error: division by zero"))
        .stdout(predicate::str::contains("-->"));
}

#[test]
fn json_output_is_valid_and_structured() {
    let src = write_source(".CODE\n MOV EAX, 1/0\n END\n");
    let output = Command::cargo_bin("asmlint")
        .unwrap()
        .arg(src.path())
        .arg("--json")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let value: serde_json::Value = serde_json::from_slice(&output).expect("valid JSON");
    let array = value.as_array().expect("a JSON array");
    assert_eq!(array.len(), 1);
    assert_eq!(array[0]["code"], "DIVISION_BY_ZERO_IN_EXPRESSION");
    assert_eq!(array[0]["level"], "error");
    assert_eq!(array[0]["primaryLabel"]["line"], 2);
}

#[test]
fn missing_file_reports_failed_to_open() {
    Command::cargo_bin("asmlint")
        .unwrap()
        .arg("definitely/not/here.asm")
        .assert()
        .success()
        .stdout(predicate::str::contains("failed to open"));
}

#[test]
fn reads_from_stdin() {
    Command::cargo_bin("asmlint")
        .unwrap()
        .arg("--stdin")
        .write_stdin(".CODE\n MOV EAX, 1\n END")
        .assert()
        .success()
        .stdout(predicate::str::contains("no errors"));
}

#[test]
fn stdin_with_json_reports_codes() {
    let output = Command::cargo_bin("asmlint")
        .unwrap()
        .arg("--stdin")
        .arg("--json")
        .write_stdin(".CODE\n MOV AL, 300\n END\n")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let value: serde_json::Value = serde_json::from_slice(&output).expect("valid JSON");
    assert_eq!(value[0]["code"], "IMMEDIATE_TOO_BIG");
}
