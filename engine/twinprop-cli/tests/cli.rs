use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const DOC: &str = r#"{"a":{"x":1,"y":"s"},"b":{"m":45,"n":"foo"},"z":42,"list":[1,2],"$version":5}"#;

fn write_file(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn walk_prints_component_properties() {
    let tmp = TempDir::new().unwrap();
    let doc = write_file(&tmp, "doc.json", DOC);

    let output = cargo_bin_cmd!("twinprop")
        .args(["walk", "--component", "a", "--component", "b"])
        .arg(&doc)
        .output()
        .unwrap();
    assert!(output.status.success(), "walk failed: {:?}", output);
    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(
        lines,
        vec![
            "a\tx\t1",
            "a\ty\t\"s\"",
            "b\tm\t45",
            "b\tn\t\"foo\"",
            "-\tz\t42",
            "-\tlist\t<array>",
        ]
    );
}

#[test]
fn walk_reads_components_from_config() {
    let tmp = TempDir::new().unwrap();
    let doc = write_file(&tmp, "doc.json", DOC);
    let config = write_file(&tmp, "config.json", r#"{"components":["b"]}"#);

    cargo_bin_cmd!("twinprop")
        .args(["walk", "--message", "full", "--config"])
        .arg(&config)
        .arg(&doc)
        .assert()
        .success()
        .stdout(predicate::str::contains("-\ta\t<object>"))
        .stdout(predicate::str::contains("b\tn\t\"foo\""))
        .stdout(predicate::str::contains("$version").not());
}

#[test]
fn walk_rejects_bad_config() {
    let tmp = TempDir::new().unwrap();
    let doc = write_file(&tmp, "doc.json", DOC);
    let config = write_file(&tmp, "config.json", r#"{"components":"a"}"#);

    cargo_bin_cmd!("twinprop")
        .args(["walk", "--config"])
        .arg(&config)
        .arg(&doc)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("invalid config"));
}

#[test]
fn walk_reports_malformed_documents() {
    let tmp = TempDir::new().unwrap();
    let doc = write_file(&tmp, "doc.json", r#"{"a":1,}"#);

    cargo_bin_cmd!("twinprop")
        .arg("walk")
        .arg(&doc)
        .assert()
        .failure()
        .stderr(predicate::str::contains("malformed document"));
}

#[test]
fn version_prints_counter() {
    let tmp = TempDir::new().unwrap();
    let doc = write_file(&tmp, "doc.json", DOC);

    cargo_bin_cmd!("twinprop")
        .arg("version")
        .arg(&doc)
        .assert()
        .success()
        .stdout("5\n");
}

#[test]
fn version_missing_fails() {
    let tmp = TempDir::new().unwrap();
    let doc = write_file(&tmp, "doc.json", r#"{"a":{"$version":5}}"#);

    cargo_bin_cmd!("twinprop")
        .arg("version")
        .arg(&doc)
        .assert()
        .failure()
        .stderr(predicate::str::contains("property not found: $version"));
}

#[test]
fn ack_prints_envelope() {
    cargo_bin_cmd!("twinprop")
        .args([
            "ack",
            "--name",
            "property",
            "--code",
            "200",
            "--version",
            "1",
            "--description",
            "success",
            "--value",
            "\"val\"",
        ])
        .assert()
        .success()
        .stdout("{\"property\":{\"ac\":200,\"av\":1,\"ad\":\"success\",\"value\":\"val\"}}\n");
}

#[test]
fn ack_accepts_negative_integers() {
    cargo_bin_cmd!("twinprop")
        .args([
            "ack", "--name", "t", "--code", "400", "--version", "2", "--value", "-7",
        ])
        .assert()
        .success()
        .stdout("{\"t\":{\"ac\":400,\"av\":2,\"value\":-7}}\n");
}

#[test]
fn ack_rejects_structured_values() {
    cargo_bin_cmd!("twinprop")
        .args([
            "ack", "--name", "t", "--code", "200", "--version", "1", "--value", "[1]",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("JSON string, integer"));
}

#[test]
fn component_prints_fragment() {
    cargo_bin_cmd!("twinprop")
        .args([
            "component",
            "--name",
            "component",
            "--property",
            "property",
            "--value",
            "value",
        ])
        .assert()
        .success()
        .stdout("{\"component\":{\"__t\":\"c\",\"property\":\"value\"}}\n");
}

#[test]
fn component_rejects_empty_name() {
    cargo_bin_cmd!("twinprop")
        .args(["component", "--name", "", "--property", "p", "--value", "v"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid argument"));
}
